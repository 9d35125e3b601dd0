use registry_common::storage::ContentHash;

use crate::common::{BASE_URL, FilePart, MAX_IMAGE_SIZE, REALM, TestApp, routes};

const USER: (&str, &str) = ("u1", "password123");

async fn app_with_user() -> TestApp {
    let app = TestApp::spawn().await;
    app.create_user(USER.0, USER.1).await;
    app
}

mod upload {
    use std::sync::Arc;

    use tokio::task::JoinSet;

    use super::*;

    #[tokio::test]
    async fn creates_format_and_stores_file() {
        let app = app_with_user().await;
        let data = b"QFI\xfb image content".to_vec();

        let res = app
            .upload(
                &routes::image("debian", "9.0"),
                Some(FilePart::image("test.qcow2", &data)),
                Some(USER),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(
            res.location.as_deref(),
            Some(format!("{BASE_URL}/v1/u1/debian/9.0/qcow2").as_str())
        );
        assert_eq!(res.body["uri"], "/v1/u1/debian/9.0/qcow2");
        assert_eq!(res.body["format_type"], "qcow2");

        let stored = std::fs::read(app.blob_path("u1", "debian", "9.0")).unwrap();
        assert_eq!(stored, data);
        assert_eq!(
            res.body["content_hash"].as_str().unwrap(),
            ContentHash::compute(&stored).to_hex()
        );
    }

    #[tokio::test]
    async fn duplicate_upload_is_a_conflict() {
        let app = app_with_user().await;
        let path = routes::image("debian", "9.0");

        let first = app
            .upload(&path, Some(FilePart::image("a.qcow2", b"first")), Some(USER))
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = app
            .upload(&path, Some(FilePart::image("b.qcow2", b"second")), Some(USER))
            .await;

        assert_eq!(second.status, 409);
        assert_eq!(second.code(), "IMAGE_FORMAT_ALREADY_EXISTS");
        assert_eq!(second.location, first.location);

        let stored = std::fs::read(app.blob_path("u1", "debian", "9.0")).unwrap();
        assert_eq!(stored, b"first");
    }

    #[tokio::test]
    async fn duplicate_is_rejected_before_the_body_is_stored() {
        let app = app_with_user().await;
        let path = routes::image("debian", "9.0");
        let first = app
            .upload(&path, Some(FilePart::image("a.qcow2", b"first")), Some(USER))
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        // Over the size limit: only a check made before spooling can answer 409.
        let oversized = vec![0u8; MAX_IMAGE_SIZE as usize + 1];
        let second = app
            .upload(&path, Some(FilePart::image("b.qcow2", &oversized)), Some(USER))
            .await;

        assert_eq!(second.status, 409, "{}", second.text);
        assert_eq!(second.code(), "IMAGE_FORMAT_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn orphaned_file_does_not_block_first_upload() {
        let app = app_with_user().await;
        let blob = app.blob_path("u1", "debian", "9.0");
        std::fs::create_dir_all(blob.parent().unwrap()).unwrap();
        std::fs::write(&blob, b"left over").unwrap();

        let res = app
            .upload(
                &routes::image("debian", "9.0"),
                Some(FilePart::image("debian.qcow2", b"fresh")),
                Some(USER),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(std::fs::read(&blob).unwrap(), b"fresh");
        assert_eq!(app.hierarchy_counts().await, (1, 1, 1));
    }

    #[tokio::test]
    async fn versions_share_one_image() {
        let app = app_with_user().await;

        for version in ["9.0", "10.0"] {
            let res = app
                .upload(
                    &routes::image("debian", version),
                    Some(FilePart::image("debian.qcow2", version.as_bytes())),
                    Some(USER),
                )
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        assert_eq!(app.hierarchy_counts().await, (1, 2, 2));
    }

    #[tokio::test]
    async fn concurrent_duplicates_have_one_winner() {
        let app = Arc::new(app_with_user().await);

        let mut uploads = JoinSet::new();
        for i in 0..5u8 {
            let app = app.clone();
            uploads.spawn(async move {
                app.upload(
                    &routes::image("fedora", "30"),
                    Some(FilePart::image("fedora.qcow2", &[i; 1024])),
                    Some(USER),
                )
                .await
                .status
            });
        }
        let statuses = uploads.join_all().await;

        assert_eq!(statuses.iter().filter(|&&s| s == 201).count(), 1);
        assert_eq!(statuses.iter().filter(|&&s| s == 409).count(), 4);
        assert_eq!(app.hierarchy_counts().await, (1, 1, 1));
    }
}

mod rejections {
    use super::*;

    #[tokio::test]
    async fn unsupported_extension_stores_nothing() {
        let app = app_with_user().await;

        let res = app
            .upload(
                &routes::image("debian", "9.0"),
                Some(FilePart::image("debian.iso", b"iso")),
                Some(USER),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INVALID_FILE_FORMAT");
        assert_eq!(
            res.body["details"]["allowed_file_formats"],
            serde_json::json!(["qcow2"])
        );
        assert!(!app.storage.path().join("images/u1").exists());
        assert_eq!(app.hierarchy_counts().await, (0, 0, 0));
    }

    #[tokio::test]
    async fn missing_file_part() {
        let app = app_with_user().await;

        let res = app
            .upload(&routes::image("debian", "9.0"), None, Some(USER))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "MISSING_PARAMETER");
        assert_eq!(res.body["details"]["parameter"], "file");
    }

    #[tokio::test]
    async fn wrong_file_content_type() {
        let app = app_with_user().await;
        let file = FilePart {
            filename: "debian.qcow2",
            bytes: b"data".to_vec(),
            mime: "text/plain",
        };

        let res = app
            .upload(&routes::image("debian", "9.0"), Some(file), Some(USER))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INVALID_FILE_CONTENT_TYPE");
        assert_eq!(
            res.body["details"]["allowed_content_types"],
            serde_json::json!(["application/octet-stream"])
        );
    }

    #[tokio::test]
    async fn non_multipart_request() {
        let app = app_with_user().await;

        let res = app
            .post_json(
                &routes::image("debian", "9.0"),
                &serde_json::json!({"file": "debian.qcow2"}),
                USER,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INVALID_REQUEST_CONTENT_TYPE");
    }

    #[tokio::test]
    async fn hidden_version_segment_is_rejected() {
        let app = app_with_user().await;

        let res = app
            .upload(
                &routes::image("debian", ".hidden"),
                Some(FilePart::image("debian.qcow2", b"data")),
                Some(USER),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert_eq!(app.hierarchy_counts().await, (0, 0, 0));
    }

    #[tokio::test]
    async fn oversized_image() {
        let app = app_with_user().await;
        let data = vec![0u8; MAX_IMAGE_SIZE as usize + 1];

        let res = app
            .upload(
                &routes::image("debian", "9.0"),
                Some(FilePart::image("debian.qcow2", &data)),
                Some(USER),
            )
            .await;

        assert_eq!(res.status, 413);
        assert_eq!(res.code(), "IMAGE_TOO_LARGE");
        assert!(!app.blob_path("u1", "debian", "9.0").exists());
    }
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn missing_credentials() {
        let app = app_with_user().await;

        let res = app
            .upload(
                &routes::image("debian", "9.0"),
                Some(FilePart::image("debian.qcow2", b"data")),
                None,
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "CREDENTIALS_MISSING");
        assert_eq!(
            res.www_authenticate.as_deref(),
            Some(format!("Basic realm=\"{REALM}\"").as_str())
        );
    }

    #[tokio::test]
    async fn wrong_password() {
        let app = app_with_user().await;

        let res = app
            .upload(
                &routes::image("debian", "9.0"),
                Some(FilePart::image("debian.qcow2", b"data")),
                Some((USER.0, "wrong-password")),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_CREDENTIALS");
        assert!(res.www_authenticate.is_some());
    }

    #[tokio::test]
    async fn unknown_user() {
        let app = app_with_user().await;

        let res = app
            .upload(
                &routes::image("debian", "9.0"),
                Some(FilePart::image("debian.qcow2", b"data")),
                Some(("nobody", "password123")),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn uploads_land_in_the_callers_group() {
        let app = app_with_user().await;
        app.create_user("u2", "secret456").await;

        let res = app
            .upload(
                &routes::image("debian", "9.0"),
                Some(FilePart::image("debian.qcow2", b"data")),
                Some(("u2", "secret456")),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["uri"], "/v1/u2/debian/9.0/qcow2");
        assert!(app.blob_path("u2", "debian", "9.0").exists());
    }
}
