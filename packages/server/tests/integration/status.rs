use crate::common::{TestApp, routes};

#[tokio::test]
async fn status_reports_service_version() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::STATUS).await;

    assert_eq!(res.status, 200);
    assert_eq!(
        res.body["version"].as_str().unwrap(),
        env!("CARGO_PKG_VERSION")
    );
    assert!(res.body["build"].as_str().is_some());
}

#[tokio::test]
async fn openapi_document_lists_upload_route() {
    let app = TestApp::spawn().await;

    let res = app.get("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/v1/{name}/{version}"]["post"].is_object());
    assert!(res.body["paths"]["/status"]["get"].is_object());
}
