use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use registry_common::storage::filesystem::FilesystemBlobStore;
use tracing::{Level, info};

use registry_server::config::AppConfig;
use registry_server::database::init_db;
use registry_server::ingest::IngestResolver;
use registry_server::metadata::DatabaseMetadataStore;
use registry_server::seed;
use registry_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    if let Some((username, password)) = config.bootstrap_user() {
        seed::ensure_user(&db, username, password)
            .await
            .context("Failed to provision bootstrap user")?;
    }

    let blobs = FilesystemBlobStore::new(
        config.storage.root.clone(),
        config.storage.max_image_size,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to open image storage at {}",
            config.storage.root.display()
        )
    })?
    .with_lease_ttl(Duration::from_secs(config.storage.lease_ttl_secs));
    info!("Storing images under {}", config.storage.root.display());

    let resolver = IngestResolver::new(
        Arc::new(DatabaseMetadataStore::new(db.clone())),
        Arc::new(blobs),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: Arc::new(config),
        resolver,
    };

    let app = registry_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Registry listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
