use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace::{
    api::{create_router, AppState},
    config::Config,
    db,
    error::AppError,
    storage::LocalImageStore,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,marketplace=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting marketplace server v{}...", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded");

    let pool = db::connect(&config).await?;
    tracing::info!("Database connected: {}", config.database_url);

    db::migrate(&pool).await?;
    tracing::info!("Database migrations completed");

    let images = LocalImageStore::new(&config.upload_dir, config.upload_url_prefix.clone())?;
    tracing::info!(
        "Uploads stored in {} and served at {}",
        images.root().display(),
        config.upload_url_prefix
    );

    let state = AppState {
        db: pool,
        images: Arc::new(images),
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("  POST   /auth/signup    - Create account");
    tracing::info!("  POST   /auth/login     - Log in");
    tracing::info!("  GET    /auth/me        - Current user (requires auth)");
    tracing::info!("  GET    /listings       - All listings, newest first");
    tracing::info!("  GET    /listings/:id   - One listing");
    tracing::info!("  POST   /listings       - Create listing (requires auth)");
    tracing::info!("  DELETE /listings/:id   - Delete own listing (requires auth)");
    tracing::info!("  GET    /categories     - Listing categories");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
