pub mod auth;
pub mod listings;
pub mod middleware;
pub mod state;

pub use middleware::CurrentUser;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let require_auth = axum_middleware::from_fn_with_state(state.clone(), middleware::auth_middleware);

    let mut router: Router<AppState> = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Authentication endpoints
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me).route_layer(require_auth.clone()))
        // Listings: reads are public, writes need a session
        .route(
            "/listings",
            get(listings::list).merge(post(listings::create).route_layer(require_auth.clone())),
        )
        .route(
            "/listings/:id",
            get(listings::get).merge(delete(listings::remove).route_layer(require_auth)),
        )
        .route("/categories", get(listings::categories));

    // Uploaded images, served from wherever the image store keeps them
    if let Some((prefix, root)) = state.images.local_mount() {
        router = router.nest_service(prefix, ServeDir::new(root));
    }

    router
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Campus Marketplace API" }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
