use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod handlers;
pub mod json;
pub mod models;
pub mod serializer;

pub use handlers::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
