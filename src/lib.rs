pub mod appresult;
pub mod config;
pub mod extract;
pub mod messages;
pub mod participants;
pub mod reaper;
pub mod res;
pub mod store;
pub mod validate;

use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};
use config::RoomSettings;
use store::Store;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Store,
    pub room: RoomSettings,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", post(participants::heartbeat))
        .nest("/participants", participants::router())
        .nest("/messages", messages::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "ok"
}
