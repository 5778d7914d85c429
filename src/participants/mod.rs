mod handlers;
pub mod registry;

use axum::{Router, routing::get};
use serde::Serialize;

use crate::AppState;

pub use handlers::heartbeat;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list).post(handlers::join))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Participant {
    pub name: String,
    /// Unix milliseconds of the last join or heartbeat.
    #[serde(rename = "lastStatus")]
    pub last_seen_at: i64,
}
