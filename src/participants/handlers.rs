use axum::{Json, debug_handler, extract::State, http::StatusCode, response::IntoResponse};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    AppResult, AppState,
    config::RoomSettings,
    extract::{Body, User},
    store::Store,
    validate::ParticipantBody,
};

use super::registry;

#[debug_handler(state = AppState)]
pub(crate) async fn join(
    State(store): State<Store>,
    State(room): State<RoomSettings>,
    Body(body): Body<ParticipantBody>,
) -> AppResult<impl IntoResponse> {
    let name = body.validate(&room)?;
    let participant =
        registry::join(&store, &name, &room.broadcast_target, OffsetDateTime::now_utc()).await?;

    info!(participant = %participant.name, "joined the room");
    Ok((StatusCode::CREATED, Json(participant)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list(State(store): State<Store>) -> AppResult<impl IntoResponse> {
    Ok(Json(registry::list(&store).await?))
}

#[debug_handler(state = AppState)]
pub async fn heartbeat(State(store): State<Store>, User(name): User) -> AppResult<StatusCode> {
    registry::heartbeat(&store, &name, OffsetDateTime::now_utc()).await?;
    debug!(participant = %name, "heartbeat");
    Ok(StatusCode::OK)
}
