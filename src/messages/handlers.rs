use axum::{
    Json, debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    AppResult, AppState,
    config::RoomSettings,
    extract::{Body, IdPath, User},
    store::Store,
    validate::MessageBody,
};

use super::{log, parse_limit};

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    limit: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn send(
    State(store): State<Store>,
    User(from): User,
    Body(body): Body<MessageBody>,
) -> AppResult<impl IntoResponse> {
    let draft = body.validate()?;
    let message = log::send(&store, &from, draft, OffsetDateTime::now_utc()).await?;

    debug!(id = %message.id, from = %message.from, to = %message.to, "message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list(
    State(store): State<Store>,
    State(room): State<RoomSettings>,
    User(viewer): User,
    Query(ListQuery { limit }): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = parse_limit(limit.as_deref());
    let messages = log::list_visible(&store, &viewer, &room.broadcast_target, limit).await?;
    Ok(Json(messages))
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit(
    State(store): State<Store>,
    User(requester): User,
    IdPath(id): IdPath<Uuid>,
    Body(body): Body<MessageBody>,
) -> AppResult<impl IntoResponse> {
    let draft = body.validate()?;
    let message = log::edit(&store, id, &requester, draft, OffsetDateTime::now_utc()).await?;

    info!(%id, author = %requester, "message edited");
    Ok(Json(message))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    State(store): State<Store>,
    User(requester): User,
    IdPath(id): IdPath<Uuid>,
) -> AppResult<StatusCode> {
    log::delete(&store, id, &requester).await?;

    info!(%id, author = %requester, "message deleted");
    Ok(StatusCode::OK)
}
