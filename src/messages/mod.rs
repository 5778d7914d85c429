mod handlers;
pub mod log;

use std::str::FromStr;

use axum::{Router, routing::{get, put}};
use serde::{Serialize, Serializer, ser};
use time::{OffsetDateTime, macros::format_description};
use uuid::Uuid;

use crate::{AppError, AppState, store};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list).post(handlers::send))
        .route("/{id}", put(handlers::edit).delete(handlers::delete))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    #[serde(rename = "message")]
    Broadcast,
    #[serde(rename = "private_message")]
    Private,
    #[serde(rename = "status")]
    Status,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Broadcast => "message",
            Self::Private => "private_message",
            Self::Status => "status",
        }
    }
}

impl FromStr for MessageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" | "broadcast" => Ok(Self::Broadcast),
            "private_message" | "private" => Ok(Self::Private),
            "status" => Ok(Self::Status),
            other => Err(AppError::invalid(format!("unknown message type {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(rename = "time", serialize_with = "clock_time")]
    pub sent_at: OffsetDateTime,
}

fn clock_time<S: Serializer>(at: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted = at
        .format(format_description!("[hour]:[minute]:[second]"))
        .map_err(<S::Error as ser::Error>::custom)?;
    serializer.serialize_str(&formatted)
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MessageRow {
    id: String,
    sender: String,
    recipient: String,
    text: String,
    kind: String,
    sent_at: i64,
}

impl TryFrom<MessageRow> for Message {
    type Error = AppError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<MessageKind>()
            .map_err(|_| {
                anyhow::anyhow!("stored message {} has unknown kind {:?}", row.id, row.kind)
            })?;

        Ok(Self {
            id: Uuid::parse_str(&row.id)?,
            from: row.sender,
            to: row.recipient,
            text: row.text,
            kind,
            sent_at: store::from_unix_millis(row.sent_at)?,
        })
    }
}

/// Turns the raw `limit` query value into a row count.
///
/// Zero, negative and non-numeric values all mean "no limit".
pub fn parse_limit(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|limit| *limit > 0)
        .map(|limit| limit.min(u32::MAX as i64) as u32)
}
