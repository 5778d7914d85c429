//! The room's message log: appends, author-only edits and deletes, and the
//! per-viewer read path.

use sqlx::SqliteExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    AppError, AppResult,
    participants::registry,
    store::{Store, unix_millis},
    validate::MessageDraft,
};

use super::{Message, MessageKind, MessageRow};

pub const JOINED_TEXT: &str = "entered the room";
pub const LEFT_TEXT: &str = "left the room";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Joined,
    Left,
}

impl Presence {
    fn text(self) -> &'static str {
        match self {
            Self::Joined => JOINED_TEXT,
            Self::Left => LEFT_TEXT,
        }
    }
}

async fn insert(executor: impl SqliteExecutor<'_>, message: &Message) -> AppResult<()> {
    sqlx::query("INSERT INTO messages (id,sender,recipient,text,kind,sent_at) VALUES (?,?,?,?,?,?)")
        .bind(message.id.to_string())
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(unix_millis(message.sent_at))
        .execute(executor)
        .await?;
    Ok(())
}

/// Records a synthetic join/leave entry addressed to the whole room.
pub async fn append_status(
    executor: impl SqliteExecutor<'_>,
    name: &str,
    broadcast_target: &str,
    presence: Presence,
    now: OffsetDateTime,
) -> AppResult<Message> {
    let message = Message {
        id: Uuid::now_v7(),
        from: name.to_owned(),
        to: broadcast_target.to_owned(),
        text: presence.text().to_owned(),
        kind: MessageKind::Status,
        sent_at: now,
    };
    insert(executor, &message).await?;
    Ok(message)
}

pub async fn send(
    store: &Store,
    from: &str,
    MessageDraft { to, text, kind }: MessageDraft,
    now: OffsetDateTime,
) -> AppResult<Message> {
    if !registry::is_active(store, from).await? {
        return Err(AppError::Unauthorized(from.to_owned()));
    }

    let message = Message {
        id: Uuid::now_v7(),
        from: from.to_owned(),
        to,
        text,
        kind,
        sent_at: now,
    };
    insert(store.pool(), &message).await?;
    Ok(message)
}

async fn author_of(store: &Store, id: Uuid) -> AppResult<String> {
    let row: Option<(String,)> = sqlx::query_as("SELECT sender FROM messages WHERE id=?")
        .bind(id.to_string())
        .fetch_optional(store.pool())
        .await?;

    row.map(|(sender,)| sender)
        .ok_or_else(|| AppError::NotFound("message".to_owned()))
}

async fn ensure_author(store: &Store, id: Uuid, requester: &str) -> AppResult<()> {
    if author_of(store, id).await? != requester {
        return Err(AppError::Forbidden(requester.to_owned()));
    }
    Ok(())
}

/// Rewrites the addressee, text and kind of a message. Only its author may do so.
pub async fn edit(
    store: &Store,
    id: Uuid,
    requester: &str,
    MessageDraft { to, text, kind }: MessageDraft,
    now: OffsetDateTime,
) -> AppResult<Message> {
    if !registry::is_active(store, requester).await? {
        return Err(AppError::Unauthorized(requester.to_owned()));
    }
    ensure_author(store, id, requester).await?;

    let updated = sqlx::query(
        "UPDATE messages SET recipient=?,text=?,kind=?,sent_at=? WHERE id=? AND sender=?",
    )
    .bind(&to)
    .bind(&text)
    .bind(kind.as_str())
    .bind(unix_millis(now))
    .bind(id.to_string())
    .bind(requester)
    .execute(store.pool())
    .await?;

    // deleted between the ownership check and the update
    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("message".to_owned()));
    }

    Ok(Message {
        id,
        from: requester.to_owned(),
        to,
        text,
        kind,
        sent_at: now,
    })
}

pub async fn delete(store: &Store, id: Uuid, requester: &str) -> AppResult<()> {
    ensure_author(store, id, requester).await?;

    let deleted = sqlx::query("DELETE FROM messages WHERE id=? AND sender=?")
        .bind(id.to_string())
        .bind(requester)
        .execute(store.pool())
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound("message".to_owned()));
    }
    Ok(())
}

/// Messages `viewer` may read, oldest first.
///
/// Broadcast and status entries are public. A private entry shows up for its
/// author, its addressee, or everyone when addressed to `broadcast_target`.
/// With a `limit`, only the newest `limit` of those are returned.
pub async fn list_visible(
    store: &Store,
    viewer: &str,
    broadcast_target: &str,
    limit: Option<u32>,
) -> AppResult<Vec<Message>> {
    // a negative LIMIT means no limit to sqlite
    let limit = limit.map(i64::from).unwrap_or(-1);

    let rows: Vec<MessageRow> = sqlx::query_as(
        "SELECT id,sender,recipient,text,kind,sent_at FROM (
            SELECT rowid AS seq,id,sender,recipient,text,kind,sent_at FROM messages
            WHERE kind IN ('message','status')
               OR (kind='private_message' AND (sender=? OR recipient=? OR recipient=?))
            ORDER BY rowid DESC
            LIMIT ?
        ) ORDER BY seq",
    )
    .bind(viewer)
    .bind(viewer)
    .bind(broadcast_target)
    .bind(limit)
    .fetch_all(store.pool())
    .await?;

    rows.into_iter().map(Message::try_from).collect()
}
