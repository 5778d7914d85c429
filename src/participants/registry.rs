//! Who is in the room, and when they were last heard from.

use sqlx::SqliteConnection;
use time::OffsetDateTime;

use crate::{
    AppError, AppResult,
    messages::log::{self, Presence},
    store::{Store, unix_millis},
};

use super::Participant;

/// Adds `name` to the room and announces it.
///
/// Both writes share one transaction, so a rejected join leaves no status
/// message behind.
pub async fn join(
    store: &Store,
    name: &str,
    broadcast_target: &str,
    now: OffsetDateTime,
) -> AppResult<Participant> {
    let last_seen_at = unix_millis(now);
    let mut tx = store.pool().begin().await?;

    let inserted = sqlx::query("INSERT INTO participants (name,last_seen_at) VALUES (?,?)")
        .bind(name)
        .bind(last_seen_at)
        .execute(&mut *tx)
        .await;

    if let Err(err) = inserted {
        if err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation())
        {
            return Err(AppError::Conflict(name.to_owned()));
        }
        return Err(err.into());
    }

    log::append_status(&mut *tx, name, broadcast_target, Presence::Joined, now).await?;
    tx.commit().await?;

    Ok(Participant {
        name: name.to_owned(),
        last_seen_at,
    })
}

pub async fn list(store: &Store) -> AppResult<Vec<Participant>> {
    Ok(
        sqlx::query_as("SELECT name,last_seen_at FROM participants ORDER BY rowid")
            .fetch_all(store.pool())
            .await?,
    )
}

pub async fn is_active(store: &Store, name: &str) -> AppResult<bool> {
    Ok(sqlx::query("SELECT 1 FROM participants WHERE name=?")
        .bind(name)
        .fetch_optional(store.pool())
        .await?
        .is_some())
}

/// Refreshes the last-seen time of an active participant. Never creates one.
pub async fn heartbeat(store: &Store, name: &str, now: OffsetDateTime) -> AppResult<()> {
    let updated = sqlx::query("UPDATE participants SET last_seen_at=? WHERE name=?")
        .bind(unix_millis(now))
        .bind(name)
        .execute(store.pool())
        .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound(name.to_owned()));
    }
    Ok(())
}

/// Removes everyone last seen before `cutoff` and returns their names, sorted.
///
/// Names already gone are simply not returned, so repeating the call is harmless.
pub async fn evict_idle(
    conn: &mut SqliteConnection,
    cutoff: OffsetDateTime,
) -> AppResult<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("DELETE FROM participants WHERE last_seen_at < ? RETURNING name")
            .bind(unix_millis(cutoff))
            .fetch_all(&mut *conn)
            .await?;

    let mut evicted: Vec<String> = rows.into_iter().map(|(name,)| name).collect();
    evicted.sort();
    Ok(evicted)
}
