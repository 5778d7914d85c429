use std::time::Duration;

use time::OffsetDateTime;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info};

use crate::{
    AppResult,
    config::{ReaperConfig, RoomSettings},
    messages::log::{self, Presence},
    participants::registry,
    store::Store,
};

/// One pass: evicts everyone idle for longer than `idle_timeout` and posts a
/// departure notice for each, all stamped `now`.
pub async fn sweep(
    store: &Store,
    broadcast_target: &str,
    idle_timeout: Duration,
    now: OffsetDateTime,
) -> AppResult<Vec<String>> {
    let cutoff = now - idle_timeout;
    let mut tx = store.pool().begin().await?;

    let evicted = registry::evict_idle(&mut *tx, cutoff).await?;
    for name in &evicted {
        log::append_status(&mut *tx, name, broadcast_target, Presence::Left, now).await?;
    }

    tx.commit().await?;
    Ok(evicted)
}

/// Runs [`sweep`] every `config.period` until the returned task is aborted.
///
/// Sweeps never overlap; a tick that fails is logged and the next one runs as
/// usual. `config.period` must be non-zero.
pub fn spawn(store: Store, room: RoomSettings, config: ReaperConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick fires immediately
        interval.tick().await;

        info!(period = ?config.period, idle_timeout = ?config.idle_timeout, "reaper started");

        loop {
            interval.tick().await;

            let now = OffsetDateTime::now_utc();
            match sweep(&store, &room.broadcast_target, config.idle_timeout, now).await {
                Ok(evicted) if evicted.is_empty() => debug!("no idle participants"),
                Ok(evicted) => info!(
                    count = evicted.len(),
                    participants = ?evicted,
                    "evicted idle participants"
                ),
                Err(err) => error!(error = %err, "reaper tick failed"),
            }
        }
    })
}
