use std::{fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;

/// Target name that makes a message visible to everyone in the room.
pub const DEFAULT_BROADCAST_TARGET: &str = "Todos";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub room: RoomSettings,
    pub reaper: ReaperConfig,
}

#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub broadcast_target: String,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            broadcast_target: DEFAULT_BROADCAST_TARGET.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReaperConfig {
    /// Time between two sweeps.
    pub period: Duration,
    /// Participants silent for longer than this are evicted.
    pub idle_timeout: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(10),
        }
    }
}

impl ReaperConfig {
    /// Both timings must be non-zero: a zero period cannot drive an interval.
    pub fn validate(self) -> anyhow::Result<Self> {
        if self.period.is_zero() {
            anyhow::bail!("REAPER_PERIOD_SECS must be greater than zero");
        }
        if self.idle_timeout.is_zero() {
            anyhow::bail!("IDLE_TIMEOUT_SECS must be greater than zero");
        }
        Ok(self)
    }
}

impl Config {
    /// Reads the configuration from the environment, falling back to `.env`.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = ReaperConfig::default();

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://lobby.db?mode=rwc".to_owned())?,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 16)?,
            bind_addr: var_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 5000)))?,
            room: RoomSettings {
                broadcast_target: var_or(
                    "BROADCAST_TARGET",
                    DEFAULT_BROADCAST_TARGET.to_owned(),
                )?,
            },
            reaper: ReaperConfig {
                period: Duration::from_secs(var_or(
                    "REAPER_PERIOD_SECS",
                    defaults.period.as_secs(),
                )?),
                idle_timeout: Duration::from_secs(var_or(
                    "IDLE_TIMEOUT_SECS",
                    defaults.idle_timeout.as_secs(),
                )?),
            }
            .validate()?,
        })
    }
}

fn var_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match dotenv::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .with_context(|| format!("invalid value {raw:?} for {key}")),
        Err(_) => Ok(default),
    }
}
