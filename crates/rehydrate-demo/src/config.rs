//! Demo configuration read from the environment.

use rehydrate_catalog::application::store::DEFAULT_MAX_COMMIT_ATTEMPTS;

use crate::error::AppError;

const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_RACE_WRITERS: u32 = 4;

/// Settings for one demo run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// PostgreSQL connection string. The in-memory log is used when unset.
    pub database_url: Option<String>,
    /// Attempts per command before a conflict is reported.
    pub max_commit_attempts: u32,
    /// Pool size for the PostgreSQL log.
    pub pg_max_connections: u32,
    /// Writers renaming the same item at once during the race.
    pub race_writers: u32,
}

impl DemoConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a numeric variable does not parse or is
    /// zero.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Same as [`DemoConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_commit_attempts: positive(
                &lookup,
                "MAX_COMMIT_ATTEMPTS",
                DEFAULT_MAX_COMMIT_ATTEMPTS,
            )?,
            pg_max_connections: positive(
                &lookup,
                "PG_MAX_CONNECTIONS",
                DEFAULT_PG_MAX_CONNECTIONS,
            )?,
            race_writers: positive(&lookup, "RACE_WRITERS", DEFAULT_RACE_WRITERS)?,
        })
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u32,
) -> Result<u32, AppError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(AppError::Config(format!("{key} must be greater than zero"))),
        Ok(value) => Ok(value),
        Err(e) => Err(AppError::Config(format!("{key} must be a positive integer: {e}"))),
    }
}
