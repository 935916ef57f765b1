//! Rehydrate demo: error types.

use std::process::ExitCode;

use rehydrate_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the demo.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A replay, commit or domain operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A spawned writer panicked or was aborted.
    #[error("writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    /// Process exit code reported for this error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::from(2),
            Self::Database(_) => ExitCode::from(3),
            Self::Domain(err) if err.is_conflict() => ExitCode::from(4),
            Self::Domain(DomainError::Cancelled) => ExitCode::from(130),
            Self::Domain(_) | Self::Task(_) => ExitCode::FAILURE,
        }
    }
}
