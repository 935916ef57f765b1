//! Cancellation of in-flight log calls.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::DomainError;

/// Drives `call` to completion unless `cancel` fires first. A token that is
/// already cancelled keeps `call` from being polled at all.
pub(crate) async fn run_cancellable<T, F>(
    cancel: &CancellationToken,
    call: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    if cancel.is_cancelled() {
        return Err(DomainError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DomainError::Cancelled),
        result = call => result,
    }
}
