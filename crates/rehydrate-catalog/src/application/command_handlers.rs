//! Command handlers for the catalog context.
//!
//! Each handler rebuilds the item from its stream, runs the domain operation,
//! and commits the resulting events against the replayed version.

use rehydrate_core::append::Committed;
use rehydrate_core::clock::Clock;
use rehydrate_core::error::DomainError;
use tokio_util::sync::CancellationToken;

use crate::application::store::CatalogStore;
use crate::domain::aggregates::CatalogItem;
use crate::domain::commands::{CreateItem, RenameItem, RetireItem};

/// Handles the `CreateItem` command: creates the item and commits it as the
/// first event of a new stream.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the command is invalid and
/// `DomainError::ConcurrencyConflict` if the item already exists.
#[tracing::instrument(
    skip_all,
    fields(correlation_id = %command.correlation_id, item_id = %command.item_id)
)]
pub async fn handle_create_item(
    command: &CreateItem,
    clock: &dyn Clock,
    store: &CatalogStore,
    cancel: &CancellationToken,
) -> Result<Committed, DomainError> {
    let mut item = CatalogItem::new(command.item_id);
    item.create(&command.name, &command.sku, clock)?;
    store.insert(&mut item, cancel).await
}

/// Handles the `RenameItem` command.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if the item does not exist,
/// `DomainError::Validation` if the rename is not allowed, or a conflict once
/// every retry lost the race.
#[tracing::instrument(
    skip_all,
    fields(correlation_id = %command.correlation_id, item_id = %command.item_id)
)]
pub async fn handle_rename_item(
    command: &RenameItem,
    clock: &dyn Clock,
    store: &CatalogStore,
    cancel: &CancellationToken,
) -> Result<Committed, DomainError> {
    store
        .execute(command.item_id, cancel, |item| item.rename(&command.name, clock))
        .await
}

/// Handles the `RetireItem` command.
///
/// # Errors
///
/// Same as [`handle_rename_item`].
#[tracing::instrument(
    skip_all,
    fields(correlation_id = %command.correlation_id, item_id = %command.item_id)
)]
pub async fn handle_retire_item(
    command: &RetireItem,
    clock: &dyn Clock,
    store: &CatalogStore,
    cancel: &CancellationToken,
) -> Result<Committed, DomainError> {
    store
        .execute(command.item_id, cancel, |item| item.retire(&command.reason, clock))
        .await
}
