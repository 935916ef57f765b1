//! Query handlers for the catalog context.
//!
//! Queries rebuild the item from its stream and return a read-only view.

use rehydrate_core::aggregate::AggregateRoot;
use rehydrate_core::error::DomainError;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::store::CatalogStore;

/// Read-only view of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItemView {
    /// The item identifier.
    pub item_id: Uuid,
    /// Display name.
    pub name: Option<String>,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Whether the item has been retired.
    pub retired: bool,
    /// Why the item was retired.
    pub retirement_reason: Option<String>,
    /// Current version (event count).
    pub version: u64,
}

/// Retrieves a catalog item by its ID.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if no events exist for the ID, or
/// any replay error.
pub async fn get_item_by_id(
    item_id: Uuid,
    store: &CatalogStore,
    cancel: &CancellationToken,
) -> Result<CatalogItemView, DomainError> {
    let item = store.load(item_id, cancel).await?;
    Ok(CatalogItemView {
        item_id,
        retired: item.is_retired(),
        version: item.version(),
        name: item.name,
        sku: item.sku,
        retirement_reason: item.retirement_reason,
    })
}
