//! Commands for the catalog context.

use uuid::Uuid;

/// Command to add a new item to the catalog.
#[derive(Debug, Clone)]
pub struct CreateItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier of the new item.
    pub item_id: Uuid,
    /// Display name.
    pub name: String,
    /// Stock keeping unit.
    pub sku: String,
}

/// Command to rename an existing item.
#[derive(Debug, Clone)]
pub struct RenameItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The item to rename.
    pub item_id: Uuid,
    /// The new display name.
    pub name: String,
}

/// Command to withdraw an item from the catalog.
#[derive(Debug, Clone)]
pub struct RetireItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The item to retire.
    pub item_id: Uuid,
    /// Why the item is retired.
    pub reason: String,
}
