//! Domain events for the catalog context.

use rehydrate_core::codec::{Codec, CodecError};
use rehydrate_core::event::{DomainEvent, EventKind};
use rehydrate_core::registry::EventRegistry;
use serde::{Deserialize, Serialize};

/// Type tag of [`ItemCreated`].
pub const ITEM_CREATED: &str = "catalog.item_created";
/// Type tag of [`ItemRenamed`].
pub const ITEM_RENAMED: &str = "catalog.item_renamed";
/// Type tag of [`ItemRetired`].
pub const ITEM_RETIRED: &str = "catalog.item_retired";

/// Emitted when an item is added to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    /// Display name.
    pub name: String,
    /// Stock keeping unit.
    pub sku: String,
}

/// Emitted when an item gets a new display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRenamed {
    /// The new display name.
    pub name: String,
}

/// Emitted when an item is withdrawn from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRetired {
    /// Why the item was retired.
    pub reason: String,
}

/// Event payload variants for the catalog context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEventKind {
    /// An item was created.
    ItemCreated(ItemCreated),
    /// An item was renamed.
    ItemRenamed(ItemRenamed),
    /// An item was retired.
    ItemRetired(ItemRetired),
}

/// Domain event envelope for the catalog context.
pub type CatalogEvent = DomainEvent<CatalogEventKind>;

impl EventKind for CatalogEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::ItemCreated(_) => ITEM_CREATED,
            Self::ItemRenamed(_) => ITEM_RENAMED,
            Self::ItemRetired(_) => ITEM_RETIRED,
        }
    }

    fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::ItemCreated(payload) => codec.encode(payload),
            Self::ItemRenamed(payload) => codec.encode(payload),
            Self::ItemRetired(payload) => codec.encode(payload),
        }
    }

    fn registry<C: Codec>() -> EventRegistry<Self, C> {
        EventRegistry::new()
            .with(ITEM_CREATED, Self::ItemCreated)
            .with(ITEM_RENAMED, Self::ItemRenamed)
            .with(ITEM_RETIRED, Self::ItemRetired)
    }
}
