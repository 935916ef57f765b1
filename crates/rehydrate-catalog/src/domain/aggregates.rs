//! Aggregate roots for the catalog context.

use rehydrate_core::aggregate::AggregateRoot;
use rehydrate_core::clock::Clock;
use rehydrate_core::error::DomainError;
use uuid::Uuid;

use super::events::{CatalogEvent, CatalogEventKind, ItemCreated, ItemRenamed, ItemRetired};

/// The aggregate root for a catalog item.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: u64,
    /// Display name, set once the item is created.
    pub(crate) name: Option<String>,
    /// Stock keeping unit, set once the item is created.
    pub(crate) sku: Option<String>,
    /// Why the item was retired, if it was.
    pub(crate) retirement_reason: Option<String>,
    /// Uncommitted events pending persistence.
    pending_changes: Vec<CatalogEvent>,
}

impl CatalogItem {
    /// Creates a blank catalog item. Used both for new items and as the
    /// starting point of a replay.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            name: None,
            sku: None,
            retirement_reason: None,
            pending_changes: Vec::new(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the stock keeping unit.
    #[must_use]
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    /// Returns `true` once the item has been retired.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retirement_reason.is_some()
    }

    /// Creates the item, producing an `ItemCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item already exists or the
    /// name or SKU is blank.
    pub fn create(&mut self, name: &str, sku: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        if self.version > 0 {
            return Err(DomainError::Validation(format!("item {} already exists", self.id)));
        }
        let name = non_blank("name", name)?;
        let sku = non_blank("sku", sku)?;

        self.raise(CatalogEventKind::ItemCreated(ItemCreated { name, sku }), clock);
        Ok(())
    }

    /// Renames the item, producing an `ItemRenamed` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item does not exist, is
    /// retired, or the name is blank or unchanged.
    pub fn rename(&mut self, name: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;
        let name = non_blank("name", name)?;
        if self.name.as_deref() == Some(name.as_str()) {
            return Err(DomainError::Validation(format!(
                "item {} is already named {name:?}",
                self.id
            )));
        }

        self.raise(CatalogEventKind::ItemRenamed(ItemRenamed { name }), clock);
        Ok(())
    }

    /// Retires the item, producing an `ItemRetired` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item does not exist or is
    /// already retired.
    pub fn retire(&mut self, reason: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;

        self.raise(
            CatalogEventKind::ItemRetired(ItemRetired {
                reason: reason.trim().to_owned(),
            }),
            clock,
        );
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.version == 0 {
            return Err(DomainError::Validation(format!("item {} does not exist", self.id)));
        }
        if self.is_retired() {
            return Err(DomainError::Validation(format!("item {} is retired", self.id)));
        }
        Ok(())
    }

    fn raise(&mut self, kind: CatalogEventKind, clock: &dyn Clock) {
        let event = CatalogEvent::new(kind, clock);
        self.apply(&event);
        self.pending_changes.push(event);
    }
}

fn non_blank(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_owned())
}

impl AggregateRoot for CatalogItem {
    type Event = CatalogEventKind;

    const AGGREGATE_TYPE: &'static str = "catalog_item";

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &CatalogEvent) {
        match &event.kind {
            CatalogEventKind::ItemCreated(payload) => {
                self.name = Some(payload.name.clone());
                self.sku = Some(payload.sku.clone());
            }
            CatalogEventKind::ItemRenamed(payload) => {
                self.name = Some(payload.name.clone());
            }
            CatalogEventKind::ItemRetired(payload) => {
                self.retirement_reason = Some(payload.reason.clone());
            }
        }
        self.version += 1;
    }

    fn pending_changes(&self) -> &[CatalogEvent] {
        &self.pending_changes
    }

    fn clear_pending_changes(&mut self) {
        self.pending_changes.clear();
    }
}
