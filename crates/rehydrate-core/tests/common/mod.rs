//! Shared fixture aggregate for the replay and append suites.
#![allow(dead_code)]

use rehydrate_core::aggregate::AggregateRoot;
use rehydrate_core::clock::Clock;
use rehydrate_core::codec::{Codec, CodecError};
use rehydrate_core::event::{DomainEvent, EventKind};
use rehydrate_core::registry::EventRegistry;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

pub const PROJECT_CREATED: &str = "project.created";
pub const PROJECT_RENAMED: &str = "project.renamed";
pub const PROJECT_ARCHIVED: &str = "project.archived";
pub const PROJECT_POISONED: &str = "project.poisoned";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCreated {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRenamed {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectArchived {}

/// A payload that can never be serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Poisoned;

impl Serialize for Poisoned {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("poisoned payload"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectEvent {
    Created(ProjectCreated),
    Renamed(ProjectRenamed),
    Archived(ProjectArchived),
    Poisoned(Poisoned),
}

impl EventKind for ProjectEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => PROJECT_CREATED,
            Self::Renamed(_) => PROJECT_RENAMED,
            Self::Archived(_) => PROJECT_ARCHIVED,
            Self::Poisoned(_) => PROJECT_POISONED,
        }
    }

    fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Created(payload) => codec.encode(payload),
            Self::Renamed(payload) => codec.encode(payload),
            Self::Archived(payload) => codec.encode(payload),
            Self::Poisoned(payload) => codec.encode(payload),
        }
    }

    // `project.poisoned` is deliberately absent: it only exists to fail encoding.
    fn registry<C: Codec>() -> EventRegistry<Self, C> {
        EventRegistry::new()
            .with(PROJECT_CREATED, Self::Created)
            .with(PROJECT_RENAMED, Self::Renamed)
            .with(PROJECT_ARCHIVED, Self::Archived)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub version: u64,
    pub name: Option<String>,
    pub archived: bool,
    pending: Vec<DomainEvent<ProjectEvent>>,
}

impl Project {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            name: None,
            archived: false,
            pending: Vec::new(),
        }
    }

    pub fn create(&mut self, name: &str, clock: &dyn Clock) {
        self.raise(
            ProjectEvent::Created(ProjectCreated { name: name.into() }),
            clock,
        );
    }

    pub fn rename(&mut self, name: &str, clock: &dyn Clock) {
        self.raise(
            ProjectEvent::Renamed(ProjectRenamed { name: name.into() }),
            clock,
        );
    }

    pub fn archive(&mut self, clock: &dyn Clock) {
        self.raise(ProjectEvent::Archived(ProjectArchived {}), clock);
    }

    pub fn poison(&mut self, clock: &dyn Clock) {
        self.raise(ProjectEvent::Poisoned(Poisoned), clock);
    }

    /// Observable state, ignoring the pending list.
    pub fn state(&self) -> (u64, Option<String>, bool) {
        (self.version, self.name.clone(), self.archived)
    }

    fn raise(&mut self, kind: ProjectEvent, clock: &dyn Clock) {
        let event = DomainEvent::new(kind, clock);
        self.apply(&event);
        self.pending.push(event);
    }
}

impl AggregateRoot for Project {
    type Event = ProjectEvent;

    const AGGREGATE_TYPE: &'static str = "project";

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &DomainEvent<ProjectEvent>) {
        match &event.kind {
            ProjectEvent::Created(payload) => self.name = Some(payload.name.clone()),
            ProjectEvent::Renamed(payload) => self.name = Some(payload.name.clone()),
            ProjectEvent::Archived(_) => self.archived = true,
            ProjectEvent::Poisoned(_) => {}
        }
        self.version += 1;
    }

    fn pending_changes(&self) -> &[DomainEvent<ProjectEvent>] {
        &self.pending
    }

    fn clear_pending_changes(&mut self) {
        self.pending.clear();
    }
}
