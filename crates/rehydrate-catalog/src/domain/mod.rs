//! Domain model for the catalog context.

pub mod aggregates;
pub mod commands;
pub mod events;
