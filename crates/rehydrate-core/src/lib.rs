//! Rehydrate Core: replay and append for event-sourced aggregates.
//!
//! This crate bridges the type-erased event log (bytes plus a type tag) and
//! strongly typed aggregates. The [`replay::Replayer`] folds stored events
//! back into an aggregate; the [`append::Appender`] turns an aggregate's
//! pending changes into event records and hands them to the log under an
//! optimistic-concurrency assertion. It contains no storage code.

pub mod aggregate;
pub mod append;
mod cancel;
pub mod clock;
pub mod codec;
pub mod error;
pub mod event;
pub mod log;
pub mod registry;
pub mod replay;
