//! Rehydrate: catalog item bounded context.
//!
//! A small domain built on the replay/append core: items are created,
//! renamed and retired, and every change goes through a replay, mutate,
//! commit cycle that retries on concurrency conflicts.

pub mod application;
pub mod domain;
