//! Type-tag dispatch and type resolution.
//!
//! Each aggregate declares its closed event set once, as an
//! [`EventRegistry`] mapping type tags to payload decoders. A
//! [`TypeResolver`] may sit in front of the registry to translate stored tags
//! (for example, tags written under an older name) into registered ones.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::codec::{Codec, CodecError};

type Decoder<E, C> = Box<dyn Fn(&C, &[u8]) -> Result<E, CodecError> + Send + Sync>;

/// Dispatch table from type tag to a decoder producing the aggregate's event
/// enum.
pub struct EventRegistry<E, C> {
    decoders: HashMap<&'static str, Decoder<E, C>>,
}

impl<E: 'static, C: Codec> EventRegistry<E, C> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registers payload type `P` under `event_type`. Decoded payloads are
    /// lifted into the event enum with `variant`, usually the enum
    /// constructor itself.
    ///
    /// # Panics
    ///
    /// Panics if `event_type` is already registered.
    #[must_use]
    pub fn with<P>(mut self, event_type: &'static str, variant: fn(P) -> E) -> Self
    where
        P: DeserializeOwned + 'static,
    {
        let decoder: Decoder<E, C> =
            Box::new(move |codec: &C, bytes: &[u8]| codec.decode::<P>(bytes).map(variant));
        let previous = self.decoders.insert(event_type, decoder);
        assert!(
            previous.is_none(),
            "event type `{event_type}` registered twice"
        );
        self
    }

    /// Returns `true` if a decoder exists for `event_type`.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Decodes `bytes` as the payload registered under `event_type`.
    ///
    /// Returns `None` when no decoder is registered for the tag.
    pub fn decode(
        &self,
        event_type: &str,
        codec: &C,
        bytes: &[u8],
    ) -> Option<Result<E, CodecError>> {
        self.decoders
            .get(event_type)
            .map(|decoder| decoder(codec, bytes))
    }

    /// Returns the registered type tags in no particular order.
    pub fn event_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.keys().copied()
    }
}

impl<E: 'static, C: Codec> Default for EventRegistry<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C> fmt::Debug for EventRegistry<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("event_types", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Maps a stored type tag to the tag the aggregate's registry knows.
///
/// Returns `None` when the stored tag cannot be resolved at all.
pub trait TypeResolver: Send + Sync {
    /// Resolves a stored type tag.
    fn resolve(&self, stored_type: &str) -> Option<String>;
}

impl<F> TypeResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn resolve(&self, stored_type: &str) -> Option<String> {
        self(stored_type)
    }
}

/// Resolver that renames legacy type tags and passes every other tag through
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    aliases: HashMap<String, String>,
}

impl AliasResolver {
    /// Creates a resolver with no aliases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `legacy` to `current`.
    #[must_use]
    pub fn alias(mut self, legacy: impl Into<String>, current: impl Into<String>) -> Self {
        self.aliases.insert(legacy.into(), current.into());
        self
    }
}

impl TypeResolver for AliasResolver {
    fn resolve(&self, stored_type: &str) -> Option<String> {
        Some(
            self.aliases
                .get(stored_type)
                .cloned()
                .unwrap_or_else(|| stored_type.to_owned()),
        )
    }
}
