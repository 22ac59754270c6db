//! Shared, string-keyed property bags.
//!
//! The same type backs an endpoint configuration's user properties, a
//! session's user properties and the per-attempt bag handed to the transport
//! engine. Keys under [`RESERVED_PREFIX`] belong to this crate.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Key prefix reserved for values written by the client itself.
pub const RESERVED_PREFIX: &str = "rsws.client.";

/// Key under which the listener stores a handshake failure.
pub(crate) const HANDSHAKE_ERROR_KEY: &str = "rsws.client.handshake-error";

/// A value stored in a [`Properties`] bag.
pub type PropertyValue = Arc<dyn Any + Send + Sync>;

/// Thread-safe property bag. Cloning yields another handle to the same map.
#[derive(Clone, Default)]
pub struct Properties {
    inner: Arc<Mutex<HashMap<String, PropertyValue>>>,
}

impl Properties {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one under the same key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedProperty`] if `key` starts with [`RESERVED_PREFIX`].
    pub fn insert<V>(&self, key: impl Into<String>, value: V) -> Result<Option<PropertyValue>>
    where
        V: Any + Send + Sync,
    {
        let key = key.into();
        if key.starts_with(RESERVED_PREFIX) {
            return Err(Error::ReservedProperty(key));
        }
        Ok(self.inner.lock().insert(key, Arc::new(value)))
    }

    pub(crate) fn insert_reserved(&self, key: &str, value: PropertyValue) {
        debug_assert!(key.starts_with(RESERVED_PREFIX));
        self.inner.lock().insert(key.to_string(), value);
    }

    /// Get the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<PropertyValue> {
        self.inner.lock().get(key).cloned()
    }

    /// Get the value stored under `key` if it has type `V`.
    #[must_use]
    pub fn get_as<V>(&self, key: &str) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        self.get(key).and_then(|value| value.downcast::<V>().ok())
    }

    /// Remove and return the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<PropertyValue> {
        self.inner.lock().remove(key)
    }

    /// Returns `true` if a value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// A new, independent bag holding the same values.
    ///
    /// Values themselves are shared; later inserts and removals on either bag
    /// are not visible in the other.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            inner: Arc::new(Mutex::new(self.inner.lock().clone())),
        }
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Properties")
            .field("keys", &self.keys())
            .finish()
    }
}
