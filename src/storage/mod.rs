//! # Key-value persistence for entity state
//!
//! Entities of kind CONTROL survive reboots by storing their canonical text
//! value under a short key. This module defines the store contract and a
//! fixed-capacity RAM implementation suitable for tests and host builds.
//!
//! Keys are at most [`KEY_LEN`] bytes, matching the namespace limits of the
//! flash key-value stores found on common microcontrollers. Values are at most
//! [`VALUE_LEN`] bytes.
//!
//! # Usage
//!
//! ```rust
//! use iotlink::storage::{KeyValueStore, MemoryStore};
//!
//! let mut store: MemoryStore<8> = MemoryStore::new();
//! store.put("Relay", "ON").unwrap();
//! assert_eq!(store.get("Relay").unwrap().as_deref(), Some("ON"));
//!
//! store.remove("Relay").unwrap();
//! assert_eq!(store.get("Relay").unwrap(), None);
//! ```
//!
//! # Failure model
//!
//! Implementations report failures through `Self::Error`, but callers in this
//! crate treat persistence as best effort: a failed `put` is logged and the
//! in-memory value stays authoritative for the running session.

#![deny(unsafe_code)]

use heapless::{FnvIndexMap, String};

pub mod error;


use error::Error;

/// Maximum length of a persistence key in bytes.
pub const KEY_LEN: usize = 15;

/// Maximum length of a persisted value in bytes.
pub const VALUE_LEN: usize = 64;

/// A persisted text value.
pub type StoredValue = String<VALUE_LEN>;

/// Trait for string key-value persistence.
///
/// This is the contract the entity layer relies on to restore CONTROL values
/// across reboots. Keys passed in are always at most [`KEY_LEN`] bytes.
pub trait KeyValueStore {
    /// The type of error that can be returned by store operations.
    type Error: core::fmt::Debug;

    /// Reads the value stored under `key`, or `None` if nothing is stored.
    fn get(&mut self, key: &str) -> Result<Option<StoredValue>, Self::Error>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), Self::Error>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    type Error = T::Error;

    fn get(&mut self, key: &str) -> Result<Option<StoredValue>, Self::Error> {
        T::get(self, key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        T::put(self, key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), Self::Error> {
        T::remove(self, key)
    }
}

/// RAM-backed key-value store with room for `N` keys.
///
/// `N` must be a power of two greater than one (a requirement of the
/// underlying [`FnvIndexMap`]). Contents are lost when the value is dropped,
/// which makes it a convenient stand-in for flash storage in tests.
#[derive(Debug, Default)]
pub struct MemoryStore<const N: usize> {
    entries: FnvIndexMap<String<KEY_LEN>, StoredValue, N>,
}

impl<const N: usize> MemoryStore<N> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `key` holds a value.
    pub fn contains(&self, key: &str) -> bool {
        String::<KEY_LEN>::try_from(key)
            .map(|k| self.entries.contains_key(&k))
            .unwrap_or(false)
    }

    /// Iterates over stored `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<const N: usize> KeyValueStore for MemoryStore<N> {
    type Error = Error;

    fn get(&mut self, key: &str) -> Result<Option<StoredValue>, Self::Error> {
        let key = String::<KEY_LEN>::try_from(key).map_err(|_| Error::KeyTooLong)?;
        Ok(self.entries.get(&key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        let key = String::<KEY_LEN>::try_from(key).map_err(|_| Error::KeyTooLong)?;
        let value = StoredValue::try_from(value).map_err(|_| Error::ValueTooLong)?;
        self.entries.insert(key, value).map_err(|_| Error::Full)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Self::Error> {
        let key = String::<KEY_LEN>::try_from(key).map_err(|_| Error::KeyTooLong)?;
        self.entries.remove(&key);
        Ok(())
    }
}
