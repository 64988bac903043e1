//! Interning of values parsed from registry files.
//!
//! Compat and deps tables repeat the same handful of tokens (`"1"`, `"1.6"`, common
//! UUIDs) across tens of thousands of entries. A [`ValueCache`] keeps the first value
//! built for a token and hands out clones of it afterwards, so with `T = Arc<_>` every
//! entry sharing a token points at one allocation.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{id::PackageId, version::VersionSpec};

/// Append-only map from raw token to constructed value.
#[derive(Debug)]
pub struct ValueCache<T> {
    entries: Mutex<HashMap<String, T>>,
}

impl<T> Default for ValueCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> ValueCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `raw`, building and storing it on first sight.
    pub fn intern<F>(&self, raw: &str, construct: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = entries.get(raw) {
            return value.clone();
        }
        let value = construct();
        entries.insert(raw.to_string(), value.clone());
        value
    }

    /// Like [`ValueCache::intern`], but the constructor may fail.
    ///
    /// A failed construction caches nothing.
    pub fn try_intern<F, E>(&self, raw: &str, construct: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = entries.get(raw) {
            return Ok(value.clone());
        }
        let value = construct()?;
        entries.insert(raw.to_string(), value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The caches shared by every package of one registry.
#[derive(Debug, Default)]
pub struct RegistryCaches {
    pub ids: ValueCache<PackageId>,
    pub specs: ValueCache<Arc<VersionSpec>>,
}
