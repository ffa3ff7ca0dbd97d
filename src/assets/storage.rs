//! Resource tables
//!
//! An `Assets<T>` owns one handle to every asset of a type and deduplicates
//! by a source key (a file path or a procedural description), so two
//! entities built from the same source share one asset.

use rustc_hash::FxHashMap;

use super::handle::AssetHandle;

/// Table of shared assets of one type
#[derive(Debug)]
pub struct Assets<T> {
    /// Handles indexed by asset id
    by_id: FxHashMap<u64, AssetHandle<T>>,
    /// Source key to asset id
    by_key: FxHashMap<String, u64>,
}

impl<T> Assets<T> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_id: FxHashMap::default(),
            by_key: FxHashMap::default(),
        }
    }

    /// Add an asset without a source key
    pub fn add(&mut self, asset: T) -> AssetHandle<T> {
        let handle = AssetHandle::new(asset);
        self.by_id.insert(handle.id(), handle.clone());
        handle
    }

    /// Add an asset under a source key, or return the existing one for that key
    pub fn add_keyed(&mut self, key: impl Into<String>, asset: T) -> AssetHandle<T> {
        let key = key.into();
        if let Some(existing) = self.get_by_key(&key) {
            return existing;
        }

        let handle = self.add(asset);
        self.by_key.insert(key, handle.id());
        handle
    }

    /// Return the asset for `key`, building it with `build` on first use.
    ///
    /// # Errors
    ///
    /// Returns whatever `build` fails with; nothing is inserted in that case.
    pub fn get_or_try_add<E>(
        &mut self,
        key: &str,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<AssetHandle<T>, E> {
        if let Some(existing) = self.get_by_key(key) {
            return Ok(existing);
        }

        let asset = build()?;
        Ok(self.add_keyed(key, asset))
    }

    /// Look up an asset by id
    #[must_use]
    pub fn get(&self, id: u64) -> Option<AssetHandle<T>> {
        self.by_id.get(&id).cloned()
    }

    /// Look up an asset by source key
    #[must_use]
    pub fn get_by_key(&self, key: &str) -> Option<AssetHandle<T>> {
        self.by_key.get(key).and_then(|&id| self.get(id))
    }

    /// Drop every asset that only this table still holds.
    ///
    /// Returns the number of assets released.
    pub fn release_unused(&mut self) -> usize {
        let before = self.by_id.len();
        self.by_id.retain(|_, handle| handle.holders() > 1);

        let by_id = &self.by_id;
        self.by_key.retain(|_, id| by_id.contains_key(id));

        before - self.by_id.len()
    }

    /// Number of stored assets
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate over all handles
    pub fn iter(&self) -> impl Iterator<Item = &AssetHandle<T>> + '_ {
        self.by_id.values()
    }
}

impl<T> Default for Assets<T> {
    fn default() -> Self {
        Self::new()
    }
}
