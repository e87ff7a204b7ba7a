//! Log store bound to its snapshot slot
//!
//! [`LogCache`] owns a [`LogStore`] together with the [`SnapshotSlot`] it was
//! restored from. Restoring never fails: an empty or corrupt slot degrades to
//! a fresh store and the outcome is reported as a [`RestoreOrigin`].

use crate::category::Category;
use crate::error::{StoreError, StoreResult};
use crate::record::LogRecord;
use crate::slot::SnapshotSlot;
use crate::store::LogStore;
use chrono::{DateTime, Utc};

/// Where a restored cache's contents came from
#[derive(Debug)]
pub enum RestoreOrigin {
    /// Parsed from the persisted snapshot
    Snapshot,
    /// Slot was empty; a fresh store was created
    Fresh,
    /// Slot was unreadable or corrupt; a fresh store replaced it
    Recovered(StoreError),
}

impl RestoreOrigin {
    /// True if a fresh store had to be created
    #[inline]
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        !matches!(self, Self::Snapshot)
    }
}

/// Log store plus the slot it persists to
#[derive(Debug)]
pub struct LogCache<S> {
    store: LogStore,
    slot: S,
}

impl<S: SnapshotSlot> LogCache<S> {
    /// Create a fresh store in `slot` and persist it immediately
    pub fn create(slot: S) -> Self {
        Self::create_at(slot, Utc::now())
    }

    /// [`create`](Self::create) with an explicit clock reading
    pub fn create_at(slot: S, now: DateTime<Utc>) -> Self {
        let cache = Self {
            store: LogStore::new(now),
            slot,
        };
        match cache.persist() {
            Ok(()) => tracing::info!(slot = %cache.slot.describe(), "initialized new log store"),
            Err(err) => tracing::warn!(%err, "new log store could not be persisted"),
        }
        cache
    }

    /// Restore from `slot`, falling back to a fresh store
    pub fn restore(slot: S) -> (Self, RestoreOrigin) {
        Self::restore_at(slot, Utc::now())
    }

    /// [`restore`](Self::restore) with an explicit clock reading for the
    /// fallback store
    pub fn restore_at(slot: S, now: DateTime<Utc>) -> (Self, RestoreOrigin) {
        match slot.load() {
            Ok(Some(snapshot)) => match LogStore::from_json(&snapshot) {
                Ok(store) => {
                    tracing::info!(
                        slot = %slot.describe(),
                        records = store.total_len(),
                        "restored log store from snapshot"
                    );
                    (Self { store, slot }, RestoreOrigin::Snapshot)
                }
                Err(err) => {
                    tracing::error!(%err, "error parsing stored logs");
                    (Self::create_at(slot, now), RestoreOrigin::Recovered(err))
                }
            },
            Ok(None) => (Self::create_at(slot, now), RestoreOrigin::Fresh),
            Err(err) => {
                tracing::error!(%err, "error reading stored logs");
                (Self::create_at(slot, now), RestoreOrigin::Recovered(err))
            }
        }
    }

    /// Current store contents
    #[inline]
    #[must_use]
    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Mutable store contents; callers persist when they are done
    #[inline]
    pub fn store_mut(&mut self) -> &mut LogStore {
        &mut self.store
    }

    /// Backing slot
    #[inline]
    #[must_use]
    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Insert into the category named `name`
    ///
    /// # Errors
    /// `StoreError::UnknownCategory` when `name` is not tracked; the store is
    /// unchanged and the condition is logged
    pub fn append(&mut self, name: &str, record: LogRecord) -> StoreResult<Category> {
        let result = self.store.append(name, record);
        if let Err(err) = &result {
            tracing::error!(%err, "category not found in log store");
        }
        result
    }

    /// Insert into a known category
    #[inline]
    pub fn push(&mut self, category: Category, record: LogRecord) {
        self.store.push(category, record);
    }

    /// Drop records older than the retention window
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let removed = self.store.purge_expired(now);
        tracing::debug!(removed, "purged expired logs");
        removed
    }

    /// Write the whole store to the slot
    ///
    /// # Errors
    /// Serialization or slot write failures
    pub fn persist(&self) -> StoreResult<()> {
        let snapshot = self.store.to_json()?;
        self.slot.save(&snapshot)
    }

    /// Replace the store with a fresh one cleared at `now` and persist it
    ///
    /// # Errors
    /// Slot write failures; the in-memory reset still takes effect
    pub fn reset_at(&mut self, now: DateTime<Utc>) -> StoreResult<()> {
        self.store = LogStore::new(now);
        self.persist()
    }

    /// Split into store and slot
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (LogStore, S) {
        (self.store, self.slot)
    }
}
