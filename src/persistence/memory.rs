//! In-memory slot, used natively and in tests

use std::cell::RefCell;
use std::rc::Rc;

use super::SnapshotSlot;
use crate::error::PersistError;

/// Snapshot held in memory. Clones share the same storage, so a second
/// store opened on a clone sees what the first one persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    data: Rc<RefCell<Option<String>>>,
    /// Max snapshot size in bytes; larger writes fail like a full LocalStorage
    quota: Option<usize>,
    unavailable: bool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: &str) -> Self {
        let slot = Self::new();
        *slot.data.borrow_mut() = Some(snapshot.to_string());
        slot
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    /// Make every read and write fail
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    pub fn snapshot(&self) -> Option<String> {
        self.data.borrow().clone()
    }
}

impl SnapshotSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, PersistError> {
        if self.unavailable {
            return Err(PersistError::Unavailable("memory slot disabled".into()));
        }
        Ok(self.data.borrow().clone())
    }

    fn write(&mut self, snapshot: &str) -> Result<(), PersistError> {
        if self.unavailable {
            return Err(PersistError::Unavailable("memory slot disabled".into()));
        }
        if self.quota.is_some_and(|q| snapshot.len() > q) {
            return Err(PersistError::QuotaExceeded);
        }
        *self.data.borrow_mut() = Some(snapshot.to_string());
        Ok(())
    }
}
