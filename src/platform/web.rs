//! Browser bindings: LocalStorage slot and `window.confirm`

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Storage};

use crate::error::PersistError;
use crate::persistence::SnapshotSlot;
use crate::store::Confirm;

/// One LocalStorage key holding a full snapshot
pub struct LocalStorageSlot {
    key: String,
}

impl LocalStorageSlot {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<Storage, PersistError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistError::Unavailable("localStorage not available".into()))
    }
}

impl SnapshotSlot for LocalStorageSlot {
    fn read(&self) -> Result<Option<String>, PersistError> {
        Self::storage()?.get_item(&self.key).map_err(storage_error)
    }

    fn write(&mut self, snapshot: &str) -> Result<(), PersistError> {
        Self::storage()?
            .set_item(&self.key, snapshot)
            .map_err(storage_error)
    }
}

fn storage_error(err: JsValue) -> PersistError {
    match err.dyn_ref::<DomException>() {
        Some(e) if e.name() == "QuotaExceededError" => PersistError::QuotaExceeded,
        Some(e) => PersistError::Unavailable(format!("{}: {}", e.name(), e.message())),
        None => PersistError::Unavailable(format!("{:?}", err)),
    }
}

/// Blocking `window.confirm` prompt
pub struct BrowserConfirm;

impl Confirm for BrowserConfirm {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}
