//! Card collection persistence
//!
//! The whole collection is one JSON array in a single slot. Every save
//! rewrites the full snapshot; there is no incremental update.

mod memory;

pub use memory::MemorySlot;

use crate::card::Card;
use crate::error::PersistError;

/// LocalStorage key holding the card array
pub const CARDS_KEY: &str = "calorieCards";

/// A single durable location holding a full serialized snapshot
pub trait SnapshotSlot {
    /// Current snapshot, `None` if nothing was ever written
    fn read(&self) -> Result<Option<String>, PersistError>;

    /// Replace the snapshot
    fn write(&mut self, snapshot: &str) -> Result<(), PersistError>;
}

/// Read the card list; missing or unreadable snapshots load as empty
pub fn load_cards<S: SnapshotSlot + ?Sized>(slot: &S) -> Result<Vec<Card>, PersistError> {
    let Some(json) = slot.read()? else {
        return Ok(Vec::new());
    };
    match decode(&json) {
        Ok(cards) => Ok(cards),
        Err(e) => {
            log::warn!("Discarding unreadable card snapshot: {}", e);
            Ok(Vec::new())
        }
    }
}

/// Serialize and write the full card list
pub fn save_cards<S: SnapshotSlot + ?Sized>(
    slot: &mut S,
    cards: &[Card],
) -> Result<(), PersistError> {
    let json = serde_json::to_string(cards)?;
    slot.write(&json)
}

fn decode(json: &str) -> Result<Vec<Card>, serde_json::Error> {
    // `JSON.parse(null)` in older builds left a literal "null" behind
    if json.trim() == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(json)
}
