//! Calorie Cards - daily calorie allowance tracker
//!
//! Core modules:
//! - `card`: Card record, form validation, colours, progress bands
//! - `store`: Card collection with the two-phase subtract/commit edit
//! - `persistence`: Full-snapshot storage slots
//! - `platform`: Browser/native platform abstraction
//! - `notice`: User-facing notifications
//! - `settings`: UI preferences

pub mod card;
pub mod error;
pub mod notice;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod store;

pub use card::{Card, CardForm, CardId, ProgressLevel};
pub use error::{CardError, PersistError, ValidationError};
pub use notice::{Notice, NoticeKind};
pub use persistence::{CARDS_KEY, MemorySlot, SnapshotSlot};
pub use settings::Settings;
pub use store::{CardStore, Confirm, DeleteOutcome, DetailView, EditSession};

/// Calorie budget limits
pub mod consts {
    /// Smallest accepted daily budget (kcal, inclusive)
    pub const MIN_CALORIES: i64 = 1500;
    /// Largest accepted daily budget (kcal, inclusive)
    pub const MAX_CALORIES: i64 = 3500;
}
