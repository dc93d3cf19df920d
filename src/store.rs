//! Card store
//!
//! Owns the ordered card list and mirrors it to a `SnapshotSlot`. Editing a
//! card is two-phase: `open_detail` starts a session, `subtract` changes the
//! in-memory card only, then `commit` persists or `discard` rolls back.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::card::{Card, CardForm, CardId, ProgressLevel, random_pastel_color};
use crate::error::{CardError, Result};
use crate::persistence::{SnapshotSlot, load_cards, save_cards};
use crate::platform::{format_creation_date, now_ms};
use crate::settings::Settings;

/// Prompt shown before a card is removed
pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this card? This action cannot be undone.";

/// Asks the user to confirm a destructive action
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Detail view edit state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditSession {
    /// No card open
    #[default]
    Closed,
    /// Card `id` open; `pending` kcal subtracted since the last persist
    Open { id: CardId, pending: i64 },
}

/// What the detail view shows for the open card
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub id: CardId,
    pub title: String,
    pub remaining: i64,
    pub initial: i64,
}

impl DetailView {
    fn of(card: &Card) -> Self {
        Self {
            id: card.id,
            title: card.full_name(),
            remaining: card.remaining_calories,
            initial: card.initial_calories,
        }
    }

    /// Remaining share of the budget, 0.0 - 100.0
    pub fn percent(&self) -> f64 {
        if self.initial <= 0 {
            return 0.0;
        }
        self.remaining as f64 / self.initial as f64 * 100.0
    }

    pub fn level(&self, settings: &Settings) -> ProgressLevel {
        settings.progress_level(self.percent())
    }
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// User declined the prompt
    Cancelled,
    /// No card with that id
    Missing,
    /// Card removed; `closed_detail` if it was the open card
    Removed { closed_detail: bool },
}

/// In-memory card collection backed by a snapshot slot
pub struct CardStore<S: SnapshotSlot> {
    cards: Vec<Card>,
    slot: S,
    session: EditSession,
    rng: Pcg32,
    clock: fn() -> i64,
    /// Highest id issued or loaded
    last_id: CardId,
}

impl<S: SnapshotSlot> CardStore<S> {
    /// Read the slot once; an unreadable slot starts empty
    pub fn load(slot: S, seed: u64) -> Self {
        let cards = checked(load_cards(&slot).unwrap_or_else(|e| {
            log::warn!("Card storage unreadable, starting empty: {}", e);
            Vec::new()
        }));
        let last_id = cards.iter().map(|c| c.id).max().unwrap_or(0);
        log::info!("Loaded {} cards", cards.len());

        Self {
            cards,
            slot,
            session: EditSession::Closed,
            rng: Pcg32::seed_from_u64(seed),
            clock: now_ms,
            last_id,
        }
    }

    /// Replace the time source used for ids and creation dates
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn list(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn session(&self) -> EditSession {
        self.session
    }

    /// Id of the card open in the detail view
    pub fn current(&self) -> Option<CardId> {
        match self.session {
            EditSession::Open { id, .. } => Some(id),
            EditSession::Closed => None,
        }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Validate the form and append a new card
    ///
    /// On a persistence failure the card is kept in memory and the error
    /// is returned so the caller can warn the user.
    pub fn create(&mut self, form: &CardForm) -> Result<Card> {
        let valid = form.validate()?;
        let now = (self.clock)();
        let id = self.next_id(now);

        let card = Card {
            id,
            first_name: valid.first_name,
            last_name: valid.last_name,
            age: valid.age,
            gender: valid.gender,
            initial_calories: valid.initial_calories,
            remaining_calories: valid.initial_calories,
            created_on: format_creation_date(now),
            color: random_pastel_color(&mut self.rng),
        };
        self.cards.push(card.clone());
        log::info!("Created card {} ({} kcal)", id, card.initial_calories);

        self.persist()?;
        Ok(card)
    }

    /// Remove a card after the user confirms
    pub fn delete(&mut self, id: CardId, confirm: &impl Confirm) -> Result<DeleteOutcome> {
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(DeleteOutcome::Cancelled);
        }

        let Some(index) = self.cards.iter().position(|c| c.id == id) else {
            return Ok(DeleteOutcome::Missing);
        };
        self.cards.remove(index);

        // Forced close: the open card's pending edit goes with it
        let closed_detail = self.current() == Some(id);
        if closed_detail {
            self.session = EditSession::Closed;
        }
        log::info!("Deleted card {}", id);

        self.persist()?;
        Ok(DeleteOutcome::Removed { closed_detail })
    }

    /// Open the detail view; `None` if the id is unknown
    ///
    /// Opening a different card first rolls back the previous one.
    pub fn open_detail(&mut self, id: CardId) -> Option<DetailView> {
        let view = DetailView::of(self.get(id)?);

        match self.session {
            EditSession::Open { id: open, .. } if open == id => {}
            EditSession::Open { .. } => {
                self.discard();
                self.session = EditSession::Open { id, pending: 0 };
            }
            EditSession::Closed => {
                self.session = EditSession::Open { id, pending: 0 };
            }
        }
        Some(view)
    }

    /// Take `amount` kcal off the open card, in memory only
    pub fn subtract(&mut self, amount: Option<i64>) -> Result<DetailView> {
        let EditSession::Open { id, pending } = self.session else {
            return Err(CardError::NoOpenCard);
        };
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CardError::NotFound(id))?;

        let amount = card.check_subtract(amount)?;
        card.remaining_calories -= amount;
        let view = DetailView::of(card);

        self.session = EditSession::Open {
            id,
            pending: pending + amount,
        };
        log::debug!("Card {}: -{} kcal, {} left (uncommitted)", id, amount, view.remaining);
        Ok(view)
    }

    /// Persist everything, pending edit included, and close the detail view
    ///
    /// The view closes even if persisting fails; memory stays authoritative.
    pub fn commit(&mut self) -> Result<()> {
        if let EditSession::Open { id, pending } = self.session {
            log::info!("Committing card {} ({} kcal subtracted)", id, pending);
        }
        self.session = EditSession::Closed;
        self.persist()
    }

    /// Drop the open card's pending edit and close the detail view
    ///
    /// Adds the pending delta back, which restores the last committed
    /// value even when that commit never reached the slot. Returns the
    /// restored card.
    pub fn discard(&mut self) -> Option<&Card> {
        let EditSession::Open { id, pending } = std::mem::take(&mut self.session) else {
            return None;
        };

        let card = self.cards.iter_mut().find(|c| c.id == id)?;
        card.remaining_calories += pending;
        log::info!("Discarded changes to card {} ({} kcal restored)", id, pending);
        Some(&*card)
    }

    /// Re-read the slot as if the session restarted
    pub fn reload(&mut self) -> Result<()> {
        self.cards = checked(load_cards(&self.slot)?);
        self.session = EditSession::Closed;
        if let Some(max) = self.cards.iter().map(|c| c.id).max() {
            self.last_id = self.last_id.max(max);
        }
        Ok(())
    }

    fn next_id(&mut self, now: i64) -> CardId {
        let id = now.max(self.last_id.saturating_add(1));
        self.last_id = id;
        id
    }

    /// Write the full list. An open card is written without its pending
    /// subtraction, so only `commit` makes that durable.
    fn persist(&mut self) -> Result<()> {
        let result = match self.session {
            EditSession::Open { id, pending } if pending > 0 => {
                let mut snapshot = self.cards.clone();
                if let Some(card) = snapshot.iter_mut().find(|c| c.id == id) {
                    card.remaining_calories += pending;
                }
                save_cards(&mut self.slot, &snapshot)
            }
            _ => save_cards(&mut self.slot, &self.cards),
        };

        result.map_err(|e| {
            log::warn!("Failed to persist {} cards: {}", self.cards.len(), e);
            CardError::from(e)
        })
    }
}

/// Clamp stored balances into `0..=initial`
fn checked(mut cards: Vec<Card>) -> Vec<Card> {
    for card in &mut cards {
        let before = card.remaining_calories;
        if card.clamp_remaining() {
            log::warn!(
                "Card {}: remaining {} kcal outside 0..={}, clamped to {}",
                card.id,
                before,
                card.initial_calories,
                card.remaining_calories
            );
        }
    }
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PersistError, ValidationError};
    use crate::persistence::MemorySlot;
    use proptest::prelude::*;

    const T0: i64 = 1_741_176_000_000;

    fn fixed_clock() -> i64 {
        T0
    }

    fn yes(_: &str) -> bool {
        true
    }

    fn no(_: &str) -> bool {
        false
    }

    fn store(slot: MemorySlot) -> CardStore<MemorySlot> {
        CardStore::load(slot, 12345).with_clock(fixed_clock)
    }

    fn form(name: &str, calories: i64) -> CardForm {
        CardForm {
            first_name: name.into(),
            last_name: "Lopez".into(),
            age: Some(30),
            gender: "F".into(),
            initial_calories: Some(calories),
        }
    }

    fn ids(store: &CardStore<MemorySlot>) -> Vec<CardId> {
        store.list().iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_create_starts_full() {
        let mut store = store(MemorySlot::new());
        let card = store.create(&form("Ana", 2000)).unwrap();

        assert_eq!(card.initial_calories, 2000);
        assert_eq!(card.remaining_calories, 2000);
        assert!(card.color.starts_with("hsl("));
        assert_eq!(card.created_on.len(), 10);
        assert_eq!(store.list().len(), 1);

        // Persisted on create
        let reopened = CardStore::load(store.slot().clone(), 1);
        assert_eq!(reopened.list(), store.list());
    }

    #[test]
    fn test_create_budget_boundaries() {
        let mut store = store(MemorySlot::new());

        let err = store.create(&form("Low", 1499)).unwrap_err();
        assert!(matches!(
            err,
            CardError::Validation(ValidationError::CaloriesTooLow { min: 1500 })
        ));
        let err = store.create(&form("High", 3501)).unwrap_err();
        assert!(matches!(
            err,
            CardError::Validation(ValidationError::CaloriesTooHigh { max: 3500 })
        ));
        assert!(store.list().is_empty());
        assert!(store.slot().snapshot().is_none());

        store.create(&form("Min", 1500)).unwrap();
        store.create(&form("Max", 3500)).unwrap();
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_ids_unique_with_frozen_clock() {
        let mut store = store(MemorySlot::new());
        for i in 0..5 {
            store.create(&form(&format!("P{}", i), 2000)).unwrap();
        }
        assert_eq!(ids(&store), vec![T0, T0 + 1, T0 + 2, T0 + 3, T0 + 4]);

        // A fresh session continues after the highest stored id
        let mut next = CardStore::load(store.slot().clone(), 9).with_clock(fixed_clock);
        let card = next.create(&form("Late", 2000)).unwrap();
        assert_eq!(card.id, T0 + 5);
    }

    #[test]
    fn test_open_unknown_is_noop() {
        let mut store = store(MemorySlot::new());
        assert!(store.open_detail(42).is_none());
        assert_eq!(store.session(), EditSession::Closed);
    }

    #[test]
    fn test_subtract_discard_commit_example() {
        let mut store = store(MemorySlot::new());
        let id = store.create(&form("Ana", 2000)).unwrap().id;

        let view = store.open_detail(id).unwrap();
        assert_eq!((view.remaining, view.initial), (2000, 2000));

        let view = store.subtract(Some(300)).unwrap();
        assert_eq!(view.remaining, 1700);
        assert_eq!(store.session(), EditSession::Open { id, pending: 300 });

        let restored = store.discard().unwrap();
        assert_eq!(restored.remaining_calories, 2000);
        assert_eq!(store.session(), EditSession::Closed);

        store.open_detail(id).unwrap();
        store.subtract(Some(300)).unwrap();
        store.commit().unwrap();
        assert_eq!(store.current(), None);

        store.reload().unwrap();
        assert_eq!(store.get(id).unwrap().remaining_calories, 1700);
    }

    #[test]
    fn test_subtract_rejections_leave_state() {
        let mut store = store(MemorySlot::new());
        let id = store.create(&form("Ana", 2000)).unwrap().id;

        assert!(matches!(store.subtract(Some(10)), Err(CardError::NoOpenCard)));

        store.open_detail(id).unwrap();
        store.subtract(Some(1900)).unwrap();

        for bad in [None, Some(0), Some(-1)] {
            let err = store.subtract(bad).unwrap_err();
            assert!(matches!(err, CardError::Validation(ValidationError::InvalidAmount)));
        }
        let err = store.subtract(Some(101)).unwrap_err();
        assert!(matches!(
            err,
            CardError::Validation(ValidationError::ExceedsRemaining { remaining: 100 })
        ));
        assert_eq!(store.get(id).unwrap().remaining_calories, 100);
        assert_eq!(store.session(), EditSession::Open { id, pending: 1900 });

        // Exactly to zero is fine
        assert_eq!(store.subtract(Some(100)).unwrap().remaining, 0);
    }

    #[test]
    fn test_delete_keeps_others_in_order() {
        let mut store = store(MemorySlot::new());
        for name in ["A", "B", "C", "D"] {
            store.create(&form(name, 2000)).unwrap();
        }
        let before = ids(&store);

        let outcome = store.delete(before[1], &yes).unwrap();
        assert_eq!(outcome, DeleteOutcome::Removed { closed_detail: false });
        assert_eq!(ids(&store), vec![before[0], before[2], before[3]]);

        assert_eq!(store.delete(999, &yes).unwrap(), DeleteOutcome::Missing);
        assert_eq!(store.list().len(), 3);

        store.reload().unwrap();
        assert_eq!(ids(&store), vec![before[0], before[2], before[3]]);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut store = store(MemorySlot::new());
        let id = store.create(&form("Ana", 2000)).unwrap().id;

        assert_eq!(store.delete(id, &no).unwrap(), DeleteOutcome::Cancelled);
        assert!(store.get(id).is_some());

        let prompt = std::cell::Cell::new(false);
        let asked = |msg: &str| {
            prompt.set(msg == DELETE_PROMPT);
            true
        };
        store.delete(id, &asked).unwrap();
        assert!(prompt.get());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_delete_open_card_closes_detail() {
        let mut store = store(MemorySlot::new());
        let id = store.create(&form("Ana", 2000)).unwrap().id;
        store.open_detail(id).unwrap();
        store.subtract(Some(500)).unwrap();

        let outcome = store.delete(id, &yes).unwrap();
        assert_eq!(outcome, DeleteOutcome::Removed { closed_detail: true });
        assert_eq!(store.session(), EditSession::Closed);
        assert!(store.discard().is_none());
    }

    #[test]
    fn test_create_during_edit_does_not_persist_pending() {
        let mut store = store(MemorySlot::new());
        let id = store.create(&form("Ana", 2000)).unwrap().id;
        store.open_detail(id).unwrap();
        store.subtract(Some(400)).unwrap();

        store.create(&form("Bea", 1800)).unwrap();
        let saved = CardStore::load(store.slot().clone(), 1);
        assert_eq!(saved.get(id).unwrap().remaining_calories, 2000);

        assert_eq!(store.discard().unwrap().remaining_calories, 2000);
    }

    #[test]
    fn test_switching_cards_rolls_back_previous() {
        let mut store = store(MemorySlot::new());
        let a = store.create(&form("Ana", 2000)).unwrap().id;
        let b = store.create(&form("Bea", 2500)).unwrap().id;

        store.open_detail(a).unwrap();
        store.subtract(Some(250)).unwrap();
        store.open_detail(b).unwrap();

        assert_eq!(store.get(a).unwrap().remaining_calories, 2000);
        assert_eq!(store.session(), EditSession::Open { id: b, pending: 0 });
    }

    #[test]
    fn test_persist_failure_keeps_memory() {
        let mut slot = MemorySlot::new();
        slot.set_quota(Some(8));
        let mut store = store(slot);

        let err = store.create(&form("Ana", 2000)).unwrap_err();
        assert!(matches!(err, CardError::Persistence(PersistError::QuotaExceeded)));
        assert_eq!(store.list().len(), 1);

        // Never persisted: discard falls back to the pending delta
        let id = store.list()[0].id;
        store.open_detail(id).unwrap();
        store.subtract(Some(700)).unwrap();
        assert_eq!(store.discard().unwrap().remaining_calories, 2000);

        // Commit still closes the view
        store.open_detail(id).unwrap();
        store.subtract(Some(700)).unwrap();
        assert!(matches!(store.commit(), Err(CardError::Persistence(_))));
        assert_eq!(store.session(), EditSession::Closed);
        assert_eq!(store.get(id).unwrap().remaining_calories, 1300);
    }

    #[test]
    fn test_discard_after_failed_commit_keeps_commit() {
        let mut store = store(MemorySlot::new());
        let id = store.create(&form("Ana", 2000)).unwrap().id;

        let mut full = store.slot().clone();
        full.set_quota(Some(1));
        let mut store = CardStore::load(full, 3).with_clock(fixed_clock);

        store.open_detail(id).unwrap();
        store.subtract(Some(500)).unwrap();
        assert!(matches!(store.commit(), Err(CardError::Persistence(_))));
        assert_eq!(store.get(id).unwrap().remaining_calories, 1500);

        store.open_detail(id).unwrap();
        store.subtract(Some(200)).unwrap();
        assert_eq!(store.discard().unwrap().remaining_calories, 1500);

        store.open_detail(id).unwrap();
        assert_eq!(store.discard().unwrap().remaining_calories, 1500);
    }

    #[test]
    fn test_load_clamps_out_of_range_balances() {
        let json = r#"[
            {"id":1,"nombre":"Ana","apellidos":"Lopez","edad":30,"genero":"F",
             "caloriasIniciales":2000,"caloriasRestantes":2600,
             "fechaCreacion":"05/03/2025","color":"hsl(1, 80%, 80%)"},
            {"id":2,"nombre":"Bea","apellidos":"Ruiz","edad":41,"genero":"F",
             "caloriasIniciales":1800,"caloriasRestantes":-40,
             "fechaCreacion":"05/03/2025","color":"hsl(2, 80%, 80%)"},
            {"id":3,"nombre":"Carlos","apellidos":"Gil","edad":25,"genero":"M",
             "caloriasIniciales":2500,"caloriasRestantes":900,
             "fechaCreacion":"05/03/2025","color":"hsl(3, 80%, 80%)"}
        ]"#;
        let mut store = store(MemorySlot::with_snapshot(json));

        assert_eq!(store.get(1).unwrap().remaining_calories, 2000);
        assert_eq!(store.get(2).unwrap().remaining_calories, 0);
        assert_eq!(store.get(3).unwrap().remaining_calories, 900);

        store.reload().unwrap();
        assert_eq!(store.get(1).unwrap().remaining_calories, 2000);
        assert_eq!(store.get(2).unwrap().remaining_calories, 0);
    }

    #[test]
    fn test_odd_age_keeps_every_stored_card() {
        let json = r#"[
            {"id":1,"nombre":"Ana","apellidos":"Lopez","edad":"30","genero":"F",
             "caloriasIniciales":2000,"caloriasRestantes":1700,
             "fechaCreacion":"05/03/2025","color":"hsl(1, 80%, 80%)"},
            {"id":2,"nombre":"Bea","apellidos":"Ruiz","edad":"25.5","genero":"F",
             "caloriasIniciales":1800,"caloriasRestantes":1800,
             "fechaCreacion":"05/03/2025","color":"hsl(2, 80%, 80%)"}
        ]"#;
        let mut store = store(MemorySlot::with_snapshot(json));
        assert_eq!(ids(&store), vec![1, 2]);
        assert_eq!(store.get(2).unwrap().age, 25);

        store.create(&form("Carla", 2200)).unwrap();
        let reopened = CardStore::load(store.slot().clone(), 1);
        assert_eq!(reopened.list().len(), 3);
        assert_eq!(reopened.get(1).unwrap().remaining_calories, 1700);
    }

    #[test]
    fn test_next_id_saturates() {
        let json = format!(
            r#"[{{"id":{},"nombre":"Ana","apellidos":"Lopez","edad":30,"genero":"F",
                "caloriasIniciales":2000,"caloriasRestantes":2000,
                "fechaCreacion":"05/03/2025","color":"hsl(1, 80%, 80%)"}}]"#,
            i64::MAX
        );
        let mut store = store(MemorySlot::with_snapshot(&json));
        store.create(&form("Bea", 2000)).unwrap();
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_unavailable_slot_loads_empty() {
        let mut slot = MemorySlot::with_snapshot("[]");
        slot.set_unavailable(true);
        let store = store(slot);
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_detail_level() {
        let mut store = store(MemorySlot::new());
        let id = store.create(&form("Ana", 2000)).unwrap().id;
        let settings = Settings::default();

        assert_eq!(store.open_detail(id).unwrap().level(&settings), ProgressLevel::Healthy);
        assert_eq!(store.subtract(Some(1100)).unwrap().level(&settings), ProgressLevel::Warning);
        assert_eq!(store.subtract(Some(700)).unwrap().level(&settings), ProgressLevel::Danger);
    }

    proptest! {
        #[test]
        fn prop_subtract_monotonic(
            initial in 1500i64..=3500,
            amounts in prop::collection::vec(-50i64..1200, 1..20),
        ) {
            let mut store = store(MemorySlot::new());
            let id = store.create(&form("Ana", initial)).unwrap().id;
            store.open_detail(id).unwrap();

            let mut last = initial;
            for amount in amounts {
                let result = store.subtract(Some(amount));
                let remaining = store.get(id).unwrap().remaining_calories;
                if amount > 0 && amount <= last {
                    prop_assert_eq!(result.unwrap().remaining, last - amount);
                    prop_assert_eq!(remaining, last - amount);
                } else {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(remaining, last);
                }
                prop_assert!(remaining >= 0 && remaining <= last);
                last = remaining;
            }

            prop_assert_eq!(store.discard().unwrap().remaining_calories, initial);
        }
    }
}
