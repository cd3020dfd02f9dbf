//! Record Service
//!
//! CRUD operations over the ticket collection.
//!
//! ## Per-record lifecycle
//! ```text
//!   absent ──create──▶ present ──update──▶ present
//!                         │
//!                         └──delete──▶ absent
//! ```
//! Update and delete on an absent id fail with `NotFound`.
//!
//! The service holds no ticket state of its own; every call goes to the
//! store. An update reads and then writes without holding a lock across
//! both steps, so two interleaved updates to one ticket can lose one of them.

mod clock;
mod ids;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{EventEaseError, Result, TicketAction};
use crate::store::DurableMap;
use crate::ticket::{field, format_timestamp, Fields, Ticket};

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};

/// Attempts at drawing an unused id before giving up
const MAX_ID_ATTEMPTS: usize = 16;

/// CRUD logic for tickets
pub struct TicketService<C = SystemClock, G = UuidGenerator> {
    store: Arc<DurableMap<Ticket>>,
    clock: C,
    ids: G,
}

impl TicketService {
    /// Service with the wall clock and random UUIDs
    pub fn new(store: Arc<DurableMap<Ticket>>) -> Self {
        Self::with_collaborators(store, SystemClock, UuidGenerator)
    }
}

impl<C: Clock, G: IdGenerator> TicketService<C, G> {
    pub fn with_collaborators(store: Arc<DurableMap<Ticket>>, clock: C, ids: G) -> Self {
        Self { store, clock, ids }
    }

    /// Create a ticket from caller fields
    ///
    /// `id` and `createdAt` are always synthesized; caller values for them
    /// are replaced.
    pub fn create(&self, fields: Fields) -> Result<Ticket> {
        let id = self.fresh_id()?;
        let created_at = format_timestamp(self.clock.now());

        let mut ticket = Ticket::from_fields(fields);
        ticket.set(field::ID, Value::String(id.clone()));
        ticket.set(field::CREATED_AT, Value::String(created_at));

        self.store.insert(&id, &ticket)?;
        tracing::debug!("Created ticket {}", id);

        Ok(ticket)
    }

    /// Fetch one ticket
    pub fn get(&self, id: &str) -> Result<Ticket> {
        self.store
            .get(id)?
            .ok_or_else(|| EventEaseError::not_found(id, TicketAction::Get))
    }

    /// All tickets, ordered by id
    pub fn list(&self) -> Result<Vec<Ticket>> {
        self.store.values()
    }

    /// Merge `patch` into an existing ticket
    ///
    /// Every field in `patch` overwrites the stored one; omitted fields keep
    /// their values. `createdAt` and `id` are restored afterwards, whatever
    /// the patch said.
    pub fn update(&self, id: &str, patch: Fields) -> Result<Ticket> {
        let existing = self
            .store
            .get(id)?
            .ok_or_else(|| EventEaseError::not_found(id, TicketAction::Update))?;

        let mut merged = existing.clone();
        merged.overwrite(patch);
        restore(&mut merged, &existing, field::CREATED_AT);
        restore(&mut merged, &existing, field::ID);

        self.store.insert(id, &merged)?;
        tracing::debug!("Updated ticket {}", id);

        Ok(merged)
    }

    /// Remove a ticket, returning it as it was just before removal
    pub fn delete(&self, id: &str) -> Result<Ticket> {
        let removed = self
            .store
            .remove(id)?
            .ok_or_else(|| EventEaseError::not_found(id, TicketAction::Delete))?;

        tracing::debug!("Deleted ticket {}", id);
        Ok(removed)
    }

    /// The backing store
    pub fn store(&self) -> &Arc<DurableMap<Ticket>> {
        &self.store
    }

    fn fresh_id(&self) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if !self.store.contains_key(&id) {
                return Ok(id);
            }
            tracing::warn!("Generated ticket id {} already in use, retrying", id);
        }
        Err(EventEaseError::Storage(format!(
            "No unused ticket id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }
}

/// Put `original`'s value for `name` back on `merged` (or drop it if it had none)
fn restore(merged: &mut Ticket, original: &Ticket, name: &str) {
    match original.get(name) {
        Some(value) => merged.set(name, value.clone()),
        None => {
            merged.unset(name);
        }
    }
}
