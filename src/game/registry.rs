//! Fixed-capacity player registry.
//!
//! Owned exclusively by the [`crate::game::engine::Engine`] task — there
//! is no mutex here. A slot's identity (its id) is stable for the whole
//! connection lifetime; the table only ever tracks "is this slot in use
//! and by whom", never anything reachable from another task.

use tokio::sync::mpsc;

use crate::game::codec::Message;

/// Depth of a player's outbound queue. Flight ticks are dropped on
/// overflow (see [`Slot::send_tick`]); every other event is delivered
/// best-effort via `try_send`.
pub const OUTBOX_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u64);

pub struct Slot {
    pub id: PlayerId,
    pub name: String,
    pub outbox: mpsc::Sender<Message>,
    pub bet_value: f32,
    pub has_bet: bool,
    pub has_cashed_out: bool,
    pub current_profit: f32,
    /// Set once a `Disconnect` is processed mid-flight for a player who
    /// still owes the house a settlement; the slot is kept alive until
    /// that settlement runs, then reaped. See the settle-then-release
    /// policy.
    pub pending_release: bool,
}

impl Slot {
    fn reset_for_round(&mut self) {
        self.bet_value = 0.0;
        self.has_bet = false;
        self.has_cashed_out = false;
    }
}

#[derive(Default)]
pub struct Registry {
    slots: Vec<Option<Slot>>,
    next_id: u64,
}

/// What the listener learns back after asking the engine for a slot.
pub enum Reservation {
    Granted {
        id: PlayerId,
        outbox_rx: mpsc::Receiver<Message>,
    },
    Full,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Registry { slots, next_id: 1 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Reserve the first free slot for a newly accepted connection.
    pub fn acquire(&mut self) -> Reservation {
        let Some(free_idx) = self.slots.iter().position(|s| s.is_none()) else {
            return Reservation::Full;
        };
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        self.slots[free_idx] = Some(Slot {
            id,
            name: String::new(),
            outbox: tx,
            bet_value: 0.0,
            has_bet: false,
            has_cashed_out: false,
            current_profit: 0.0,
            pending_release: false,
        });
        Reservation::Granted { id, outbox_rx: rx }
    }

    pub fn set_name(&mut self, id: PlayerId, name: String) {
        if let Some(slot) = self.find_mut(id) {
            slot.name = name;
        }
    }

    pub fn find(&self, id: PlayerId) -> Option<&Slot> {
        self.slots.iter().flatten().find(|s| s.id == id)
    }

    pub fn find_mut(&mut self, id: PlayerId) -> Option<&mut Slot> {
        self.slots.iter_mut().flatten().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots.iter_mut().flatten()
    }

    pub fn reset_all_for_round(&mut self) {
        for slot in self.iter_mut() {
            slot.reset_for_round();
        }
    }

    /// Idempotent: releasing an unknown or already-free id is a no-op.
    /// If the slot still has an unsettled bet and `settle_first` is
    /// true (round is mid-flight), the slot is kept alive for the next
    /// settlement pass instead of being dropped immediately.
    pub fn release(&mut self, id: PlayerId, round_in_flight: bool) {
        let Some(idx) = self.slots.iter().position(|s| matches!(s, Some(s) if s.id == id)) else {
            return;
        };
        let owes_settlement = matches!(
            &self.slots[idx],
            Some(s) if round_in_flight && s.has_bet && !s.has_cashed_out
        );
        if owes_settlement {
            self.slots[idx].as_mut().unwrap().pending_release = true;
        } else {
            self.slots[idx] = None;
        }
    }

    /// Drop any slot previously deferred by [`Registry::release`] whose
    /// settlement has since run (its `has_bet`/`has_cashed_out` no
    /// longer indicate an outstanding obligation).
    pub fn reap_pending_releases(&mut self) {
        for slot in self.slots.iter_mut() {
            if matches!(slot, Some(s) if s.pending_release) {
                *slot = None;
            }
        }
    }
}
