//! Per-round initiative queue.
//!
//! The queue is built once per round from living combatants, sorted by
//! speed (descending) with ties broken by join order. Once built it never
//! reorders: combatants that die or become blocked mid-round are skipped
//! by [`InitiativeScheduler::next`] while everyone else keeps their slot.

use serde::Serialize;

use crate::combatant::{Combatant, CombatantId};
use crate::roster::Roster;

/// One slot in the queue: who, and how fast they were when it was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InitiativeEntry {
    /// The combatant in this slot.
    pub id: CombatantId,
    /// Speed snapshot taken at build time.
    pub speed: i32,
}

/// Lifecycle of the queue within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    /// Nothing built yet.
    Idle,
    /// Built for a round, no actor handed out yet.
    Built,
    /// At least one actor handed out this round.
    Iterating,
    /// Cursor ran past the last slot.
    Exhausted,
}

/// Builds and walks one round's initiative queue.
#[derive(Debug, Clone)]
pub struct InitiativeScheduler {
    queue: Vec<InitiativeEntry>,
    cursor: usize,
    state: SchedulerState,
}

impl Default for InitiativeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl InitiativeScheduler {
    /// Create an idle scheduler.
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            cursor: 0,
            state: SchedulerState::Idle,
        }
    }

    /// Build the queue for a new round from every living combatant.
    ///
    /// Speed descending; equal speeds keep join order.
    pub fn build<C: Combatant>(&mut self, roster: &Roster<C>) -> &[InitiativeEntry] {
        let mut queue: Vec<InitiativeEntry> = roster
            .iter()
            .filter(|(_, c)| c.is_alive())
            .map(|(id, c)| InitiativeEntry {
                id,
                speed: c.speed(),
            })
            .collect();
        queue.sort_by(|a, b| b.speed.cmp(&a.speed).then(a.id.cmp(&b.id)));

        self.queue = queue;
        self.cursor = 0;
        self.state = SchedulerState::Built;
        &self.queue
    }

    /// Hand out the next eligible actor, or `None` when the round is done.
    ///
    /// Slots for which `skip` returns true are passed over. The returned
    /// actor stays current until [`advance`](Self::advance) is called.
    pub fn next<F>(&mut self, mut skip: F) -> Option<CombatantId>
    where
        F: FnMut(CombatantId) -> bool,
    {
        while let Some(entry) = self.queue.get(self.cursor) {
            if skip(entry.id) {
                self.cursor += 1;
                continue;
            }
            self.state = SchedulerState::Iterating;
            return Some(entry.id);
        }
        if self.state != SchedulerState::Idle {
            self.state = SchedulerState::Exhausted;
        }
        None
    }

    /// Move past the current slot, whatever the turn's outcome was.
    pub fn advance(&mut self) {
        if self.cursor < self.queue.len() {
            self.cursor += 1;
        }
        if self.cursor >= self.queue.len() && self.state != SchedulerState::Idle {
            self.state = SchedulerState::Exhausted;
        }
    }

    /// The slot under the cursor, if any.
    pub fn current(&self) -> Option<CombatantId> {
        self.queue.get(self.cursor).map(|e| e.id)
    }

    /// Ids in queue order.
    pub fn order(&self) -> Vec<CombatantId> {
        self.queue.iter().map(|e| e.id).collect()
    }

    /// The full queue with speed snapshots.
    pub fn entries(&self) -> &[InitiativeEntry] {
        &self.queue
    }

    /// Position of the cursor. Never decreases within a round.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// True once the cursor has passed the last slot.
    pub fn is_exhausted(&self) -> bool {
        self.state == SchedulerState::Exhausted
    }
}
