use crate::damage::DamageModifierTable;
use crate::event::SharedEventLog;

/// Configuration for a battle.
#[derive(Debug, Clone)]
pub struct BattleConfig {
    /// Rounds a single `fight` call may run before the battle is suspended. 0 = unlimited.
    pub max_rounds: u32,
    /// Capacity for logs created with [`BattleConfig::event_log`]. 0 = unlimited.
    pub max_events: usize,
    /// Attack-vs-defense multipliers used by `damage`.
    pub damage_table: DamageModifierTable,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_rounds: 100,
            max_events: 0,
            damage_table: DamageModifierTable::default(),
        }
    }
}

impl BattleConfig {
    /// Set the round cap per `fight` call (0 = unlimited).
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Set the event log capacity (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Replace the damage modifier table.
    pub fn with_damage_table(mut self, table: DamageModifierTable) -> Self {
        self.damage_table = table;
        self
    }

    /// A fresh shared event log sized by `max_events`.
    pub fn event_log(&self) -> SharedEventLog {
        SharedEventLog::new(self.max_events)
    }
}
