//! Error types for the combat core.

use crate::battle::BattleResult;
use crate::combatant::CombatantId;

/// Errors that can occur while setting up or driving a battle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CombatError {
    /// A roster entry failed validation and was not enlisted.
    #[error("invalid combatant '{name}': {reason}")]
    InvalidCombatant {
        /// Display name of the rejected entry.
        name: String,
        /// Why the entry was rejected.
        reason: String,
    },

    /// The battle already reached a terminal result.
    #[error("battle is already over ({0})")]
    BattleOver(BattleResult),

    /// The roster cannot change once the first round has started.
    #[error("battle is already in progress")]
    BattleInProgress,

    /// No combatant with this id is enlisted.
    #[error("unknown combatant: {0}")]
    UnknownCombatant(CombatantId),

    /// An event subscriber failed to handle an event.
    #[error("subscriber failed: {0}")]
    Subscriber(String),
}

/// Convenience result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;
