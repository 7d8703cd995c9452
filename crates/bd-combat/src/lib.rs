//! Turn-based combat core for Broken Divinity.
//!
//! Two rosters, friends and foes, fight in rounds. Each round builds a
//! speed-ordered initiative queue, hands every eligible combatant one turn
//! through a caller-supplied [`TurnAction`], then resolves status and buff
//! effects in one batch at the round boundary. Everything that happens is
//! published as a [`BattleEvent`].
//!
//! Registries and scheduler state belong to a single [`Battle`], so battles
//! never share state.

/// Turn actions and the built-in strategies.
pub mod action;
/// The battle orchestrator and the context handed to turn actions.
pub mod battle;
/// Buff effects: damage and heal over time, shields.
pub mod buff;
/// The combatant capability and the built-in `Unit`.
pub mod combatant;
/// Battle configuration.
pub mod config;
/// Damage types, the modifier table, and rounding.
pub mod damage;
/// Error types for the combat core.
pub mod error;
/// Lifecycle events, the publisher, and the event log.
pub mod event;
/// Per-round initiative queue.
pub mod initiative;
/// Per-battle combatant storage.
pub mod roster;
/// Status effects that control turn eligibility.
pub mod status;

/// Re-export turn action types.
pub use action::{BasicAttack, RandomTarget, TurnAction};
/// Re-export the orchestrator types.
pub use battle::{Battle, BattleContext, BattleResult};
/// Re-export buff registry types.
pub use buff::{BuffDefinition, BuffEffect, BuffInstance, BuffKind, BuffRegistry};
/// Re-export combatant types.
pub use combatant::{Combatant, CombatantId, StatBlock, Team, Unit};
/// Re-export of [`config::BattleConfig`].
pub use config::BattleConfig;
/// Re-export damage types and resolution.
pub use damage::{DamageModifierTable, DamageType, resolve_damage};
/// Re-exports of [`error::CombatError`] and [`error::CombatResult`].
pub use error::{CombatError, CombatResult};
/// Re-export event types, the publisher and the log.
pub use event::{
    BattleEvent, EventLog, EventPublisher, LoggedEvent, SharedEventLog, Subscriber,
    SubscriptionId,
};
/// Re-export initiative scheduler types.
pub use initiative::{InitiativeEntry, InitiativeScheduler, SchedulerState};
/// Re-export of [`roster::Roster`].
pub use roster::Roster;
/// Re-export status registry types.
pub use status::{StatusDefinition, StatusInstance, StatusKind, StatusRegistry};
