//! The battle orchestrator: round loop, damage/heal resolution and
//! victory detection.
//!
//! A [`Battle`] owns its combatants, both effect registries, the
//! initiative scheduler and the event publisher. Nothing is shared between
//! battles, so any number of them can run side by side.

/// The view of a battle handed to turn actions.
pub mod context;

/// Re-export of [`context::BattleContext`].
pub use context::BattleContext;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::action::TurnAction;
use crate::buff::{BuffInstance, BuffKind, BuffRegistry};
use crate::combatant::{Combatant, CombatantId, Team};
use crate::config::BattleConfig;
use crate::damage::{DamageType, resolve_damage};
use crate::error::{CombatError, CombatResult};
use crate::event::{BattleEvent, EventPublisher, Subscriber, SubscriptionId};
use crate::initiative::InitiativeScheduler;
use crate::roster::Roster;
use crate::status::{StatusInstance, StatusKind, StatusRegistry};

/// Outcome of a battle, seen from the friends' side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleResult {
    /// Every foe is down.
    Victory,
    /// Every friend is down.
    Defeat,
    /// Still running, or suspended by the round cap.
    #[default]
    Ongoing,
}

impl BattleResult {
    /// True for victory and defeat.
    pub fn is_terminal(self) -> bool {
        self != Self::Ongoing
    }
}

impl fmt::Display for BattleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Victory => write!(f, "victory"),
            Self::Defeat => write!(f, "defeat"),
            Self::Ongoing => write!(f, "ongoing"),
        }
    }
}

/// One battle between friends and foes.
pub struct Battle<C> {
    roster: Roster<C>,
    statuses: StatusRegistry,
    buffs: BuffRegistry,
    scheduler: InitiativeScheduler,
    publisher: EventPublisher,
    config: BattleConfig,
    round: u32,
    result: BattleResult,
    started: bool,
}

impl<C> fmt::Debug for Battle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battle")
            .field("combatants", &self.roster.len())
            .field("round", &self.round)
            .field("result", &self.result)
            .field("subscribers", &self.publisher.len())
            .finish()
    }
}

impl<C: Combatant> Battle<C> {
    /// Create a battle with the built-in status and buff definitions.
    pub fn new(config: BattleConfig) -> Self {
        Self::with_registries(config, StatusRegistry::default(), BuffRegistry::default())
    }

    /// Create a battle with caller-supplied registries.
    pub fn with_registries(
        config: BattleConfig,
        statuses: StatusRegistry,
        buffs: BuffRegistry,
    ) -> Self {
        Self {
            roster: Roster::new(),
            statuses,
            buffs,
            scheduler: InitiativeScheduler::new(),
            publisher: EventPublisher::new(),
            config,
            round: 0,
            result: BattleResult::Ongoing,
            started: false,
        }
    }

    /// Register an event subscriber.
    pub fn subscribe<S: Subscriber + 'static>(&mut self, subscriber: S) -> SubscriptionId {
        self.publisher.subscribe(subscriber)
    }

    /// Remove an event subscriber.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }

    /// Add a combatant before the first round.
    ///
    /// Its starting statuses and buffs are applied with their base values.
    pub fn enlist(&mut self, combatant: C) -> CombatResult<CombatantId> {
        if self.result.is_terminal() {
            return Err(CombatError::BattleOver(self.result));
        }
        if self.started {
            return Err(CombatError::BattleInProgress);
        }
        validate(&combatant)?;

        let statuses = combatant.starting_statuses().to_vec();
        let buffs = combatant.starting_buffs().to_vec();
        let id = self.roster.push(combatant);
        tracing::debug!(id = %id, "combatant enlisted");

        for kind in statuses {
            if let Some(inst) = self.statuses.apply_default(id, kind) {
                self.emit_status_applied(id, &inst);
            }
        }
        for kind in buffs {
            if let Some(inst) = self.buffs.apply_default(id, kind) {
                self.emit_buff_applied(id, &inst);
            }
        }
        Ok(id)
    }

    /// Enlist both rosters and fight until the battle ends or the round cap
    /// is reached.
    ///
    /// Friends join before foes. Entries that fail validation or sit in the
    /// wrong roster are skipped with a warning.
    pub fn start<A>(
        &mut self,
        friends: impl IntoIterator<Item = C>,
        foes: impl IntoIterator<Item = C>,
        action: &mut A,
    ) -> CombatResult<BattleResult>
    where
        A: TurnAction<C> + ?Sized,
    {
        if self.result.is_terminal() {
            return Err(CombatError::BattleOver(self.result));
        }
        if self.started {
            return Err(CombatError::BattleInProgress);
        }
        self.enlist_side(Team::Friends, friends);
        self.enlist_side(Team::Foes, foes);
        self.fight(action)
    }

    fn enlist_side(&mut self, team: Team, members: impl IntoIterator<Item = C>) {
        for combatant in members {
            if combatant.team() != team {
                tracing::warn!(
                    name = combatant.name(),
                    expected = %team,
                    "skipping combatant listed with the wrong side"
                );
                continue;
            }
            if let Err(err) = self.enlist(combatant) {
                tracing::warn!(error = %err, "skipping roster entry");
            }
        }
    }

    /// Run rounds until the battle ends or `max_rounds` rounds have been
    /// played by this call.
    ///
    /// Returns [`BattleResult::Ongoing`] when suspended by the cap; calling
    /// `fight` again resumes at the next round.
    pub fn fight<A>(&mut self, action: &mut A) -> CombatResult<BattleResult>
    where
        A: TurnAction<C> + ?Sized,
    {
        if self.result.is_terminal() {
            return Err(CombatError::BattleOver(self.result));
        }
        if !self.started {
            self.started = true;
            tracing::info!(combatants = self.roster.len(), "battle started");
            if self.check_victory() {
                return Ok(self.result);
            }
            self.round = 1;
        }

        let mut played = 0;
        while !self.result.is_terminal() {
            if self.config.max_rounds > 0 && played >= self.config.max_rounds {
                tracing::warn!(
                    round = self.round,
                    max_rounds = self.config.max_rounds,
                    "round cap reached, battle suspended"
                );
                break;
            }
            self.play_round(action);
            played += 1;
        }
        Ok(self.result)
    }

    fn play_round<A>(&mut self, action: &mut A)
    where
        A: TurnAction<C> + ?Sized,
    {
        let round = self.round;
        self.emit(BattleEvent::RoundStarted { round });

        let order: Vec<CombatantId> = self
            .scheduler
            .build(&self.roster)
            .iter()
            .map(|e| e.id)
            .collect();
        tracing::debug!(round, queued = order.len(), "turn order built");
        self.emit(BattleEvent::TurnOrderBuilt { round, order });

        while !self.result.is_terminal() {
            let roster = &self.roster;
            let statuses = &self.statuses;
            let mut skipped = Vec::new();
            let next = self.scheduler.next(|id| {
                if !roster.is_alive(id) {
                    return true;
                }
                if statuses.blocks_turn(id) {
                    skipped.push(id);
                    return true;
                }
                false
            });
            for actor in skipped {
                tracing::debug!(round, actor = %actor, "turn skipped");
                self.emit(BattleEvent::TurnSkipped { actor });
            }
            let Some(actor) = next else {
                break;
            };

            self.emit(BattleEvent::TurnStarted { actor });
            tracing::debug!(round, actor = %actor, "turn started");
            let mut ctx = BattleContext::new(self, actor);
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| action.take_turn(actor, &mut ctx)));
            if outcome.is_err() {
                tracing::warn!(round, actor = %actor, "turn action panicked");
            }
            self.scheduler.advance();
            self.emit(BattleEvent::TurnEnded { actor });

            if self.check_victory() {
                return;
            }
        }
        if self.result.is_terminal() {
            return;
        }

        self.emit(BattleEvent::RoundEnded { round });
        self.tick_round_end();
        if !self.check_victory() {
            self.round += 1;
        }
    }

    /// Round-end batch: buff effects first, then status countdowns.
    fn tick_round_end(&mut self) {
        let report = self.buffs.on_round_end(&mut self.roster);
        tracing::debug!(
            round = self.round,
            ticks = report.ticks.len(),
            expired = report.expired.len(),
            "buffs ticked"
        );
        for tick in report.ticks {
            self.emit(BattleEvent::BuffTicked {
                target: tick.target,
                buff: tick.kind,
                delta: tick.delta,
            });
            if tick.delta < 0 && tick.hp_after <= 0 {
                self.mark_defeated(tick.target);
            }
        }
        for (target, buff) in report.expired {
            if self.roster.is_alive(target) {
                self.emit(BattleEvent::BuffExpired { target, buff });
            }
        }
        for (target, status) in self.statuses.on_round_end() {
            self.emit(BattleEvent::StatusExpired { target, status });
        }
    }

    /// Deal `amount` raw damage of `damage_type` to `target`.
    ///
    /// The amount is scaled by the modifier for `damage_type` against the
    /// target's defense type, then soaked by shields before hp is lost.
    /// Returns the scaled amount. Dead or unknown targets are ignored.
    pub fn damage(&mut self, target: CombatantId, amount: i32, damage_type: DamageType) -> i32 {
        let Some(unit) = self.roster.get(target) else {
            return 0;
        };
        if !unit.is_alive() {
            return 0;
        }
        let modifier = self
            .config
            .damage_table
            .modifier(&damage_type, &unit.defense_type());
        let resolved = resolve_damage(amount, modifier);
        let absorbed = self.buffs.absorb(target, resolved);

        let Some(unit) = self.roster.get_mut(target) else {
            return 0;
        };
        let hp = (unit.hp() - (resolved - absorbed)).max(0);
        unit.set_hp(hp);
        let alive = unit.is_alive();

        self.emit(BattleEvent::DamageDealt {
            target,
            amount: resolved,
            absorbed,
            damage_type,
        });
        if !alive {
            self.mark_defeated(target);
        }
        resolved
    }

    /// Restore up to `amount` hp on `target`, capped at max hp.
    ///
    /// Returns the hp actually restored. Dead or unknown targets are ignored.
    pub fn heal(&mut self, target: CombatantId, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let Some(unit) = self.roster.get_mut(target) else {
            return 0;
        };
        if !unit.is_alive() {
            return 0;
        }
        let before = unit.hp();
        let after = before.saturating_add(amount).min(unit.max_hp()).max(before);
        unit.set_hp(after);
        let restored = after - before;
        self.emit(BattleEvent::Healed {
            target,
            amount: restored,
        });
        restored
    }

    /// Apply a status to a living combatant.
    pub fn apply_status(
        &mut self,
        target: CombatantId,
        kind: StatusKind,
        duration: u32,
    ) -> Option<StatusInstance> {
        if !self.roster.is_alive(target) {
            return None;
        }
        let inst = self.statuses.apply(target, kind, duration)?;
        self.emit_status_applied(target, &inst);
        Some(inst)
    }

    /// Apply a buff to a living combatant. For shields `magnitude` is the pool.
    pub fn apply_buff(
        &mut self,
        target: CombatantId,
        kind: BuffKind,
        duration: u32,
        magnitude: i32,
    ) -> Option<BuffInstance> {
        if !self.roster.is_alive(target) {
            return None;
        }
        let inst = self.buffs.apply(target, kind, duration, magnitude)?;
        self.emit_buff_applied(target, &inst);
        Some(inst)
    }

    /// Settle the battle. Only the first terminal result is kept; returns
    /// whether this call set it.
    pub fn end_battle(&mut self, result: BattleResult) -> bool {
        if self.result.is_terminal() || !result.is_terminal() {
            return false;
        }
        self.result = result;
        tracing::info!(round = self.round, result = %result, "battle ended");
        self.emit(BattleEvent::BattleEnded { result });
        true
    }

    /// Friends are checked first, so two empty sides mean defeat.
    fn check_victory(&mut self) -> bool {
        if self.result.is_terminal() {
            return true;
        }
        if self.roster.alive_on(Team::Friends).is_empty() {
            self.end_battle(BattleResult::Defeat);
        } else if self.roster.alive_on(Team::Foes).is_empty() {
            self.end_battle(BattleResult::Victory);
        }
        self.result.is_terminal()
    }

    fn mark_defeated(&mut self, id: CombatantId) {
        self.statuses.clear(id);
        self.buffs.clear(id);
        tracing::debug!(round = self.round, id = %id, "combatant defeated");
        self.emit(BattleEvent::CombatantDefeated { id });
    }

    fn emit_status_applied(&mut self, target: CombatantId, inst: &StatusInstance) {
        self.emit(BattleEvent::StatusApplied {
            target,
            status: inst.kind.clone(),
            remaining: inst.remaining,
        });
    }

    fn emit_buff_applied(&mut self, target: CombatantId, inst: &BuffInstance) {
        self.emit(BattleEvent::BuffApplied {
            target,
            buff: inst.kind.clone(),
            remaining: inst.remaining,
        });
    }

    fn emit(&mut self, event: BattleEvent) {
        self.publisher.publish(&event);
    }

    /// Living ids on the side opposing `actor`, in join order.
    pub fn enemies_of(&self, actor: CombatantId) -> Vec<CombatantId> {
        self.roster
            .team_of(actor)
            .map(|team| self.roster.alive_on(team.opponent()))
            .unwrap_or_default()
    }

    /// Living ids on `actor`'s side, excluding `actor`, in join order.
    pub fn allies_of(&self, actor: CombatantId) -> Vec<CombatantId> {
        let Some(team) = self.roster.team_of(actor) else {
            return Vec::new();
        };
        let mut allies = self.roster.alive_on(team);
        allies.retain(|&id| id != actor);
        allies
    }

    /// Look up a combatant.
    pub fn combatant(&self, id: CombatantId) -> Option<&C> {
        self.roster.get(id)
    }

    /// Look up a combatant, failing if the id is not enlisted.
    pub fn try_combatant(&self, id: CombatantId) -> CombatResult<&C> {
        self.roster.get(id).ok_or(CombatError::UnknownCombatant(id))
    }

    /// All enlisted combatants.
    pub fn roster(&self) -> &Roster<C> {
        &self.roster
    }

    /// Give back the combatants in join order.
    pub fn into_combatants(self) -> Vec<C> {
        self.roster.into_inner()
    }

    /// Current round number (0 before the battle starts).
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Current result.
    pub fn result(&self) -> BattleResult {
        self.result
    }

    /// True once a terminal result is set.
    pub fn is_over(&self) -> bool {
        self.result.is_terminal()
    }

    /// Active statuses.
    pub fn statuses(&self) -> &StatusRegistry {
        &self.statuses
    }

    /// Active buffs.
    pub fn buffs(&self) -> &BuffRegistry {
        &self.buffs
    }

    /// The scheduler as left by the latest round.
    pub fn scheduler(&self) -> &InitiativeScheduler {
        &self.scheduler
    }

    /// Event deliveries that failed so far.
    pub fn subscriber_failures(&self) -> u64 {
        self.publisher.failures()
    }

    /// The battle's configuration.
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }
}

fn validate<C: Combatant>(combatant: &C) -> CombatResult<()> {
    let reason = if combatant.name().trim().is_empty() {
        "name is empty"
    } else if combatant.max_hp() <= 0 {
        "max hp must be positive"
    } else {
        return Ok(());
    };
    Err(CombatError::InvalidCombatant {
        name: combatant.name().to_string(),
        reason: reason.to_string(),
    })
}
