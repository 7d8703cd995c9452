use crate::battle::Battle;
use crate::buff::{BuffInstance, BuffKind};
use crate::combatant::{Combatant, CombatantId};
use crate::damage::DamageType;
use crate::status::{StatusInstance, StatusKind};

/// What a turn action can see and do during its turn.
pub struct BattleContext<'a, C> {
    battle: &'a mut Battle<C>,
    actor: CombatantId,
}

impl<'a, C: Combatant> BattleContext<'a, C> {
    pub(crate) fn new(battle: &'a mut Battle<C>, actor: CombatantId) -> Self {
        Self { battle, actor }
    }

    /// The combatant whose turn it is.
    pub fn actor(&self) -> CombatantId {
        self.actor
    }

    /// Living opponents of `actor`, in join order.
    pub fn get_enemies(&self, actor: CombatantId) -> Vec<CombatantId> {
        self.battle.enemies_of(actor)
    }

    /// Living teammates of `actor` (not `actor` itself), in join order.
    pub fn get_allies(&self, actor: CombatantId) -> Vec<CombatantId> {
        self.battle.allies_of(actor)
    }

    /// Look up a combatant.
    pub fn combatant(&self, id: CombatantId) -> Option<&C> {
        self.battle.combatant(id)
    }

    /// See [`Battle::damage`].
    pub fn damage(&mut self, target: CombatantId, amount: i32, damage_type: DamageType) -> i32 {
        self.battle.damage(target, amount, damage_type)
    }

    /// See [`Battle::heal`].
    pub fn heal(&mut self, target: CombatantId, amount: i32) -> i32 {
        self.battle.heal(target, amount)
    }

    /// See [`Battle::apply_status`].
    pub fn apply_status(
        &mut self,
        target: CombatantId,
        kind: StatusKind,
        duration: u32,
    ) -> Option<StatusInstance> {
        self.battle.apply_status(target, kind, duration)
    }

    /// See [`Battle::apply_buff`].
    pub fn apply_buff(
        &mut self,
        target: CombatantId,
        kind: BuffKind,
        duration: u32,
        magnitude: i32,
    ) -> Option<BuffInstance> {
        self.battle.apply_buff(target, kind, duration, magnitude)
    }

    /// Whether an active status stops `id` from using actions.
    pub fn blocks_actions(&self, id: CombatantId) -> bool {
        self.battle.statuses().blocks_actions(id)
    }

    /// Current round number.
    pub fn round(&self) -> u32 {
        self.battle.round()
    }

    /// True once the battle has a terminal result.
    ///
    /// The result is settled after the action returns, so this only turns
    /// true for results set before the turn began.
    pub fn is_over(&self) -> bool {
        self.battle.is_over()
    }
}
