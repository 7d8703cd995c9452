//! Turn actions: what a combatant does when handed its turn.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::battle::BattleContext;
use crate::combatant::{Combatant, CombatantId};

/// Invoked once per dispatched turn.
pub trait TurnAction<C> {
    /// Act for `actor`. The return value is not consulted.
    fn take_turn(&mut self, actor: CombatantId, ctx: &mut BattleContext<'_, C>);
}

impl<C, F> TurnAction<C> for F
where
    F: FnMut(CombatantId, &mut BattleContext<'_, C>),
{
    fn take_turn(&mut self, actor: CombatantId, ctx: &mut BattleContext<'_, C>) {
        self(actor, ctx)
    }
}

/// Strike the first living enemy in join order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAttack;

impl<C: Combatant> TurnAction<C> for BasicAttack {
    fn take_turn(&mut self, actor: CombatantId, ctx: &mut BattleContext<'_, C>) {
        if ctx.blocks_actions(actor) {
            tracing::debug!(actor = %actor, "actions blocked");
            return;
        }
        if let Some(&target) = ctx.get_enemies(actor).first() {
            strike(ctx, actor, target);
        }
    }
}

/// Strike a uniformly chosen living enemy. Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct RandomTarget {
    rng: StdRng,
}

impl RandomTarget {
    /// Create with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<C: Combatant> TurnAction<C> for RandomTarget {
    fn take_turn(&mut self, actor: CombatantId, ctx: &mut BattleContext<'_, C>) {
        if ctx.blocks_actions(actor) {
            tracing::debug!(actor = %actor, "actions blocked");
            return;
        }
        let enemies = ctx.get_enemies(actor);
        if enemies.is_empty() {
            return;
        }
        let target = enemies[self.rng.random_range(0..enemies.len())];
        strike(ctx, actor, target);
    }
}

/// `attack - defense` (never negative) of the actor's attack type.
fn strike<C: Combatant>(ctx: &mut BattleContext<'_, C>, actor: CombatantId, target: CombatantId) {
    let (Some(attacker), Some(defender)) = (ctx.combatant(actor), ctx.combatant(target)) else {
        return;
    };
    let raw = (attacker.attack() - defender.defense()).max(0);
    let damage_type = attacker.attack_type();
    ctx.damage(target, raw, damage_type);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{Battle, BattleResult};
    use crate::combatant::{StatBlock, Team, Unit};
    use crate::config::BattleConfig;
    use crate::damage::DamageType;
    use crate::event::SharedEventLog;
    use crate::status::StatusKind;

    fn duel(friend: Unit, foe: Unit) -> (Battle<Unit>, CombatantId, CombatantId) {
        let mut battle = Battle::new(BattleConfig::default().with_max_rounds(1));
        let a = battle.enlist(friend).unwrap();
        let b = battle.enlist(foe).unwrap();
        (battle, a, b)
    }

    #[test]
    fn basic_attack_subtracts_defense() {
        let (mut battle, _, b) = duel(
            Unit::new("Knight", Team::Friends, StatBlock::new(30, 5, 7, 0)),
            Unit::new("Imp", Team::Foes, StatBlock::new(30, 1, 0, 3)),
        );
        battle.fight(&mut BasicAttack).unwrap();
        assert_eq!(battle.combatant(b).unwrap().hp(), 26);
    }

    #[test]
    fn basic_attack_floors_to_one_only_when_positive() {
        let (mut battle, a, b) = duel(
            Unit::new("Squire", Team::Friends, StatBlock::new(30, 5, 2, 10)),
            Unit::new("Wall", Team::Foes, StatBlock::new(30, 1, 1, 10)),
        );
        battle.fight(&mut BasicAttack).unwrap();
        // Both strikes come out at zero raw damage.
        assert_eq!(battle.combatant(a).unwrap().hp(), 30);
        assert_eq!(battle.combatant(b).unwrap().hp(), 30);
    }

    #[test]
    fn basic_attack_uses_attack_type() {
        let (mut battle, _, b) = duel(
            Unit::new("Cleric", Team::Friends, StatBlock::new(30, 5, 4, 0))
                .with_attack_type(DamageType::Holy),
            Unit::new("Imp", Team::Foes, StatBlock::new(30, 1, 0, 0))
                .with_defense_type(DamageType::Infernal),
        );
        let log = SharedEventLog::new(0);
        battle.subscribe(log.clone());
        battle.fight(&mut BasicAttack).unwrap();
        assert_eq!(battle.combatant(b).unwrap().hp(), 25);
    }

    #[test]
    fn blocked_actor_does_nothing() {
        let (mut battle, a, b) = duel(
            Unit::new("Mage", Team::Friends, StatBlock::new(30, 5, 9, 0))
                .with_starting_status(StatusKind::Channeling),
            Unit::new("Imp", Team::Foes, StatBlock::new(30, 1, 2, 0)),
        );
        let result = battle.fight(&mut BasicAttack).unwrap();
        assert_eq!(result, BattleResult::Ongoing);
        assert_eq!(battle.combatant(b).unwrap().hp(), 30);
        assert_eq!(battle.combatant(a).unwrap().hp(), 28);
    }

    #[test]
    fn random_target_is_seeded() {
        let run = |seed: u64| -> Vec<i32> {
            let mut battle = Battle::new(BattleConfig::default().with_max_rounds(3));
            battle
                .enlist(Unit::new("Archer", Team::Friends, StatBlock::new(50, 9, 2, 0)))
                .unwrap();
            for name in ["A", "B", "C", "D"] {
                battle
                    .enlist(Unit::new(name, Team::Foes, StatBlock::new(50, 1, 0, 0)))
                    .unwrap();
            }
            battle.fight(&mut RandomTarget::new(seed)).unwrap();
            battle
                .into_combatants()
                .iter()
                .map(|u| u.hp())
                .collect()
        };
        assert_eq!(run(7), run(7));
        let total_lost: i32 = run(7).iter().skip(1).map(|hp| 50 - hp).sum();
        assert_eq!(total_lost, 6);
    }

    #[test]
    fn closures_are_actions() {
        let (mut battle, a, b) = duel(
            Unit::new("Healer", Team::Friends, StatBlock::new(30, 5, 1, 0)).with_hp(10),
            Unit::new("Imp", Team::Foes, StatBlock::new(30, 1, 1, 0)),
        );
        let mut action = |actor: CombatantId, ctx: &mut BattleContext<'_, Unit>| {
            if ctx.get_enemies(actor).contains(&b) {
                ctx.heal(actor, 5);
            }
        };
        battle.fight(&mut action).unwrap();
        assert_eq!(battle.combatant(a).unwrap().hp(), 15);
    }
}
