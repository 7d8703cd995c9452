//! Buff effects: periodic hp changes and shield pools.
//!
//! Buffs share the status lifecycle (one instance per kind, refresh on
//! reapply, decrement at round end) but change numbers instead of turn
//! eligibility. Damage-over-time and heal-over-time resolve only at round
//! end. Shield pools are drained by incoming damage.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantId};
use crate::damage::DamageType;
use crate::roster::Roster;

/// Identifies a buff. Unrecognized names are kept as `Custom` and have no
/// effect unless a definition is registered for them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuffKind {
    /// Infernal damage over time.
    Poison,
    /// Physical damage over time.
    Bleed,
    /// Holy heal over time.
    Regen,
    /// Absorbs incoming damage.
    Shield,
    /// A user-defined buff.
    Custom(String),
}

impl From<&str> for BuffKind {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "poison" => Self::Poison,
            "bleed" => Self::Bleed,
            "regen" => Self::Regen,
            "shield" => Self::Shield,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl From<String> for BuffKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<BuffKind> for String {
    fn from(kind: BuffKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for BuffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poison => write!(f, "Poison"),
            Self::Bleed => write!(f, "Bleed"),
            Self::Regen => write!(f, "Regen"),
            Self::Shield => write!(f, "Shield"),
            Self::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// What a buff does each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffEffect {
    /// Lose `magnitude` hp at round end.
    DamageOverTime,
    /// Gain `magnitude` hp at round end, capped at max hp.
    HealOverTime,
    /// Absorb incoming damage from a pool.
    Shield,
    /// No numeric effect.
    #[default]
    Inert,
}

impl fmt::Display for BuffEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DamageOverTime => write!(f, "DOT"),
            Self::HealOverTime => write!(f, "HOT"),
            Self::Shield => write!(f, "Shield"),
            Self::Inert => write!(f, "-"),
        }
    }
}

/// Data describing how a buff behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffDefinition {
    /// Which buff this defines.
    pub kind: BuffKind,
    /// Flavor type of the effect.
    #[serde(default)]
    pub damage_type: DamageType,
    /// Round-end behavior.
    #[serde(default)]
    pub effect: BuffEffect,
    /// Per-round hp change used when no explicit magnitude is given.
    #[serde(default)]
    pub base_magnitude: i32,
    /// Duration used when no explicit duration is given.
    #[serde(default = "default_duration")]
    pub base_duration: u32,
    /// Stack cap; `None` means unbounded.
    #[serde(default)]
    pub max_stacks: Option<u32>,
    /// Starting pool for shields applied without an explicit magnitude.
    #[serde(default)]
    pub shield_amount: i32,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_duration() -> u32 {
    1
}

impl BuffDefinition {
    /// An inert definition lasting one round.
    pub fn new(kind: BuffKind, effect: BuffEffect) -> Self {
        Self {
            kind,
            damage_type: DamageType::Physical,
            effect,
            base_magnitude: 0,
            base_duration: 1,
            max_stacks: None,
            shield_amount: 0,
            tags: Vec::new(),
        }
    }

    /// The stock buff set.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self {
                damage_type: DamageType::Infernal,
                base_magnitude: 4,
                base_duration: 3,
                tags: vec!["DOT".into(), "Poison".into()],
                ..Self::new(BuffKind::Poison, BuffEffect::DamageOverTime)
            },
            Self {
                base_magnitude: 3,
                base_duration: 2,
                tags: vec!["DOT".into(), "Bleed".into()],
                ..Self::new(BuffKind::Bleed, BuffEffect::DamageOverTime)
            },
            Self {
                damage_type: DamageType::Holy,
                base_magnitude: 2,
                base_duration: 3,
                tags: vec!["HOT".into(), "Regen".into()],
                ..Self::new(BuffKind::Regen, BuffEffect::HealOverTime)
            },
            Self {
                damage_type: DamageType::Holy,
                base_duration: 3,
                shield_amount: 10,
                tags: vec!["Buff".into(), "Shield".into()],
                ..Self::new(BuffKind::Shield, BuffEffect::Shield)
            },
        ]
    }
}

/// A buff attached to one combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuffInstance {
    /// Which buff this is.
    pub kind: BuffKind,
    /// Rounds left; removed when this reaches zero.
    pub remaining: u32,
    /// How many times it has been applied, up to the definition's cap.
    pub stacks: u32,
    /// Per-round hp change for DOT/HOT.
    pub magnitude: i32,
    /// Round-end behavior, copied from the definition.
    pub effect: BuffEffect,
    /// Flavor type, copied from the definition.
    pub damage_type: DamageType,
    /// Damage left to absorb. Only meaningful for shields.
    pub shield_pool: i32,
}

impl BuffInstance {
    /// Damage over time.
    pub fn is_dot(&self) -> bool {
        self.effect == BuffEffect::DamageOverTime
    }

    /// Heal over time.
    pub fn is_hot(&self) -> bool {
        self.effect == BuffEffect::HealOverTime
    }

    /// Damage-absorbing shield.
    pub fn is_shield(&self) -> bool {
        self.effect == BuffEffect::Shield
    }
}

/// One numeric change made by a round-end tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuffTick {
    /// Who was affected.
    pub target: CombatantId,
    /// Which buff caused it.
    pub kind: BuffKind,
    /// Signed hp change actually applied (negative for damage).
    pub delta: i32,
    /// Hit points after the change.
    pub hp_after: i32,
}

/// Everything a round-end tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuffRoundReport {
    /// Numeric changes, in application order.
    pub ticks: Vec<BuffTick>,
    /// Buffs that ran out this round.
    pub expired: Vec<(CombatantId, BuffKind)>,
}

/// Tracks active buffs for every combatant in one battle.
#[derive(Debug, Clone)]
pub struct BuffRegistry {
    definitions: BTreeMap<BuffKind, BuffDefinition>,
    active: BTreeMap<CombatantId, Vec<BuffInstance>>,
}

impl Default for BuffRegistry {
    fn default() -> Self {
        Self::with_definitions(BuffDefinition::builtin())
    }
}

impl BuffRegistry {
    /// A registry that knows only the given definitions.
    pub fn with_definitions(definitions: impl IntoIterator<Item = BuffDefinition>) -> Self {
        let mut registry = Self {
            definitions: BTreeMap::new(),
            active: BTreeMap::new(),
        };
        for def in definitions {
            registry.define(def);
        }
        registry
    }

    /// Add or replace a definition.
    pub fn define(&mut self, definition: BuffDefinition) {
        self.definitions.insert(definition.kind.clone(), definition);
    }

    /// Look up a definition.
    pub fn definition(&self, kind: &BuffKind) -> Option<&BuffDefinition> {
        self.definitions.get(kind)
    }

    /// All known definitions, ordered by kind.
    pub fn definitions(&self) -> impl Iterator<Item = &BuffDefinition> {
        self.definitions.values()
    }

    /// Apply a buff for `duration` rounds with the given magnitude.
    ///
    /// For shields `magnitude` is the pool size. Reapplying refreshes the
    /// duration, magnitude and pool to the larger of old and new.
    pub fn apply(
        &mut self,
        target: CombatantId,
        kind: BuffKind,
        duration: u32,
        magnitude: i32,
    ) -> Option<BuffInstance> {
        let def = self
            .definitions
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| BuffDefinition::new(kind.clone(), BuffEffect::Inert));
        let list = self.active.entry(target).or_default();

        if let Some(existing) = list.iter_mut().find(|b| b.kind == kind) {
            existing.remaining = existing.remaining.max(duration);
            existing.magnitude = existing.magnitude.max(magnitude);
            if existing.is_shield() {
                existing.shield_pool = existing.shield_pool.max(magnitude);
            }
            existing.stacks = match def.max_stacks {
                Some(cap) => (existing.stacks + 1).min(cap.max(1)),
                None => existing.stacks + 1,
            };
            return Some(existing.clone());
        }

        if duration == 0 {
            return None;
        }
        let instance = BuffInstance {
            kind,
            remaining: duration,
            stacks: 1,
            magnitude,
            effect: def.effect,
            damage_type: def.damage_type,
            shield_pool: if def.effect == BuffEffect::Shield {
                magnitude.max(0)
            } else {
                0
            },
        };
        list.push(instance.clone());
        Some(instance)
    }

    /// Apply a buff with its definition's base duration and magnitude
    /// (shield amount for shields). Unknown kinds get one inert round.
    pub fn apply_default(&mut self, target: CombatantId, kind: BuffKind) -> Option<BuffInstance> {
        let (duration, magnitude) = match self.definitions.get(&kind) {
            Some(def) if def.effect == BuffEffect::Shield => (def.base_duration, def.shield_amount),
            Some(def) => (def.base_duration, def.base_magnitude),
            None => (1, 0),
        };
        self.apply(target, kind, duration, magnitude)
    }

    /// The instance of `kind` on `target`, if active.
    pub fn get(&self, target: CombatantId, kind: &BuffKind) -> Option<&BuffInstance> {
        self.instances(target).iter().find(|b| &b.kind == kind)
    }

    /// Kinds currently active on `target`, in application order.
    pub fn list_active(&self, target: CombatantId) -> Vec<BuffKind> {
        self.instances(target).iter().map(|b| b.kind.clone()).collect()
    }

    /// Active instances on `target`.
    pub fn instances(&self, target: CombatantId) -> &[BuffInstance] {
        self.active.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total unabsorbed shield pool on `target`.
    pub fn shield_pool(&self, target: CombatantId) -> i32 {
        self.instances(target)
            .iter()
            .filter(|b| b.is_shield())
            .map(|b| b.shield_pool)
            .sum()
    }

    /// Drain shield pools on `target` by up to `damage`.
    ///
    /// Shields are drained in application order; an emptied shield is
    /// removed. Returns how much damage was absorbed.
    pub fn absorb(&mut self, target: CombatantId, damage: i32) -> i32 {
        if damage <= 0 {
            return 0;
        }
        let Some(list) = self.active.get_mut(&target) else {
            return 0;
        };
        let mut left = damage;
        for buff in list.iter_mut().filter(|b| b.is_shield()) {
            if left == 0 {
                break;
            }
            let taken = buff.shield_pool.min(left);
            buff.shield_pool -= taken;
            left -= taken;
        }
        list.retain(|b| !b.is_shield() || b.shield_pool > 0);
        damage - left
    }

    /// Remove one buff. Returns true if it was active.
    pub fn remove(&mut self, target: CombatantId, kind: &BuffKind) -> bool {
        let Some(list) = self.active.get_mut(&target) else {
            return false;
        };
        let before = list.len();
        list.retain(|b| &b.kind != kind);
        before != list.len()
    }

    /// Remove every buff from `target`.
    pub fn clear(&mut self, target: CombatantId) {
        self.active.remove(&target);
    }

    /// Resolve one round boundary.
    ///
    /// Living targets take their DOT/HOT changes, then every instance is
    /// decremented and the ones at zero are dropped. Targets are
    /// independent of each other.
    pub fn on_round_end<C: Combatant>(&mut self, roster: &mut Roster<C>) -> BuffRoundReport {
        let mut report = BuffRoundReport::default();
        for (id, list) in &mut self.active {
            if let Some(unit) = roster.get_mut(*id) {
                for buff in list.iter() {
                    if !unit.is_alive() {
                        break;
                    }
                    let before = unit.hp();
                    let after = match buff.effect {
                        BuffEffect::DamageOverTime => {
                            before.saturating_sub(buff.magnitude.max(0)).max(0)
                        }
                        BuffEffect::HealOverTime => before
                            .saturating_add(buff.magnitude.max(0))
                            .min(unit.max_hp())
                            .max(before),
                        BuffEffect::Shield | BuffEffect::Inert => continue,
                    };
                    unit.set_hp(after);
                    report.ticks.push(BuffTick {
                        target: *id,
                        kind: buff.kind.clone(),
                        delta: after - before,
                        hp_after: after,
                    });
                }
            }
            for buff in list.iter_mut() {
                buff.remaining = buff.remaining.saturating_sub(1);
                if buff.remaining == 0 {
                    report.expired.push((*id, buff.kind.clone()));
                }
            }
            list.retain(|b| b.remaining > 0);
        }
        self.active.retain(|_, list| !list.is_empty());
        report
    }
}
