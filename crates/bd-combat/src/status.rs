//! Status effects: transient flags that control turn eligibility.
//!
//! Each combatant holds at most one instance per [`StatusKind`]. Reapplying
//! refreshes the remaining duration to the larger of the two values; it
//! never sums them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combatant::CombatantId;

/// Identifies a status. Unrecognized names are kept as `Custom` and have no
/// built-in behavior.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusKind {
    /// Loses turns while active.
    Stunned,
    /// Braced for incoming blows.
    Guarded,
    /// Singled out as a target.
    Marked,
    /// Busy maintaining an effect; cannot use actions.
    Channeling,
    /// A user-defined status.
    Custom(String),
}

impl From<&str> for StatusKind {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "stunned" => Self::Stunned,
            "guarded" => Self::Guarded,
            "marked" => Self::Marked,
            "channeling" => Self::Channeling,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl From<String> for StatusKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<StatusKind> for String {
    fn from(kind: StatusKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stunned => write!(f, "Stunned"),
            Self::Guarded => write!(f, "Guarded"),
            Self::Marked => write!(f, "Marked"),
            Self::Channeling => write!(f, "Channeling"),
            Self::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// Data describing how a status behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDefinition {
    /// Which status this defines.
    pub kind: StatusKind,
    /// Whether holders lose their turn.
    #[serde(default)]
    pub blocks_turn: bool,
    /// Whether holders may not use actions on their turn.
    #[serde(default)]
    pub blocks_actions: bool,
    /// Whether the status is relevant to initiative.
    #[serde(default)]
    pub affects_order: bool,
    /// Duration used when no explicit duration is given.
    #[serde(default = "default_duration")]
    pub base_duration: u32,
    /// Stack cap; `None` means unbounded.
    #[serde(default)]
    pub max_stacks: Option<u32>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_duration() -> u32 {
    1
}

impl StatusDefinition {
    /// A definition with no flags, lasting one round, stacking once.
    pub fn new(kind: StatusKind) -> Self {
        Self {
            kind,
            blocks_turn: false,
            blocks_actions: false,
            affects_order: false,
            base_duration: 1,
            max_stacks: Some(1),
            tags: Vec::new(),
        }
    }

    /// The stock status set.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self {
                blocks_turn: true,
                blocks_actions: true,
                affects_order: true,
                tags: vec!["Control".into(), "Stun".into()],
                ..Self::new(StatusKind::Stunned)
            },
            Self {
                base_duration: 2,
                tags: vec!["Guard".into()],
                ..Self::new(StatusKind::Guarded)
            },
            Self {
                base_duration: 3,
                tags: vec!["Debuff".into(), "Marked".into()],
                ..Self::new(StatusKind::Marked)
            },
            Self {
                blocks_actions: true,
                base_duration: 2,
                tags: vec!["State".into(), "Channeling".into()],
                ..Self::new(StatusKind::Channeling)
            },
        ]
    }
}

/// A status attached to one combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusInstance {
    /// Which status this is.
    pub kind: StatusKind,
    /// Rounds left; removed when this reaches zero.
    pub remaining: u32,
    /// How many times it has been applied, up to the definition's cap.
    pub stacks: u32,
    /// Copied from the definition at creation.
    pub blocks_turn: bool,
    /// Copied from the definition at creation.
    pub blocks_actions: bool,
    /// Copied from the definition at creation.
    pub affects_order: bool,
}

/// Tracks active statuses for every combatant in one battle.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    definitions: BTreeMap<StatusKind, StatusDefinition>,
    active: BTreeMap<CombatantId, Vec<StatusInstance>>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::with_definitions(StatusDefinition::builtin())
    }
}

impl StatusRegistry {
    /// A registry that knows only the given definitions.
    pub fn with_definitions(definitions: impl IntoIterator<Item = StatusDefinition>) -> Self {
        let mut registry = Self {
            definitions: BTreeMap::new(),
            active: BTreeMap::new(),
        };
        for def in definitions {
            registry.define(def);
        }
        registry
    }

    /// Add or replace a definition. Existing instances keep their flags.
    pub fn define(&mut self, definition: StatusDefinition) {
        self.definitions.insert(definition.kind.clone(), definition);
    }

    /// Look up a definition.
    pub fn definition(&self, kind: &StatusKind) -> Option<&StatusDefinition> {
        self.definitions.get(kind)
    }

    /// All known definitions, ordered by kind.
    pub fn definitions(&self) -> impl Iterator<Item = &StatusDefinition> {
        self.definitions.values()
    }

    /// Apply a status for `duration` rounds.
    ///
    /// An existing instance is refreshed to `max(remaining, duration)`.
    /// A zero duration never creates an instance. Returns the resulting
    /// instance, if any.
    pub fn apply(
        &mut self,
        target: CombatantId,
        kind: StatusKind,
        duration: u32,
    ) -> Option<StatusInstance> {
        let def = self
            .definitions
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| StatusDefinition::new(kind.clone()));
        let list = self.active.entry(target).or_default();

        if let Some(existing) = list.iter_mut().find(|s| s.kind == kind) {
            existing.remaining = existing.remaining.max(duration);
            existing.stacks = match def.max_stacks {
                Some(cap) => (existing.stacks + 1).min(cap.max(1)),
                None => existing.stacks + 1,
            };
            return Some(existing.clone());
        }

        if duration == 0 {
            return None;
        }
        let instance = StatusInstance {
            kind,
            remaining: duration,
            stacks: 1,
            blocks_turn: def.blocks_turn,
            blocks_actions: def.blocks_actions,
            affects_order: def.affects_order,
        };
        list.push(instance.clone());
        Some(instance)
    }

    /// Apply a status using its definition's base duration (1 if unknown).
    pub fn apply_default(&mut self, target: CombatantId, kind: StatusKind) -> Option<StatusInstance> {
        let duration = self
            .definitions
            .get(&kind)
            .map_or(1, |d| d.base_duration);
        self.apply(target, kind, duration)
    }

    /// True iff an active instance on `target` blocks its turn.
    pub fn blocks_turn(&self, target: CombatantId) -> bool {
        self.instances(target)
            .iter()
            .any(|s| s.blocks_turn && s.remaining > 0)
    }

    /// True iff an active instance on `target` forbids using actions.
    pub fn blocks_actions(&self, target: CombatantId) -> bool {
        self.instances(target)
            .iter()
            .any(|s| s.blocks_actions && s.remaining > 0)
    }

    /// The instance of `kind` on `target`, if active.
    pub fn get(&self, target: CombatantId, kind: &StatusKind) -> Option<&StatusInstance> {
        self.instances(target).iter().find(|s| &s.kind == kind)
    }

    /// Rounds left for `kind` on `target`.
    pub fn remaining(&self, target: CombatantId, kind: &StatusKind) -> Option<u32> {
        self.get(target, kind).map(|s| s.remaining)
    }

    /// Kinds currently active on `target`, in application order.
    pub fn list_active(&self, target: CombatantId) -> Vec<StatusKind> {
        self.instances(target).iter().map(|s| s.kind.clone()).collect()
    }

    /// Active instances on `target`.
    pub fn instances(&self, target: CombatantId) -> &[StatusInstance] {
        self.active.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove one status. Returns true if it was active.
    pub fn remove(&mut self, target: CombatantId, kind: &StatusKind) -> bool {
        let Some(list) = self.active.get_mut(&target) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| &s.kind != kind);
        before != list.len()
    }

    /// Remove every status from `target`.
    pub fn clear(&mut self, target: CombatantId) {
        self.active.remove(&target);
    }

    /// Decrement every instance by one round and drop the ones that hit zero.
    ///
    /// Targets are independent, so the result does not depend on visit
    /// order. Returns the expired `(target, kind)` pairs.
    pub fn on_round_end(&mut self) -> Vec<(CombatantId, StatusKind)> {
        let mut expired = Vec::new();
        for (id, list) in &mut self.active {
            for status in list.iter_mut() {
                status.remaining = status.remaining.saturating_sub(1);
                if status.remaining == 0 {
                    expired.push((*id, status.kind.clone()));
                }
            }
            list.retain(|s| s.remaining > 0);
        }
        self.active.retain(|_, list| !list.is_empty());
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: CombatantId = CombatantId(0);
    const B: CombatantId = CombatantId(1);

    #[test]
    fn stun_blocks_for_one_round() {
        let mut reg = StatusRegistry::default();
        reg.apply(A, StatusKind::Stunned, 1);
        assert!(reg.blocks_turn(A));
        assert!(!reg.blocks_turn(B));

        let expired = reg.on_round_end();
        assert_eq!(expired, vec![(A, StatusKind::Stunned)]);
        assert!(!reg.blocks_turn(A));
        assert!(reg.list_active(A).is_empty());
    }

    #[test]
    fn reapply_takes_max_not_sum() {
        let mut reg = StatusRegistry::default();
        reg.apply(A, StatusKind::Marked, 3);
        reg.on_round_end();
        reg.apply(A, StatusKind::Marked, 2);
        assert_eq!(reg.remaining(A, &StatusKind::Marked), Some(2));
        assert_eq!(reg.instances(A).len(), 1);

        reg.apply(A, StatusKind::Marked, 5);
        assert_eq!(reg.remaining(A, &StatusKind::Marked), Some(5));
    }

    #[test]
    fn stacks_respect_cap() {
        let mut reg = StatusRegistry::with_definitions(vec![StatusDefinition {
            max_stacks: Some(2),
            ..StatusDefinition::new(StatusKind::Marked)
        }]);
        for _ in 0..4 {
            reg.apply(A, StatusKind::Marked, 1);
        }
        assert_eq!(reg.get(A, &StatusKind::Marked).unwrap().stacks, 2);
    }

    #[test]
    fn unknown_kind_is_inert() {
        let mut reg = StatusRegistry::default();
        let kind = StatusKind::from("Dazed");
        let inst = reg.apply(A, kind.clone(), 2).unwrap();
        assert!(!inst.blocks_turn);
        assert!(!reg.blocks_turn(A));
        assert_eq!(reg.list_active(A), vec![kind]);
    }

    #[test]
    fn zero_duration_does_not_create() {
        let mut reg = StatusRegistry::default();
        assert!(reg.apply(A, StatusKind::Stunned, 0).is_none());
        assert!(!reg.blocks_turn(A));
    }

    #[test]
    fn apply_default_uses_base_duration() {
        let mut reg = StatusRegistry::default();
        reg.apply_default(A, StatusKind::Marked);
        assert_eq!(reg.remaining(A, &StatusKind::Marked), Some(3));
        reg.apply_default(B, StatusKind::from("Dazed"));
        assert_eq!(reg.remaining(B, &StatusKind::from("Dazed")), Some(1));
    }

    #[test]
    fn channeling_blocks_actions_not_turn() {
        let mut reg = StatusRegistry::default();
        reg.apply_default(A, StatusKind::Channeling);
        assert!(!reg.blocks_turn(A));
        assert!(reg.blocks_actions(A));
    }

    #[test]
    fn round_end_is_per_target() {
        let mut reg = StatusRegistry::default();
        reg.apply(A, StatusKind::Guarded, 2);
        reg.apply(B, StatusKind::Guarded, 1);
        let expired = reg.on_round_end();
        assert_eq!(expired, vec![(B, StatusKind::Guarded)]);
        assert_eq!(reg.remaining(A, &StatusKind::Guarded), Some(1));
    }

    #[test]
    fn remove_and_clear() {
        let mut reg = StatusRegistry::default();
        reg.apply(A, StatusKind::Guarded, 2);
        reg.apply(A, StatusKind::Marked, 2);
        assert!(reg.remove(A, &StatusKind::Guarded));
        assert!(!reg.remove(A, &StatusKind::Guarded));
        assert_eq!(reg.list_active(A), vec![StatusKind::Marked]);
        reg.clear(A);
        assert!(reg.list_active(A).is_empty());
        assert!(!reg.remove(B, &StatusKind::Marked));
    }

    #[test]
    fn definition_deserializes_with_defaults() {
        let def: StatusDefinition =
            serde_json::from_str(r#"{ "kind": "Rooted", "affects_order": true }"#).unwrap();
        assert_eq!(def.kind, StatusKind::Custom("Rooted".into()));
        assert_eq!(def.base_duration, 1);
        assert!(def.affects_order);
        assert!(!def.blocks_turn);
        assert_eq!(def.max_stacks, None);
    }
}
