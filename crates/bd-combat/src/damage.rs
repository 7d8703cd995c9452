//! Damage types, the attack-vs-defense modifier table, and damage rounding.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A damage (or defense) type. Unrecognized names are kept as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DamageType {
    /// Mundane weapons and fists.
    #[default]
    Physical,
    /// Demonic and corrupting sources.
    Infernal,
    /// Divine sources.
    Holy,
    /// A user-defined type.
    Custom(String),
}

impl From<&str> for DamageType {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "physical" => Self::Physical,
            "infernal" => Self::Infernal,
            "holy" => Self::Holy,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl From<String> for DamageType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<DamageType> for String {
    fn from(ty: DamageType) -> Self {
        ty.to_string()
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "Physical"),
            Self::Infernal => write!(f, "Infernal"),
            Self::Holy => write!(f, "Holy"),
            Self::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// Attack type x defense type -> damage multiplier.
///
/// Pairs that are not listed resolve to `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageModifierTable {
    table: BTreeMap<DamageType, BTreeMap<DamageType, f64>>,
}

impl Default for DamageModifierTable {
    fn default() -> Self {
        Self::empty()
            .with_modifier(DamageType::Infernal, DamageType::Holy, 0.75)
            .with_modifier(DamageType::Holy, DamageType::Infernal, 1.25)
    }
}

impl DamageModifierTable {
    /// A table where every pair is neutral.
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with_modifier(mut self, attack: DamageType, defense: DamageType, value: f64) -> Self {
        self.set(attack, defense, value);
        self
    }

    /// Set the multiplier for one pair.
    pub fn set(&mut self, attack: DamageType, defense: DamageType, value: f64) {
        self.table.entry(attack).or_default().insert(defense, value);
    }

    /// Look up the multiplier for a pair.
    pub fn modifier(&self, attack: &DamageType, defense: &DamageType) -> f64 {
        self.table
            .get(attack)
            .and_then(|row| row.get(defense))
            .copied()
            .unwrap_or(1.0)
    }

    /// Overlay every entry of `other` on top of this table.
    pub fn merge(&mut self, other: &DamageModifierTable) {
        for (attack, defense, value) in other.entries() {
            self.set(attack.clone(), defense.clone(), value);
        }
    }

    /// All explicit entries, ordered by attack then defense type.
    pub fn entries(&self) -> impl Iterator<Item = (&DamageType, &DamageType, f64)> {
        self.table
            .iter()
            .flat_map(|(a, row)| row.iter().map(move |(d, v)| (a, d, *v)))
    }
}

/// Scale raw damage by a modifier.
///
/// Rounds half up. Positive raw damage never drops below 1; zero or negative
/// raw damage deals nothing.
pub fn resolve_damage(raw: i32, modifier: f64) -> i32 {
    if raw <= 0 {
        return 0;
    }
    let scaled = (raw as f64 * modifier.max(0.0) + 0.5).floor();
    (scaled as i32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_values() {
        let t = DamageModifierTable::default();
        assert_eq!(t.modifier(&DamageType::Infernal, &DamageType::Holy), 0.75);
        assert_eq!(t.modifier(&DamageType::Holy, &DamageType::Infernal), 1.25);
        assert_eq!(t.modifier(&DamageType::Physical, &DamageType::Holy), 1.0);
    }

    #[test]
    fn unknown_pairs_are_neutral() {
        let t = DamageModifierTable::default();
        let frost = DamageType::from("Frost");
        assert_eq!(t.modifier(&frost, &DamageType::Holy), 1.0);
        assert_eq!(t.modifier(&DamageType::Holy, &frost), 1.0);
        assert_eq!(DamageModifierTable::empty().entries().count(), 0);
    }

    #[test]
    fn set_overrides() {
        let mut t = DamageModifierTable::default();
        t.set(DamageType::Holy, DamageType::Infernal, 2.0);
        assert_eq!(t.modifier(&DamageType::Holy, &DamageType::Infernal), 2.0);
        assert_eq!(t.entries().count(), 2);
    }

    #[test]
    fn merge_overlays_entries() {
        let mut t = DamageModifierTable::default();
        let extra = DamageModifierTable::empty()
            .with_modifier(DamageType::Physical, DamageType::Holy, 0.5)
            .with_modifier(DamageType::Infernal, DamageType::Holy, 1.0);
        t.merge(&extra);
        assert_eq!(t.modifier(&DamageType::Physical, &DamageType::Holy), 0.5);
        assert_eq!(t.modifier(&DamageType::Infernal, &DamageType::Holy), 1.0);
    }

    #[test]
    fn damage_type_parse_is_case_insensitive() {
        assert_eq!(DamageType::from("HOLY"), DamageType::Holy);
        assert_eq!(DamageType::from("infernal"), DamageType::Infernal);
        assert_eq!(
            DamageType::from("Frost"),
            DamageType::Custom("Frost".to_string())
        );
        assert_eq!(DamageType::from("Frost").to_string(), "Frost");
    }

    #[test]
    fn table_deserializes_from_nested_map() {
        let t: DamageModifierTable =
            serde_json::from_str(r#"{ "Holy": { "Infernal": 1.5, "Frost": 0.5 } }"#).unwrap();
        assert_eq!(t.modifier(&DamageType::Holy, &DamageType::Infernal), 1.5);
        assert_eq!(t.modifier(&DamageType::Holy, &DamageType::from("frost")), 1.0);
        assert_eq!(t.modifier(&DamageType::Holy, &DamageType::from("Frost")), 0.5);
    }

    #[test]
    fn resolve_rounds_half_up() {
        assert_eq!(resolve_damage(5, 1.25), 6); // 6.25
        assert_eq!(resolve_damage(6, 0.75), 5); // 4.5
        assert_eq!(resolve_damage(2, 1.25), 3); // 2.5
        assert_eq!(resolve_damage(10, 1.0), 10);
    }

    #[test]
    fn resolve_floors_positive_to_one() {
        assert_eq!(resolve_damage(1, 0.1), 1);
        assert_eq!(resolve_damage(3, 0.0), 1);
    }

    #[test]
    fn resolve_non_positive_is_zero() {
        assert_eq!(resolve_damage(0, 2.0), 0);
        assert_eq!(resolve_damage(-4, 1.0), 0);
    }
}
