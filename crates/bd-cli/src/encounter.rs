//! Encounter files: two rosters plus optional definition overrides.

use std::fs;
use std::path::Path;

use bd_combat::{
    BuffDefinition, BuffRegistry, DamageModifierTable, StatusDefinition, StatusRegistry, Team,
    Unit,
};
use serde::Deserialize;
use serde_json::Value;

/// A loaded encounter, ready to hand to a battle.
#[derive(Debug)]
pub struct Encounter {
    pub name: String,
    pub friends: Vec<Unit>,
    pub foes: Vec<Unit>,
    pub statuses: StatusRegistry,
    pub buffs: BuffRegistry,
    pub damage_table: DamageModifierTable,
    /// Roster entries dropped while loading.
    pub skipped: usize,
}

#[derive(Deserialize)]
struct EncounterFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    friends: Vec<Value>,
    #[serde(default)]
    foes: Vec<Value>,
    #[serde(default)]
    statuses: Vec<StatusDefinition>,
    #[serde(default)]
    buffs: Vec<BuffDefinition>,
    #[serde(default)]
    damage_table: Option<DamageModifierTable>,
}

/// Read and parse an encounter file.
pub fn load(path: &Path) -> Result<Encounter, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "encounter".to_string());
    parse(&text, &fallback)
}

/// Parse encounter JSON. `fallback_name` is used when the file has no `name`.
pub fn parse(text: &str, fallback_name: &str) -> Result<Encounter, String> {
    let file: EncounterFile =
        serde_json::from_str(text).map_err(|e| format!("invalid encounter file: {e}"))?;

    let mut skipped = 0;
    let friends = units(file.friends, Team::Friends, &mut skipped);
    let foes = units(file.foes, Team::Foes, &mut skipped);

    let mut statuses = StatusRegistry::default();
    for def in file.statuses {
        statuses.define(def);
    }
    let mut buffs = BuffRegistry::default();
    for def in file.buffs {
        buffs.define(def);
    }
    let mut damage_table = DamageModifierTable::default();
    if let Some(overrides) = &file.damage_table {
        damage_table.merge(overrides);
    }

    Ok(Encounter {
        name: file.name.unwrap_or_else(|| fallback_name.to_string()),
        friends,
        foes,
        statuses,
        buffs,
        damage_table,
        skipped,
    })
}

/// Deserialize one roster. Entries without a `team` join the roster's side;
/// `null` and malformed entries are skipped.
fn units(entries: Vec<Value>, team: Team, skipped: &mut usize) -> Vec<Unit> {
    let mut out = Vec::with_capacity(entries.len());
    for (index, mut entry) in entries.into_iter().enumerate() {
        let Value::Object(map) = &mut entry else {
            tracing::warn!(side = %team, index, "skipping non-object roster entry");
            *skipped += 1;
            continue;
        };
        map.entry("team")
            .or_insert_with(|| Value::String(team.to_string()));
        match serde_json::from_value::<Unit>(entry) {
            Ok(unit) => out.push(unit),
            Err(e) => {
                tracing::warn!(side = %team, index, error = %e, "skipping malformed roster entry");
                *skipped += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bd_combat::{BuffKind, Combatant, DamageType, StatusKind};

    #[test]
    fn parse_minimal() {
        let enc = parse(
            r#"{
                "friends": [{ "name": "Knight", "stats": { "max_hp": 30, "speed": 5, "attack": 6 } }],
                "foes": [{ "name": "Imp", "stats": { "max_hp": 10 }, "defense_type": "infernal" }]
            }"#,
            "duel",
        )
        .unwrap();
        assert_eq!(enc.name, "duel");
        assert_eq!(enc.friends[0].team, Team::Friends);
        assert_eq!(enc.foes[0].team, Team::Foes);
        assert_eq!(enc.foes[0].defense_type(), DamageType::Infernal);
        assert_eq!(enc.friends[0].hp(), 30);
        assert_eq!(enc.skipped, 0);
    }

    #[test]
    fn null_and_malformed_entries_are_skipped() {
        let enc = parse(
            r#"{
                "name": "Ambush",
                "friends": [null, { "name": "Knight", "stats": { "max_hp": 30 } }, 7],
                "foes": [{ "name": "Imp" }, { "name": "Bat", "stats": { "max_hp": 4 } }]
            }"#,
            "unused",
        )
        .unwrap();
        assert_eq!(enc.name, "Ambush");
        assert_eq!(enc.friends.len(), 1);
        assert_eq!(enc.foes.len(), 1);
        assert_eq!(enc.skipped, 3);
    }

    #[test]
    fn overrides_extend_builtins() {
        let enc = parse(
            r#"{
                "friends": [],
                "foes": [],
                "statuses": [{ "kind": "Rooted", "blocks_turn": true, "base_duration": 2 }],
                "buffs": [{ "kind": "Poison", "effect": "damage_over_time", "base_magnitude": 9 }],
                "damage_table": { "Physical": { "Holy": 0.5 } }
            }"#,
            "x",
        )
        .unwrap();
        let rooted = enc.statuses.definition(&StatusKind::from("Rooted")).unwrap();
        assert!(rooted.blocks_turn);
        assert!(enc.statuses.definition(&StatusKind::Stunned).is_some());
        assert_eq!(
            enc.buffs.definition(&BuffKind::Poison).unwrap().base_magnitude,
            9
        );
        assert_eq!(
            enc.damage_table
                .modifier(&DamageType::Physical, &DamageType::Holy),
            0.5
        );
        assert_eq!(
            enc.damage_table
                .modifier(&DamageType::Holy, &DamageType::Infernal),
            1.25
        );
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse("{ friends: ", "x").is_err());
    }
}
