use std::path::Path;

use bd_combat::{
    BasicAttack, Battle, BattleConfig, BattleEvent, BattleResult, Combatant, LoggedEvent,
    RandomTarget, Unit,
};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use crate::encounter;

/// Built-in turn actions selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Hit the first living enemy
    Basic,
    /// Hit a random living enemy (seeded)
    Random,
}

#[derive(Serialize)]
struct FightReport<'a> {
    encounter: &'a str,
    result: BattleResult,
    rounds: u32,
    events: &'a [LoggedEvent],
    combatants: &'a [Unit],
}

pub fn run(
    file: &Path,
    strategy: Strategy,
    seed: u64,
    max_rounds: u32,
    json: bool,
) -> Result<(), String> {
    let enc = encounter::load(file)?;
    if enc.skipped > 0 {
        eprintln!(
            "  {} skipped {} malformed roster entr{}",
            "warning:".yellow().bold(),
            enc.skipped,
            if enc.skipped == 1 { "y" } else { "ies" }
        );
    }

    let config = BattleConfig::default()
        .with_max_rounds(max_rounds)
        .with_damage_table(enc.damage_table);
    let log = config.event_log();
    let mut battle = Battle::with_registries(config, enc.statuses, enc.buffs);
    battle.subscribe(log.clone());

    let result = match strategy {
        Strategy::Basic => battle.start(enc.friends, enc.foes, &mut BasicAttack),
        Strategy::Random => battle.start(enc.friends, enc.foes, &mut RandomTarget::new(seed)),
    }
    .map_err(|e| format!("battle failed: {e}"))?;

    if json {
        let events = log.borrow();
        let rounds = battle.round();
        let combatants = battle.into_combatants();
        let report = FightReport {
            encounter: &enc.name,
            result,
            rounds,
            events: events.events(),
            combatants: &combatants,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("cannot serialize report: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "  {} '{}' {}",
        "Battle".bold(),
        enc.name,
        format!("({strategy:?}, seed={seed})").to_lowercase().dimmed()
    );
    println!();

    println!("  {}", "Event Log".bold().underline());
    println!();
    for entry in log.borrow().events() {
        let round_label = format!("[round {:>2}]", entry.round).dimmed();
        println!("  {round_label} {}", colorize_event(&entry.event));
    }
    println!();

    println!("  {}", "Combatants".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Team", "HP", "Stats", "Statuses", "Buffs"]);
    for (id, unit) in battle.roster().iter() {
        let statuses: Vec<String> = battle
            .statuses()
            .list_active(id)
            .iter()
            .map(ToString::to_string)
            .collect();
        let buffs: Vec<String> = battle
            .buffs()
            .list_active(id)
            .iter()
            .map(ToString::to_string)
            .collect();
        table.add_row(vec![
            id.to_string(),
            unit.name.clone(),
            unit.team.to_string(),
            format_hp(unit),
            unit.stats.to_string(),
            join_or_dash(&statuses),
            join_or_dash(&buffs),
        ]);
    }
    println!("{table}");
    println!();

    let outcome = match result {
        BattleResult::Victory => "VICTORY".green().bold(),
        BattleResult::Defeat => "DEFEAT".red().bold(),
        BattleResult::Ongoing => "UNRESOLVED".yellow().bold(),
    };
    println!("  {outcome} after {} round(s)", battle.round());
    if result == BattleResult::Ongoing {
        println!(
            "  {}",
            format!("round cap of {max_rounds} reached").dimmed()
        );
    }
    Ok(())
}

fn colorize_event(event: &BattleEvent) -> colored::ColoredString {
    let text = event.to_string();
    match event {
        BattleEvent::RoundStarted { .. } | BattleEvent::RoundEnded { .. } => text.bold(),
        BattleEvent::TurnOrderBuilt { .. } => text.dimmed(),
        BattleEvent::TurnStarted { .. } | BattleEvent::TurnEnded { .. } => text.normal(),
        BattleEvent::TurnSkipped { .. } => text.yellow(),
        BattleEvent::DamageDealt { .. } => text.red(),
        BattleEvent::Healed { .. } => text.green(),
        BattleEvent::CombatantDefeated { .. } => text.red().bold(),
        BattleEvent::StatusApplied { .. } | BattleEvent::StatusExpired { .. } => text.cyan(),
        BattleEvent::BuffApplied { .. }
        | BattleEvent::BuffTicked { .. }
        | BattleEvent::BuffExpired { .. } => text.blue(),
        BattleEvent::BattleEnded { .. } => text.magenta().bold(),
    }
}

fn format_hp(unit: &Unit) -> String {
    let hp = format!("{}/{}", unit.hp(), unit.max_hp());
    let frac = unit.health_fraction();
    if frac <= 0.0 {
        hp.red().bold().to_string()
    } else if frac <= 0.4 {
        hp.yellow().to_string()
    } else {
        hp.green().to_string()
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
