use bd_combat::{BuffDefinition, DamageModifierTable, StatusDefinition};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

fn flag(on: bool) -> &'static str {
    if on { "yes" } else { "-" }
}

fn stacks(max: Option<u32>) -> String {
    max.map_or_else(|| "unbounded".to_string(), |n| n.to_string())
}

pub fn run() -> Result<(), String> {
    println!("  {}", "Statuses".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Status",
        "Blocks turn",
        "Blocks actions",
        "Affects order",
        "Rounds",
        "Stacks",
        "Tags",
    ]);
    for def in StatusDefinition::builtin() {
        table.add_row(vec![
            def.kind.to_string(),
            flag(def.blocks_turn).to_string(),
            flag(def.blocks_actions).to_string(),
            flag(def.affects_order).to_string(),
            def.base_duration.to_string(),
            stacks(def.max_stacks),
            def.tags.join(", "),
        ]);
    }
    println!("{table}");
    println!();

    println!("  {}", "Buffs".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Buff", "Effect", "Type", "Amount", "Rounds", "Stacks", "Tags",
    ]);
    for def in BuffDefinition::builtin() {
        let amount = if def.shield_amount > 0 {
            def.shield_amount
        } else {
            def.base_magnitude
        };
        table.add_row(vec![
            def.kind.to_string(),
            def.effect.to_string(),
            def.damage_type.to_string(),
            amount.to_string(),
            def.base_duration.to_string(),
            stacks(def.max_stacks),
            def.tags.join(", "),
        ]);
    }
    println!("{table}");
    println!();

    println!("  {}", "Damage Modifiers".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Attack", "Defense", "Multiplier"]);
    for (attack, defense, value) in DamageModifierTable::default().entries() {
        table.add_row(vec![
            attack.to_string(),
            defense.to_string(),
            format!("x{value:.2}"),
        ]);
    }
    println!("{table}");
    println!(
        "  {}",
        "Pairs not listed deal normal damage (x1.00).".dimmed()
    );
    Ok(())
}
