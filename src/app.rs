use std::collections::BTreeMap;

use crate::level::LevelData;
use crate::mover::{Mover, MoverPhase};
use crate::simulation::{Command, Simulation};

pub fn print_level_summary(level: &LevelData) {
    let position = level.player_start.transform.position;
    println!(
        "Loaded level '{}' (version 0x{:X}, {} sections)",
        level.display_name(),
        level.header.version,
        level.sections.len()
    );
    if !level.info.author.is_empty() {
        println!("Author: {}", level.info.author);
    }
    println!(
        "Player start: ({:.2}, {:.2}, {:.2})",
        position.x, position.y, position.z
    );
    for (name, count) in record_counts(level) {
        println!(" - {name}: {count}");
    }
}

/// Per-array record counts in a fixed order.
pub fn record_counts(level: &LevelData) -> Vec<(&'static str, usize)> {
    vec![
        ("brushes", level.brushes.len()),
        ("mover brushes", level.mover_brushes.len()),
        ("lights", level.lights.len()),
        ("entities", level.entities.len()),
        ("items", level.items.len()),
        ("clutter", level.clutter.len()),
        ("triggers", level.triggers.len()),
        ("events", level.events.len()),
        ("moving groups", level.moving_groups.len()),
        ("particle emitters", level.particle_emitters.len()),
        ("bolt emitters", level.bolt_emitters.len()),
        ("decals", level.decals.len()),
        ("push regions", level.push_regions.len()),
        ("geo regions", level.geo_regions.len()),
        ("spawn points", level.spawn_points.len()),
        ("targets", level.targets.len()),
    ]
}

pub fn print_final_state(simulation: &Simulation, commands: &[Command]) {
    println!(
        "Simulated {:.2}s in {} ticks",
        simulation.time(),
        simulation.ticks()
    );
    println!("Final mover states:");
    for mover in simulation.movers() {
        println!(" - {}", describe_mover(mover));
    }
    println!("Commands:");
    for (name, count) in count_commands(commands) {
        println!(" - {name}: {count}");
    }
    let warnings = simulation.diagnostics().warnings();
    if !warnings.is_empty() {
        println!("Warnings: {}", warnings.len());
    }
}

pub fn describe_mover(mover: &Mover) -> String {
    let name = if mover.name().is_empty() {
        format!("group {}", mover.group())
    } else {
        mover.name().to_string()
    };
    let state = match mover.phase() {
        MoverPhase::AtKeyframe { key, .. } => format!("at key {key}"),
        MoverPhase::Paused { key, remaining, .. } => {
            format!("waiting at key {key} ({remaining:.2}s)")
        }
        MoverPhase::Traveling { from, to, .. } => format!("travelling {from} -> {to}"),
    };
    let position = mover.position();
    let paused = if mover.is_paused() { " [paused]" } else { "" };
    format!(
        "{name} {state} pos=({:.2}, {:.2}, {:.2}){paused}",
        position.x, position.y, position.z
    )
}

/// Commands grouped by kind, sorted by name.
pub fn count_commands(commands: &[Command]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for command in commands {
        *counts.entry(command.name()).or_insert(0) += 1;
    }
    counts
}
