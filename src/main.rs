use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::info;

use rfl_runtime::app::{print_final_state, print_level_summary};
use rfl_runtime::{LevelData, NullHost, Simulation, SimulationConfig};

/// Longest run `--simulate` accepts.
const MAX_SIMULATE_SECS: f32 = 3600.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let level = Arc::new(LevelData::open(&options.path)?);

    if options.json {
        let json = serde_json::to_string_pretty(level.as_ref())
            .context("failed to serialize level")?;
        println!("{json}");
    } else {
        print_level_summary(&level);
    }

    if let Some(seconds) = options.simulate {
        info!("running {seconds}s of simulation");
        let mut simulation = Simulation::new(Arc::clone(&level), SimulationConfig::default());
        simulation.run_for(seconds, &mut NullHost);
        let commands = simulation.drain_commands();
        print_final_state(&simulation, &commands);
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
struct CliOptions {
    path: String,
    json: bool,
    simulate: Option<f32>,
}

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: rfl-inspect <level.rfl> [--json] [--simulate SECS]"
            ));
        };
        let mut json = false;
        let mut simulate = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => json = true,
                "--simulate" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--simulate expects a number of seconds"))?;
                    let seconds: f32 = value
                        .parse()
                        .with_context(|| format!("invalid duration '{value}'"))?;
                    if !seconds.is_finite() || seconds < 0.0 {
                        return Err(anyhow!("invalid duration '{value}'"));
                    }
                    if seconds > MAX_SIMULATE_SECS {
                        return Err(anyhow!(
                            "duration '{value}' exceeds the {MAX_SIMULATE_SECS}s limit"
                        ));
                    }
                    simulate = Some(seconds);
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --json or --simulate SECS"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            json,
            simulate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_flags_in_any_order() {
        let options = parse(&["level.rfl", "--simulate", "2.5", "--json"]).unwrap();
        assert_eq!(
            options,
            CliOptions {
                path: "level.rfl".into(),
                json: true,
                simulate: Some(2.5),
            }
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["level.rfl", "--simulate"]).is_err());
        assert!(parse(&["level.rfl", "--simulate", "soon"]).is_err());
        assert!(parse(&["level.rfl", "--render"]).is_err());
    }

    #[test]
    fn rejects_unbounded_durations() {
        assert!(parse(&["level.rfl", "--simulate", "3600"]).is_ok());
        assert!(parse(&["level.rfl", "--simulate", "1e30"]).is_err());
        assert!(parse(&["level.rfl", "--simulate", "-1"]).is_err());
    }
}
