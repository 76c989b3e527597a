use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gauge_cli::{Scenario, Simulation, SimulationReport, StepRecord, TickReport};
use gauge_core::{EngineConfig, WEIGHT_SCALE};
use gauge_governance::ProposalOutcome;
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gauge-sim")]
#[command(about = "Gauge emissions voting and governance simulator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default configuration as TOML
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Replay a JSON scenario through both engines
    Simulate {
        /// Scenario file
        #[arg(short, long, value_name = "FILE")]
        scenario: PathBuf,

        /// Engine configuration (TOML); defaults apply when omitted
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the final engine state as JSON
        #[arg(long, value_name = "FILE")]
        state_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Config { output } => {
            let config = EngineConfig::default();
            match output {
                Some(path) => {
                    config
                        .save_to_file(&path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("{} {}", "✓ Configuration written to".green(), path.display());
                }
                None => print!("{}", config.to_toml_string()?),
            }
        }

        Commands::Simulate {
            scenario,
            config,
            state_out,
        } => {
            let config = match config {
                Some(path) => EngineConfig::load_from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => EngineConfig::default(),
            };
            let scenario = Scenario::load_from_file(&scenario)?;

            let (simulation, report) = Simulation::run(&config, &scenario);
            print_steps(&report);
            print_summary(&simulation, &report);

            if let Some(path) = state_out {
                let state = serde_json::to_string_pretty(&simulation.state())?;
                std::fs::write(&path, state)
                    .with_context(|| format!("writing state {}", path.display()))?;
                println!("\n{} {}", "✓ State written to".green(), path.display());
            }
        }
    }

    Ok(())
}

fn print_steps(report: &SimulationReport) {
    println!("\n{}", "Actions".cyan().bold());
    println!("═══════════════════════════════════");
    for step in &report.steps {
        print_tick(&step.tick);
        print_step(step);
    }
}

fn print_step(step: &StepRecord) {
    let at = format!("[{:>10}]", step.at);
    match &step.outcome {
        Ok(detail) => println!("{} {} {}", at.dimmed(), step.action, detail.green()),
        Err(e) => println!("{} {} {}", at.dimmed(), step.action, e.to_string().red()),
    }
}

fn print_tick(tick: &TickReport) {
    if let Some(epoch) = &tick.finalized_epoch {
        println!(
            "{} epoch {} finalized with {} votes",
            "⏱".yellow(),
            epoch.number,
            epoch.total_votes
        );
    }
    for (proposal_id, outcome) in &tick.resolved {
        let line = match outcome {
            ProposalOutcome::Vetoed { slashed, returned } => {
                format!("{} vetoed: slashed {}, returned {}", proposal_id, slashed, returned)
            }
            ProposalOutcome::Rejected { reason, returned } => {
                format!("{} rejected ({}), returned {}", proposal_id, reason, returned)
            }
            ProposalOutcome::Passed { activation_time } => {
                format!("{} passed, activates at {}", proposal_id, activation_time)
            }
        };
        println!("{} {}", "⏱".yellow(), line);
    }
    for (proposal_id, gauge_id) in &tick.activated {
        println!("{} {} activated as {}", "⏱".yellow(), proposal_id, gauge_id);
    }
    for (proposal_id, e) in &tick.failures {
        println!("{} {} {}", "⏱".yellow(), proposal_id, e.to_string().red());
    }
}

fn percent(weight: u64) -> String {
    format!("{:.2}%", weight as f64 * 100.0 / WEIGHT_SCALE as f64)
}

fn print_summary(simulation: &Simulation, report: &SimulationReport) {
    let voting = simulation.voting().read();
    let stats = voting.get_stats();

    println!("\n{}", "Gauges".cyan().bold());
    println!("═══════════════════════════════════");
    println!(
        "{}: {} (ends {})",
        "Epoch".yellow().bold(),
        stats.current_epoch,
        stats.epoch_end_time
    );
    for row in voting.get_gauge_weights() {
        let status = if row.is_active {
            "active".green().to_string()
        } else {
            "inactive".red().to_string()
        };
        println!(
            "  {:<10} {:<16} weight {:>8}  votes {:>14}  voters {:>4}  {}",
            row.gauge_id,
            row.pool_id,
            percent(row.current_weight),
            row.total_votes,
            row.voter_count,
            status
        );
    }
    drop(voting);

    let governance = simulation.governance().read();
    let stats = governance.get_stats();
    println!("\n{}", "Governance".cyan().bold());
    println!("═══════════════════════════════════");
    println!(
        "{}: {} total, {} pending, {} passed, {} active, {} vetoed, {} rejected",
        "Proposals".yellow().bold(),
        stats.total_proposals,
        stats.pending,
        stats.passed,
        stats.active,
        stats.vetoed,
        stats.rejected
    );
    println!(
        "{}: {}",
        "Treasury".yellow().bold(),
        stats.treasury_balance.to_string().green()
    );
    for (rank, metrics) in governance.get_gauge_rankings().iter().enumerate() {
        println!(
            "  #{} {:<10} score {:>3}.{:02}",
            rank + 1,
            metrics.gauge_id,
            metrics.score / 100,
            metrics.score % 100
        );
    }
    drop(governance);

    println!("\n{}", "Events".cyan().bold());
    println!("═══════════════════════════════════");
    for (name, count) in &report.event_counts {
        println!("  {:<20} {}", name, count);
    }
    if report.lagged > 0 {
        println!("  {} {}", "lagged".red(), report.lagged);
    }

    let failed = report.failures().count();
    if failed > 0 {
        println!("\n{} {} action(s) failed", "⚠".yellow(), failed);
    } else {
        println!("\n{}", "✓ All actions succeeded".green());
    }
}
