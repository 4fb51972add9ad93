use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use pong_evolve::config::{EvolutionConfig, FRAME_BUDGET_DEFAULT, SEED_DEFAULT};
use pong_evolve::neuro::{Network, NetworkSave, Neuroevolution};
use pong_evolve::util::{parse_seed, seed_chain, seed_to_hex, write_json};
use pong_evolve::{
    orchestrator_from_config, replay_evaluator, Arena, ArenaConfig, ConstantController, Controller,
    EpisodeOutcome, Evaluator, Side,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pong-evolve")]
#[command(about = "Neuroevolution of Pong paddle controllers against a fixed opponent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve controllers and save the best one of the final generation
    Evolve {
        /// JSON config file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        population_size: Option<usize>,
        #[arg(long)]
        frame_budget: Option<u32>,
        #[arg(long)]
        generations: Option<u32>,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long, default_value = "best-network.json")]
        output: PathBuf,
    },
    /// Play a saved network as the right paddle over a seed sweep
    Play {
        #[arg(long)]
        network: PathBuf,
        /// JSON config file the network was evolved with; supplies the arena
        /// geometry and the default frame budget
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 100)]
        seeds: usize,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long)]
        frame_budget: Option<u32>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Check that a paddle that never reacts loses to the fixed opponent
    Smoke {
        #[arg(long, default_value_t = 100)]
        seeds: usize,
        #[arg(long)]
        seed_start: Option<String>,
    },
    /// Print the default configuration as JSON
    DefaultConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli { command } = Cli::parse();

    match command {
        Commands::Evolve {
            config,
            population_size,
            frame_budget,
            generations,
            seed,
            jobs,
            output,
        } => {
            let mut config = match config {
                Some(path) => EvolutionConfig::load(&path)?,
                None => EvolutionConfig::default(),
            };
            if let Some(value) = population_size {
                config.population_size = value;
            }
            if let Some(value) = frame_budget {
                config.frame_budget = value;
            }
            if let Some(value) = generations {
                config.generation_count = value;
            }
            if let Some(value) = seed {
                config.seed = parse_seed(&value)?;
            }
            if jobs.is_some() {
                config.jobs = jobs;
            }

            let orchestrator = orchestrator_from_config(&config)?;
            let mut optimizer = Neuroevolution::new(
                config.optimizer.clone(),
                config.population_size,
                config.seed,
            )?;

            println!("population={}", config.population_size);
            println!("generations={}", config.generation_count);
            println!("frame_budget={}", config.frame_budget);
            println!("seed={}", seed_to_hex(config.seed));

            let outcome = orchestrator.run_with(&mut optimizer, |summary| {
                println!(
                    "gen {} | best_score={} (member {}) | mean_score={:.2}",
                    summary.generation, summary.best_score, summary.best_index, summary.mean_score
                );
            })?;

            let (best, scored) = outcome
                .best()
                .ok_or_else(|| anyhow!("final generation produced no ranking"))?;
            write_json(&output, &best.export())?;

            println!("best_member={}", scored.index);
            println!("best_score={}", scored.outcome.score);
            println!("output={}", output.display());
        }
        Commands::Play {
            network,
            config,
            seeds,
            seed_start,
            frame_budget,
            jobs,
        } => {
            let data = fs::read(&network)
                .with_context(|| format!("failed reading {}", network.display()))?;
            let save: NetworkSave = serde_json::from_slice(&data)
                .with_context(|| format!("failed parsing {}", network.display()))?;
            let controller = Network::from_save(save)?;

            let seeds = resolve_seeds(seed_start.as_deref(), seeds)?;
            let config = match config {
                Some(path) => EvolutionConfig::load(&path)?,
                None => EvolutionConfig::default(),
            };
            let evaluator = replay_evaluator(&config, frame_budget, jobs)?;
            let outcomes = evaluator
                .replay_seeds(&controller, &seeds)
                .map_err(|fault| anyhow!("network broke the controller contract: {fault}"))?;

            println!("network={}", network.display());
            print_tally(&outcomes);
        }
        Commands::Smoke { seeds, seed_start } => {
            let seeds = resolve_seeds(seed_start.as_deref(), seeds)?;
            let evaluator =
                Evaluator::new(Arena::new(ArenaConfig::default()), FRAME_BUDGET_DEFAULT, None)?;
            let outcomes = evaluator
                .replay_seeds(&ConstantController(0.5), &seeds)
                .map_err(|fault| anyhow!("constant controller faulted: {fault}"))?;

            print_tally(&outcomes);
            let lost = outcomes
                .iter()
                .filter(|o| o.winner == Some(Side::Left))
                .count();
            if lost * 2 <= outcomes.len() {
                return Err(anyhow!(
                    "idle paddle lost only {lost}/{} episodes",
                    outcomes.len()
                ));
            }
        }
        Commands::DefaultConfig => {
            let encoded = serde_json::to_vec_pretty(&EvolutionConfig::default())?;
            println!("{}", String::from_utf8_lossy(&encoded));
        }
    }

    Ok(())
}

fn resolve_seeds(seed_start: Option<&str>, count: usize) -> Result<Vec<u64>> {
    if count == 0 {
        return Err(anyhow!("--seeds must be >= 1"));
    }
    let start = match seed_start {
        Some(raw) => parse_seed(raw)?,
        None => SEED_DEFAULT,
    };
    Ok(seed_chain(start, count))
}

fn print_tally(outcomes: &[EpisodeOutcome]) {
    let wins = outcomes.iter().filter(|o| o.evaluated_side_won()).count();
    let losses = outcomes
        .iter()
        .filter(|o| o.winner == Some(Side::Left))
        .count();
    let timeouts = outcomes.iter().filter(|o| o.winner.is_none()).count();
    let mean_score = if outcomes.is_empty() {
        0.0
    } else {
        outcomes.iter().map(|o| f64::from(o.score)).sum::<f64>() / outcomes.len() as f64
    };
    let mean_frames = if outcomes.is_empty() {
        0.0
    } else {
        outcomes.iter().map(|o| f64::from(o.frames)).sum::<f64>() / outcomes.len() as f64
    };

    println!("episodes={}", outcomes.len());
    println!("wins={wins}");
    println!("losses={losses}");
    println!("timeouts={timeouts}");
    println!("mean_score={mean_score:.2}");
    println!("mean_frames={mean_frames:.2}");
}
