pub mod config;
pub mod controller;
pub mod env;
pub mod episode;
pub mod error;
pub mod evaluator;
pub mod neuro;
pub mod orchestrator;
pub mod util;

pub use config::{ArenaConfig, EvolutionConfig, NeuroConfig};
pub use controller::{Action, ConstantController, Controller, TrackingOpponent};
pub use env::{Arena, EnvironmentState, Observation, Side};
pub use episode::{run_episode, EpisodeOutcome};
pub use error::{ControllerFault, Error, Result};
pub use evaluator::{Evaluator, ScoredCandidate};
pub use orchestrator::{EvolutionOutcome, GenerationSummary, Optimizer, Orchestrator};

/// Builds the evaluator and orchestrator described by a validated config.
pub fn orchestrator_from_config(config: &EvolutionConfig) -> Result<Orchestrator> {
    config.validate()?;
    let evaluator = Evaluator::new(
        Arena::new(config.arena.clone()),
        config.frame_budget,
        config.jobs,
    )?;
    Orchestrator::new(
        evaluator,
        config.population_size,
        config.generation_count,
        config.seed,
    )
}

/// Evaluator for replaying saved controllers in the arena `config` describes.
/// `frame_budget` and `jobs` override the config's values when given.
pub fn replay_evaluator(
    config: &EvolutionConfig,
    frame_budget: Option<u32>,
    jobs: Option<usize>,
) -> Result<Evaluator> {
    config.arena.validate()?;
    Evaluator::new(
        Arena::new(config.arena.clone()),
        frame_budget.unwrap_or(config.frame_budget),
        jobs.or(config.jobs),
    )
}
