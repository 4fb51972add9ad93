//! Generation loop: request a population, evaluate it, report every score
//! back to the optimizer, repeat.
//!
//! The optimizer is only touched from this sequential loop; evaluation of a
//! population fans out to worker threads and is fully awaited before any
//! score is reported.

use crate::controller::Controller;
use crate::evaluator::{Evaluator, ScoredCandidate};
use crate::error::{Error, Result};
use crate::util::next_seed;
use serde::{Deserialize, Serialize};

/// Population source and fitness sink driving the search.
pub trait Optimizer {
    type Controller: Controller + Sync;

    /// Ordered population for the next generation, one controller per slot.
    fn next_generation(&mut self) -> Vec<Self::Controller>;

    /// Records one member's fitness for the generation just evaluated.
    fn report_score(&mut self, controller: &Self::Controller, score: f64);
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// 1-indexed.
    pub generation: u32,
    pub best_score: f64,
    pub best_index: usize,
    pub mean_score: f64,
}

impl GenerationSummary {
    fn from_ranking(generation: u32, ranking: &[ScoredCandidate]) -> Option<Self> {
        let best = ranking.first()?;
        let total: f64 = ranking.iter().map(ScoredCandidate::score).sum();
        Some(Self {
            generation,
            best_score: best.score(),
            best_index: best.index,
            mean_score: total / ranking.len() as f64,
        })
    }
}

/// What the loop hands back once the last generation has been scored.
#[derive(Debug)]
pub struct EvolutionOutcome<C> {
    /// The last evaluated population, in the optimizer's slot order.
    pub population: Vec<C>,
    /// Ranking of `population`, best first.
    pub ranking: Vec<ScoredCandidate>,
    pub summaries: Vec<GenerationSummary>,
}

impl<C> EvolutionOutcome<C> {
    pub fn best(&self) -> Option<(&C, &ScoredCandidate)> {
        let top = self.ranking.first()?;
        self.population.get(top.index).map(|controller| (controller, top))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitPopulation,
    Evaluating,
    Reporting,
    Done,
}

pub struct Orchestrator {
    evaluator: Evaluator,
    population_size: usize,
    generation_count: u32,
    seed: u64,
}

impl Orchestrator {
    pub fn new(
        evaluator: Evaluator,
        population_size: usize,
        generation_count: u32,
        seed: u64,
    ) -> Result<Self> {
        if population_size == 0 {
            return Err(Error::config("population_size", "must be > 0"));
        }
        if generation_count == 0 {
            return Err(Error::config("generation_count", "must be > 0"));
        }
        Ok(Self {
            evaluator,
            population_size,
            generation_count,
            seed,
        })
    }

    /// Runs generations `1..=generation_count`.
    ///
    /// Stops at the first contract violation; nothing from the failing
    /// generation is reported to the optimizer.
    pub fn run<O: Optimizer>(&self, optimizer: &mut O) -> Result<EvolutionOutcome<O::Controller>> {
        self.run_with(optimizer, |_| {})
    }

    /// Like [`Orchestrator::run`], calling `on_generation` after each
    /// generation's scores have been reported.
    pub fn run_with<O, F>(
        &self,
        optimizer: &mut O,
        mut on_generation: F,
    ) -> Result<EvolutionOutcome<O::Controller>>
    where
        O: Optimizer,
        F: FnMut(&GenerationSummary),
    {
        let mut phase = Phase::AwaitPopulation;
        let mut generation = 1u32;
        let mut generation_seed = self.seed;
        let mut population: Vec<O::Controller> = Vec::new();
        let mut ranking: Vec<ScoredCandidate> = Vec::new();
        let mut summaries = Vec::new();

        loop {
            phase = match phase {
                Phase::AwaitPopulation => {
                    population = optimizer.next_generation();
                    self.check_population(generation, population.len())?;
                    Phase::Evaluating
                }
                Phase::Evaluating => {
                    ranking = self
                        .evaluator
                        .evaluate(generation, generation_seed, &population)
                        .map_err(|err| {
                            tracing::warn!(generation, error = %err, "generation aborted");
                            err
                        })?;
                    Phase::Reporting
                }
                Phase::Reporting => {
                    for scored in &ranking {
                        optimizer.report_score(&population[scored.index], scored.score());
                    }
                    if let Some(summary) = GenerationSummary::from_ranking(generation, &ranking) {
                        tracing::info!(
                            generation,
                            best_score = summary.best_score,
                            best_member = summary.best_index,
                            mean_score = summary.mean_score,
                            "generation scored"
                        );
                        on_generation(&summary);
                        summaries.push(summary);
                    }

                    if generation >= self.generation_count {
                        Phase::Done
                    } else {
                        generation += 1;
                        generation_seed = next_seed(generation_seed);
                        Phase::AwaitPopulation
                    }
                }
                Phase::Done => {
                    return Ok(EvolutionOutcome {
                        population,
                        ranking,
                        summaries,
                    });
                }
            };
        }
    }

    fn check_population(&self, generation: u32, actual: usize) -> Result<()> {
        if actual == 0 {
            tracing::warn!(generation, "optimizer returned an empty population");
            return Err(Error::EmptyPopulation { generation });
        }
        if actual != self.population_size {
            tracing::warn!(
                generation,
                expected = self.population_size,
                actual,
                "optimizer returned a malformed population"
            );
            return Err(Error::PopulationSizeMismatch {
                generation,
                expected: self.population_size,
                actual,
            });
        }
        Ok(())
    }
}
