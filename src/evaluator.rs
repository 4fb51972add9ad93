use crate::controller::Controller;
use crate::env::{Arena, Side};
use crate::episode::{run_episode, EpisodeOutcome};
use crate::error::{ControllerFault, Error, Result};
use crate::util::derive_member_seed;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One population member's result, keyed by its slot in the population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub index: usize,
    pub outcome: EpisodeOutcome,
}

impl ScoredCandidate {
    pub fn score(&self) -> f64 {
        f64::from(self.outcome.score)
    }
}

/// Runs one episode per population member on the rayon pool and ranks them.
pub struct Evaluator {
    arena: Arena,
    frame_budget: u32,
    pool: Option<rayon::ThreadPool>,
}

impl Evaluator {
    /// `jobs` pins the worker count; `None` uses rayon's global pool.
    pub fn new(arena: Arena, frame_budget: u32, jobs: Option<usize>) -> Result<Self> {
        if frame_budget == 0 {
            return Err(Error::config("frame_budget", "must be > 0"));
        }
        let pool = match jobs {
            None => None,
            Some(0) => return Err(Error::config("jobs", "must be >= 1 when provided")),
            Some(jobs) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build()?,
            ),
        };
        Ok(Self {
            arena,
            frame_budget,
            pool,
        })
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn frame_budget(&self) -> u32 {
        self.frame_budget
    }

    /// Scores every member exactly once, best first (ties by lower index).
    ///
    /// Each member gets its own freshly reset state and an RNG seeded from
    /// `generation_seed` and its index, so results do not depend on worker
    /// count or completion order. Any controller fault fails the whole batch.
    pub fn evaluate<C: Controller + Sync>(
        &self,
        generation: u32,
        generation_seed: u64,
        population: &[C],
    ) -> Result<Vec<ScoredCandidate>> {
        let run_one = |(index, controller): (usize, &C)| -> Result<ScoredCandidate> {
            let mut rng = fastrand::Rng::with_seed(derive_member_seed(generation_seed, index));
            let outcome = run_episode(&self.arena, controller, self.frame_budget, &mut rng)
                .map_err(|fault| Error::ControllerOutput {
                    generation,
                    member: index,
                    fault,
                })?;
            tracing::debug!(
                generation,
                member = index,
                score = outcome.score,
                frames = outcome.frames,
                winner = outcome.winner.map_or("none", Side::as_str),
                "episode finished"
            );
            Ok(ScoredCandidate { index, outcome })
        };

        let results: Vec<Result<ScoredCandidate>> = match &self.pool {
            Some(pool) => pool.install(|| population.par_iter().enumerate().map(run_one).collect()),
            None => population.par_iter().enumerate().map(run_one).collect(),
        };

        let mut scored = results.into_iter().collect::<Result<Vec<_>>>()?;
        rank(&mut scored);
        Ok(scored)
    }

    /// Plays one controller over many seeds; outcomes come back in seed order.
    pub fn replay_seeds<C: Controller + Sync + ?Sized>(
        &self,
        controller: &C,
        seeds: &[u64],
    ) -> std::result::Result<Vec<EpisodeOutcome>, ControllerFault> {
        let run_one = |seed: &u64| {
            let mut rng = fastrand::Rng::with_seed(*seed);
            run_episode(&self.arena, controller, self.frame_budget, &mut rng)
        };

        let results: Vec<std::result::Result<EpisodeOutcome, ControllerFault>> = match &self.pool {
            Some(pool) => pool.install(|| seeds.par_iter().map(run_one).collect()),
            None => seeds.par_iter().map(run_one).collect(),
        };
        results.into_iter().collect()
    }
}

/// Sorts by score descending, breaking ties by ascending index.
pub fn rank(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| {
        b.outcome
            .score
            .cmp(&a.outcome.score)
            .then(a.index.cmp(&b.index))
    });
}
