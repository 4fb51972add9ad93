use anyhow::Result;
use pong_evolve::{
    Arena, ArenaConfig, ConstantController, Controller, ControllerFault, Error, Evaluator,
};
use std::collections::BTreeSet;

/// Bad output only for one chosen value, so one member of an otherwise
/// healthy population breaks the contract.
#[derive(Clone, Copy)]
struct Picky {
    value: f64,
    broken: bool,
}

impl Controller for Picky {
    fn compute(&self, _inputs: &[f64]) -> Vec<f64> {
        if self.broken {
            vec![f64::NAN]
        } else {
            vec![self.value]
        }
    }

    fn export(&self) -> serde_json::Value {
        serde_json::json!({ "value": self.value })
    }
}

fn mixed_population(n: usize) -> Vec<ConstantController> {
    (0..n)
        .map(|idx| ConstantController(idx as f64 / n as f64))
        .collect()
}

fn evaluator(jobs: Option<usize>) -> Result<Evaluator> {
    Ok(Evaluator::new(Arena::new(ArenaConfig::default()), 1_000, jobs)?)
}

#[test]
fn every_member_is_scored_exactly_once() -> Result<()> {
    for n in [1usize, 2, 7, 32] {
        let population = mixed_population(n);
        let ranking = evaluator(None)?.evaluate(1, 0xA57E_0001, &population)?;

        assert_eq!(ranking.len(), n);
        let indices: BTreeSet<usize> = ranking.iter().map(|c| c.index).collect();
        assert_eq!(indices, (0..n).collect::<BTreeSet<_>>());
    }
    Ok(())
}

#[test]
fn ranking_is_best_first() -> Result<()> {
    let population = mixed_population(16);
    let ranking = evaluator(None)?.evaluate(1, 42, &population)?;
    for pair in ranking.windows(2) {
        assert!(pair[0].outcome.score >= pair[1].outcome.score);
        if pair[0].outcome.score == pair[1].outcome.score {
            assert!(pair[0].index < pair[1].index);
        }
    }
    Ok(())
}

#[test]
fn results_do_not_depend_on_worker_count() -> Result<()> {
    let population = mixed_population(24);
    let single = evaluator(Some(1))?.evaluate(3, 0xC0FF_EE11, &population)?;
    let many = evaluator(Some(4))?.evaluate(3, 0xC0FF_EE11, &population)?;
    let global = evaluator(None)?.evaluate(3, 0xC0FF_EE11, &population)?;
    assert_eq!(single, many);
    assert_eq!(single, global);
    Ok(())
}

#[test]
fn identical_controllers_get_independent_episodes() -> Result<()> {
    let population = vec![ConstantController(0.5); 32];
    let ranking = evaluator(None)?.evaluate(1, 7, &population)?;
    let distinct_frames: BTreeSet<u32> = ranking.iter().map(|c| c.outcome.frames).collect();
    assert!(
        distinct_frames.len() > 1,
        "every member replayed the same episode"
    );
    Ok(())
}

#[test]
fn broken_member_fails_the_whole_generation() -> Result<()> {
    let mut population: Vec<Picky> = (0..8)
        .map(|idx| Picky {
            value: idx as f64 / 8.0,
            broken: false,
        })
        .collect();
    population[5].broken = true;

    let err = evaluator(None)?
        .evaluate(4, 1, &population)
        .expect_err("NaN output must abort the generation");
    match err {
        Error::ControllerOutput {
            generation,
            member,
            fault,
        } => {
            assert_eq!(generation, 4);
            assert_eq!(member, 5);
            assert!(matches!(fault, ControllerFault::NonFinite(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}
