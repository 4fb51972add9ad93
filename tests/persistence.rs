use anyhow::Result;
use pong_evolve::neuro::{Network, NetworkSave, Neuroevolution};
use pong_evolve::util::write_json;
use pong_evolve::{
    orchestrator_from_config, replay_evaluator, ArenaConfig, Controller, EvolutionConfig,
};
use std::fs;

#[test]
fn best_network_survives_a_disk_round_trip() -> Result<()> {
    let config = EvolutionConfig {
        population_size: 6,
        frame_budget: 300,
        generation_count: 2,
        ..EvolutionConfig::default()
    };
    let mut optimizer =
        Neuroevolution::new(config.optimizer.clone(), config.population_size, config.seed)?;
    let outcome = orchestrator_from_config(&config)?.run(&mut optimizer)?;
    let (best, _) = outcome.best().expect("ranking is not empty");

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("best-network.json");
    write_json(&path, &best.export())?;

    let save: NetworkSave = serde_json::from_slice(&fs::read(&path)?)?;
    assert_eq!(save.neurons, vec![6, 8, 1]);
    let restored = Network::from_save(save)?;
    assert_eq!(&restored, best);

    let inputs = [0.5, 0.5, 0.25, -0.25, 0.1, 0.9];
    assert_eq!(restored.compute(&inputs), best.compute(&inputs));
    Ok(())
}

#[test]
fn config_file_round_trips_through_json() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");
    let config = EvolutionConfig {
        population_size: 30,
        jobs: Some(2),
        ..EvolutionConfig::default()
    };
    write_json(&path, &config)?;
    assert_eq!(EvolutionConfig::load(&path)?, config);
    Ok(())
}

#[test]
fn replay_uses_the_arena_from_the_config_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");
    let config = EvolutionConfig {
        frame_budget: 640,
        arena: ArenaConfig {
            width: 900.0,
            height: 500.0,
            paddle_height: 60.0,
            ..ArenaConfig::default()
        },
        ..EvolutionConfig::default()
    };
    write_json(&path, &config)?;

    let loaded = EvolutionConfig::load(&path)?;
    let evaluator = replay_evaluator(&loaded, None, None)?;
    assert_eq!(evaluator.arena().config(), &config.arena);
    assert_eq!(evaluator.frame_budget(), 640);

    let evaluator = replay_evaluator(&loaded, Some(90), Some(1))?;
    assert_eq!(evaluator.frame_budget(), 90);
    Ok(())
}
