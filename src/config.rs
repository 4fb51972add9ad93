use crate::error::{Error, Result};
use crate::env::OBSERVATION_LEN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const FRAME_BUDGET_DEFAULT: u32 = 1_000;
pub const GENERATION_COUNT_DEFAULT: u32 = 10;
pub const POPULATION_SIZE_DEFAULT: usize = 20;
pub const SEED_DEFAULT: u64 = 0xA57E_0001;

/// Geometry and speeds of the two-paddle arena. All lengths are in arena pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f64,
    pub height: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,
    pub paddle_speed: f64,
    /// Horizontal position of the left paddle's leading edge.
    pub left_paddle_x: f64,
    /// Distance from the right wall to the right paddle's leading edge.
    pub right_paddle_inset: f64,
    pub ball_radius: f64,
    pub ball_speed_x: f64,
    pub ball_speed_y: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 700.0,
            paddle_width: 20.0,
            paddle_height: 100.0,
            paddle_speed: 5.0,
            left_paddle_x: 20.0,
            right_paddle_inset: 40.0,
            ball_radius: 10.0,
            ball_speed_x: 8.0,
            ball_speed_y: 2.0,
        }
    }
}

impl ArenaConfig {
    pub fn right_paddle_x(&self) -> f64 {
        self.width - self.right_paddle_inset
    }

    /// Highest coordinate a paddle's top edge may reach.
    pub fn paddle_travel(&self) -> f64 {
        self.height - self.paddle_height
    }

    pub fn validate(&self) -> Result<()> {
        positive("arena.width", self.width)?;
        positive("arena.height", self.height)?;
        positive("arena.paddle_width", self.paddle_width)?;
        positive("arena.paddle_height", self.paddle_height)?;
        positive("arena.ball_radius", self.ball_radius)?;
        positive("arena.ball_speed_x", self.ball_speed_x)?;
        positive("arena.ball_speed_y", self.ball_speed_y)?;
        if !self.paddle_speed.is_finite() || self.paddle_speed < 0.0 {
            return Err(Error::config(
                "arena.paddle_speed",
                format!("must be >= 0, got {}", self.paddle_speed),
            ));
        }
        if self.paddle_height >= self.height {
            return Err(Error::config(
                "arena.paddle_height",
                format!(
                    "must be smaller than arena height {}, got {}",
                    self.height, self.paddle_height
                ),
            ));
        }
        if self.left_paddle_x < 0.0 || self.right_paddle_x() <= self.left_paddle_x {
            return Err(Error::config(
                "arena.left_paddle_x",
                "paddles must sit inside the arena with the left paddle first",
            ));
        }
        Ok(())
    }
}

/// Parameters handed through to the reference optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuroConfig {
    /// Neuron count per layer, inputs first, outputs last.
    pub layers: Vec<usize>,
    pub elitism: f64,
    pub random_behaviour: f64,
    pub mutation_rate: f64,
    pub mutation_range: f64,
    pub children_per_breed: usize,
}

impl Default for NeuroConfig {
    fn default() -> Self {
        Self {
            layers: vec![OBSERVATION_LEN, 8, 1],
            elitism: 0.2,
            random_behaviour: 0.2,
            mutation_rate: 0.2,
            mutation_range: 0.5,
            children_per_breed: 1,
        }
    }
}

impl NeuroConfig {
    pub fn validate(&self) -> Result<()> {
        if self.layers.len() < 2 {
            return Err(Error::config(
                "optimizer.layers",
                "needs at least an input and an output layer",
            ));
        }
        if self.layers[0] != OBSERVATION_LEN {
            return Err(Error::config(
                "optimizer.layers",
                format!(
                    "input layer must have {OBSERVATION_LEN} neurons, got {}",
                    self.layers[0]
                ),
            ));
        }
        if self.layers.iter().any(|&n| n == 0) {
            return Err(Error::config("optimizer.layers", "layers must be non-empty"));
        }
        unit_interval("optimizer.elitism", self.elitism)?;
        unit_interval("optimizer.random_behaviour", self.random_behaviour)?;
        unit_interval("optimizer.mutation_rate", self.mutation_rate)?;
        if !self.mutation_range.is_finite() || self.mutation_range < 0.0 {
            return Err(Error::config(
                "optimizer.mutation_range",
                format!("must be >= 0, got {}", self.mutation_range),
            ));
        }
        if self.children_per_breed == 0 {
            return Err(Error::config("optimizer.children_per_breed", "must be >= 1"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub frame_budget: u32,
    pub generation_count: u32,
    pub seed: u64,
    pub jobs: Option<usize>,
    pub arena: ArenaConfig,
    pub optimizer: NeuroConfig,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: POPULATION_SIZE_DEFAULT,
            frame_budget: FRAME_BUDGET_DEFAULT,
            generation_count: GENERATION_COUNT_DEFAULT,
            seed: SEED_DEFAULT,
            jobs: None,
            arena: ArenaConfig::default(),
            optimizer: NeuroConfig::default(),
        }
    }
}

impl EvolutionConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let data = fs::read(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("failed parsing config {}", path.display()))
    }

    /// Rejects settings that would make the first episode meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.frame_budget == 0 {
            return Err(Error::config("frame_budget", "must be > 0"));
        }
        if self.generation_count == 0 {
            return Err(Error::config("generation_count", "must be > 0"));
        }
        if self.population_size == 0 {
            return Err(Error::config("population_size", "must be > 0"));
        }
        if self.jobs == Some(0) {
            return Err(Error::config("jobs", "must be >= 1 when provided"));
        }
        self.arena.validate()?;
        self.optimizer.validate()
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::config(field, format!("must be > 0, got {value}")))
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::config(field, format!("must be in [0, 1], got {value}")))
    }
}
