//! Reference optimizer: fixed-topology feed-forward networks evolved with
//! elitism, uniform crossover and additive weight mutation.
//!
//! The core only sees it through [`Optimizer`] and [`Controller`]; any other
//! optimizer implementing those traits can be dropped in instead.

use crate::config::NeuroConfig;
use crate::controller::Controller;
use crate::error::Error;
use crate::orchestrator::Optimizer;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Exported form of a [`Network`]: layer sizes plus every weight, layer by
/// layer, neuron by neuron.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkSave {
    pub neurons: Vec<usize>,
    pub weights: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    layers: Vec<usize>,
    weights: Vec<f64>,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn weight_count(layers: &[usize]) -> usize {
    layers.windows(2).map(|pair| pair[0] * pair[1]).sum()
}

impl Network {
    /// Weights drawn uniformly from [-1, 1).
    pub fn random(layers: &[usize], rng: &mut fastrand::Rng) -> Self {
        let weights = (0..weight_count(layers))
            .map(|_| rng.f64() * 2.0 - 1.0)
            .collect();
        Self {
            layers: layers.to_vec(),
            weights,
        }
    }

    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn to_save(&self) -> NetworkSave {
        NetworkSave {
            neurons: self.layers.clone(),
            weights: self.weights.clone(),
        }
    }

    pub fn from_save(save: NetworkSave) -> Result<Self> {
        if save.neurons.len() < 2 || save.neurons.contains(&0) {
            return Err(anyhow!(
                "network needs at least two non-empty layers, got {:?}",
                save.neurons
            ));
        }
        let expected = weight_count(&save.neurons);
        if save.weights.len() != expected {
            return Err(anyhow!(
                "network shape {:?} needs {expected} weights, got {}",
                save.neurons,
                save.weights.len()
            ));
        }
        if let Some(bad) = save.weights.iter().find(|w| !w.is_finite()) {
            return Err(anyhow!("network weight is not finite: {bad}"));
        }
        Ok(Self {
            layers: save.neurons,
            weights: save.weights,
        })
    }
}

impl Controller for Network {
    /// Returns no outputs when the input length does not match the input layer.
    fn compute(&self, inputs: &[f64]) -> Vec<f64> {
        if self.layers.first() != Some(&inputs.len()) {
            return Vec::new();
        }

        let mut values = inputs.to_vec();
        let mut offset = 0;
        for pair in self.layers.windows(2) {
            let (prev, size) = (pair[0], pair[1]);
            let mut next = Vec::with_capacity(size);
            for _ in 0..size {
                let incoming = &self.weights[offset..offset + prev];
                let sum: f64 = values.iter().zip(incoming).map(|(v, w)| v * w).sum();
                next.push(sigmoid(sum));
                offset += prev;
            }
            values = next;
        }
        values
    }

    fn export(&self) -> serde_json::Value {
        serde_json::to_value(self.to_save()).unwrap_or(serde_json::Value::Null)
    }
}

pub struct Neuroevolution {
    config: NeuroConfig,
    population_size: usize,
    rng: fastrand::Rng,
    scored: Vec<(Network, f64)>,
}

impl Neuroevolution {
    /// Rejects configurations the breeding loop cannot make progress with.
    pub fn new(
        config: NeuroConfig,
        population_size: usize,
        seed: u64,
    ) -> crate::error::Result<Self> {
        if population_size == 0 {
            return Err(Error::config("population_size", "must be > 0"));
        }
        config.validate()?;
        Ok(Self {
            config,
            population_size,
            rng: fastrand::Rng::with_seed(seed),
            scored: Vec::with_capacity(population_size),
        })
    }

    fn random_network(&mut self) -> Network {
        Network::random(&self.config.layers, &mut self.rng)
    }

    fn random_population(&mut self) -> Vec<Network> {
        (0..self.population_size)
            .map(|_| self.random_network())
            .collect()
    }

    fn breed(&mut self, a: &Network, b: &Network) -> Vec<Network> {
        let mut children = Vec::with_capacity(self.config.children_per_breed);
        for _ in 0..self.config.children_per_breed {
            let mut child = a.clone();
            for (weight, other) in child.weights.iter_mut().zip(&b.weights) {
                if self.rng.f64() <= 0.5 {
                    *weight = *other;
                }
            }
            for weight in child.weights.iter_mut() {
                if self.rng.f64() <= self.config.mutation_rate {
                    *weight += self.rng.f64() * self.config.mutation_range * 2.0
                        - self.config.mutation_range;
                }
            }
            children.push(child);
        }
        children
    }

    fn share(&self, fraction: f64) -> usize {
        (fraction * self.population_size as f64).round() as usize
    }
}

impl Optimizer for Neuroevolution {
    type Controller = Network;

    fn next_generation(&mut self) -> Vec<Network> {
        let mut ranked = std::mem::take(&mut self.scored);
        if ranked.is_empty() {
            return self.random_population();
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let target = self.population_size;
        let mut next = Vec::with_capacity(target);

        let elites = self.share(self.config.elitism).min(ranked.len()).min(target);
        next.extend(ranked.iter().take(elites).map(|(network, _)| network.clone()));

        let randoms = self.share(self.config.random_behaviour);
        for _ in 0..randoms {
            if next.len() >= target {
                break;
            }
            next.push(self.random_network());
        }

        if ranked.len() < 2 {
            while next.len() < target {
                next.push(self.random_network());
            }
            return next;
        }

        // Pair every genome with each better-ranked one, best pairs first,
        // cycling until the population is full.
        let mut max = 1;
        while next.len() < target {
            for i in 0..max {
                let children = self.breed(&ranked[i].0, &ranked[max].0);
                for child in children {
                    if next.len() >= target {
                        break;
                    }
                    next.push(child);
                }
                if next.len() >= target {
                    break;
                }
            }
            max += 1;
            if max >= ranked.len() {
                max = 1;
            }
        }
        next
    }

    fn report_score(&mut self, controller: &Network, score: f64) {
        self.scored.push((controller.clone(), score));
    }
}
