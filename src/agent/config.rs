use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::DqnAgent;
use crate::encoder::DEFAULT_STATE_SIZE;
use crate::error::{ReasonerError, Result};
use crate::replay_buffer::DEFAULT_CAPACITY;

/// Hyperparameters of a [`DqnAgent`].
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides:
///
/// ```
/// use ultima::agent::DqnConfig;
///
/// let config = DqnConfig::from_json_str(r#"{ "gamma": 0.9, "seed": 7 }"#).unwrap();
/// assert_eq!(config.gamma, 0.9);
/// assert_eq!(config.action_size, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub state_size: usize,
    pub action_size: usize,
    pub learning_rate: f32,
    /// Discount factor applied to the bootstrapped next-state value
    pub gamma: f32,
    /// Starting exploration rate
    pub epsilon: f32,
    pub min_epsilon: f32,
    /// Multiplicative decay applied after every training step
    pub epsilon_decay: f32,
    pub target_update_freq: usize,
    pub buffer_capacity: usize,
    /// Transitions per training step; also the minimum buffer fill before
    /// training starts
    pub batch_size: usize,
    /// Symmetric per-component gradient bound, `0` disables clipping
    pub gradient_clip: f32,
    pub seed: Option<u64>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            state_size: DEFAULT_STATE_SIZE,
            action_size: 64,
            learning_rate: 0.001,
            gamma: 0.99,
            epsilon: 1.0,
            min_epsilon: 0.01,
            epsilon_decay: 0.995,
            target_update_freq: 100,
            buffer_capacity: DEFAULT_CAPACITY,
            batch_size: 32,
            gradient_clip: 1.0,
            seed: None,
        }
    }
}

impl DqnConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DqnConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 {
            return Err(ReasonerError::invalid_parameter("state_size", "Must be greater than 0"));
        }
        if self.action_size == 0 {
            return Err(ReasonerError::invalid_parameter("action_size", "Must be greater than 0"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ReasonerError::invalid_parameter("learning_rate", "Must be a positive number"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ReasonerError::invalid_parameter("gamma", "Must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ReasonerError::invalid_parameter("epsilon", "Must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.min_epsilon) {
            return Err(ReasonerError::invalid_parameter("min_epsilon", "Must be within [0, 1]"));
        }
        if self.min_epsilon > self.epsilon {
            return Err(ReasonerError::invalid_parameter("min_epsilon", "Must not exceed epsilon"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(ReasonerError::invalid_parameter("epsilon_decay", "Must be within (0, 1]"));
        }
        if self.target_update_freq == 0 {
            return Err(ReasonerError::invalid_parameter("target_update_freq", "Must be greater than 0"));
        }
        if self.buffer_capacity == 0 {
            return Err(ReasonerError::invalid_parameter("buffer_capacity", "Must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(ReasonerError::invalid_parameter("batch_size", "Must be greater than 0"));
        }
        if self.gradient_clip < 0.0 || !self.gradient_clip.is_finite() {
            return Err(ReasonerError::invalid_parameter("gradient_clip", "Must be a non-negative number"));
        }
        Ok(())
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    config: DqnConfig,
    rng: Option<StdRng>,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            config: DqnConfig::default(),
            rng: None,
        }
    }

    pub fn config(mut self, config: DqnConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state_size(mut self, size: usize) -> Self {
        self.config.state_size = size;
        self
    }

    pub fn action_size(mut self, size: usize) -> Self {
        self.config.action_size = size;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn min_epsilon(mut self, min_epsilon: f32) -> Self {
        self.config.min_epsilon = min_epsilon;
        self
    }

    pub fn epsilon_decay(mut self, decay: f32) -> Self {
        self.config.epsilon_decay = decay;
        self
    }

    pub fn target_update_freq(mut self, freq: usize) -> Self {
        self.config.target_update_freq = freq;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn gradient_clip(mut self, bound: f32) -> Self {
        self.config.gradient_clip = bound;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Use an explicit random source instead of one derived from the seed.
    pub fn rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        match self.rng {
            Some(rng) => DqnAgent::with_rng(self.config, rng),
            None => DqnAgent::new(self.config),
        }
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
