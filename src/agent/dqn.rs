use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::DqnConfig;
use crate::encoder::StateEncoder;
use crate::error::{ReasonerError, Result};
use crate::network::{NetworkParts, QNetwork};
use crate::optimizer::{GradientClipper, SGD};
use crate::replay_buffer::{ReplayBuffer, Transition};

/// Guards the confidence ratio against a zero Q-value spread
const CONFIDENCE_STABILITY: f32 = 1e-8;

/// Deep Q-Network agent with a target network and experience replay.
///
/// The agent owns an online network used for action selection, a target
/// network used for bootstrapped targets, and the replay buffer it trains
/// from. All randomness comes from one seedable generator.
///
/// # Example
///
/// ```rust
/// use ultima::agent::DqnAgentBuilder;
/// use ultima::replay_buffer::Transition;
///
/// let mut agent = DqnAgentBuilder::new().seed(42).build().unwrap();
///
/// let state = agent.encode("hello");
/// let action = agent.select_action(state.view()).unwrap();
/// agent
///     .remember(Transition {
///         state,
///         action,
///         reward: 1.0,
///         next_state: agent.encode("response"),
///         done: false,
///     })
///     .unwrap();
///
/// // Fewer than 32 transitions stored, so nothing is trained yet
/// assert_eq!(agent.train().unwrap(), None);
/// assert_eq!(agent.total_steps(), 0);
/// ```
pub struct DqnAgent {
    config: DqnConfig,
    encoder: StateEncoder,
    q_network: QNetwork,
    target_network: QNetwork,
    buffer: ReplayBuffer,
    optimizer: SGD,
    clipper: GradientClipper,
    epsilon: f32,
    total_steps: usize,
    target_syncs: usize,
    rng: StdRng,
}

/// Serializable agent state written by [`DqnAgent::save`].
///
/// Network parameters are stored unchecked and validated on load. The
/// replay buffer is not part of a snapshot.
#[derive(Serialize, Deserialize)]
pub(crate) struct AgentSnapshot {
    pub(crate) config: DqnConfig,
    pub(crate) epsilon: f32,
    pub(crate) total_steps: usize,
    pub(crate) target_syncs: usize,
    pub(crate) q_network: NetworkParts,
    pub(crate) target_network: NetworkParts,
}

impl DqnAgent {
    /// Create an agent, seeding its generator from `config.seed` or from
    /// system entropy when no seed is given.
    pub fn new(config: DqnConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Create an agent drawing all randomness from `rng`.
    pub fn with_rng(config: DqnConfig, mut rng: StdRng) -> Result<Self> {
        config.validate()?;
        let q_network = QNetwork::new(config.state_size, config.action_size, &mut rng)?;
        let target_network = QNetwork::new(config.state_size, config.action_size, &mut rng)?;
        Self::assemble(config, q_network, target_network, rng)
    }

    /// Create an agent around existing networks.
    pub fn with_networks(
        config: DqnConfig,
        q_network: QNetwork,
        target_network: QNetwork,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        for network in [&q_network, &target_network] {
            if network.state_size() != config.state_size {
                return Err(ReasonerError::invalid_dimension(
                    format!("state size {}", config.state_size),
                    format!("state size {}", network.state_size()),
                ));
            }
            if network.action_size() != config.action_size {
                return Err(ReasonerError::invalid_dimension(
                    format!("action size {}", config.action_size),
                    format!("action size {}", network.action_size()),
                ));
            }
        }
        Self::assemble(config, q_network, target_network, rng)
    }

    fn assemble(config: DqnConfig, q_network: QNetwork, target_network: QNetwork, rng: StdRng) -> Result<Self> {
        Ok(DqnAgent {
            encoder: StateEncoder::new(config.state_size),
            buffer: ReplayBuffer::new(config.buffer_capacity),
            clipper: GradientClipper::by_value(config.gradient_clip),
            optimizer: SGD::new(),
            epsilon: config.epsilon,
            total_steps: 0,
            target_syncs: 0,
            q_network,
            target_network,
            config,
            rng,
        })
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Override the exploration rate, clamped to `[0, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Number of target-network synchronizations performed so far.
    pub fn target_syncs(&self) -> usize {
        self.target_syncs
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn q_network(&self) -> &QNetwork {
        &self.q_network
    }

    pub fn target_network(&self) -> &QNetwork {
        &self.target_network
    }

    pub fn encode(&self, text: &str) -> Array1<f32> {
        self.encoder.encode(text)
    }

    /// Select action using epsilon-greedy policy
    pub fn select_action(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.q_network.forward(state)?;
        if self.rng.gen::<f32>() < self.epsilon {
            Ok(self.rng.gen_range(0..self.config.action_size))
        } else {
            argmax(&q_values)
        }
    }

    /// Heuristic spread signal `max_q / (max_q - min_q + 1e-8)`.
    ///
    /// This is not a probability; it only indicates how far the best
    /// action stands out.
    pub fn get_confidence(&self, state: ArrayView1<f32>) -> Result<f32> {
        let q_values = self.q_network.forward(state)?;
        let max_q = q_values.iter().fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let min_q = q_values.iter().fold(f32::INFINITY, |m, &v| m.min(v));
        Ok(max_q / (max_q - min_q + CONFIDENCE_STABILITY))
    }

    /// Store a transition in the replay buffer.
    pub fn remember(&mut self, transition: Transition) -> Result<()> {
        let state_size = self.config.state_size;
        if transition.state.len() != state_size {
            return Err(ReasonerError::length_mismatch(state_size, transition.state.len()));
        }
        if transition.next_state.len() != state_size {
            return Err(ReasonerError::length_mismatch(state_size, transition.next_state.len()));
        }
        if transition.action >= self.config.action_size {
            return Err(ReasonerError::invalid_dimension(
                format!("action < {}", self.config.action_size),
                format!("action {}", transition.action),
            ));
        }
        self.buffer.add(transition);
        Ok(())
    }

    /// Run one training step on a sampled batch.
    ///
    /// Returns `Ok(None)` without touching any state while the buffer
    /// holds fewer than `batch_size` transitions. Otherwise returns the
    /// batch's mean squared TD error, measured before the update.
    pub fn train(&mut self) -> Result<Option<f32>> {
        let batch_size = self.config.batch_size;
        if self.buffer.len() < batch_size {
            return Ok(None);
        }

        let batch = self.buffer.sample(batch_size, &mut self.rng);
        let mut gradients = self.q_network.zero_gradients();
        let mut squared_error = 0.0;

        for transition in &batch {
            let trace = self.q_network.forward_trace(transition.state.view())?;
            let target = if transition.done {
                transition.reward
            } else {
                let next_q = self.target_network.forward(transition.next_state.view())?;
                let max_next_q = next_q.iter().fold(f32::NEG_INFINITY, |m, &v| m.max(v));
                transition.reward + self.config.gamma * max_next_q
            };
            let error = target - trace.output()[transition.action];
            squared_error += error * error;

            // d(0.5 * error^2)/dq for the taken action only
            let mut output_error = Array1::zeros(self.config.action_size);
            output_error[transition.action] = -error;
            let sample_gradients = self.q_network.backward(&trace, output_error.view());
            for (total, sample) in gradients.iter_mut().zip(&sample_gradients) {
                total.accumulate(sample);
            }
        }

        let batch_len = batch.len() as f32;
        for grads in gradients.iter_mut() {
            grads.scale(1.0 / batch_len);
        }
        self.q_network.apply_gradients(
            &mut gradients,
            &mut self.optimizer,
            &self.clipper,
            self.config.learning_rate,
        );

        self.total_steps += 1;
        if self.total_steps % self.config.target_update_freq == 0 {
            self.update_target_network();
        }
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);

        let loss = squared_error / batch_len;
        debug!(step = self.total_steps, loss, epsilon = self.epsilon, "dqn training step");
        Ok(Some(loss))
    }

    /// Update target network weights from main network
    pub fn update_target_network(&mut self) {
        self.target_network.copy_from(&self.q_network);
        self.target_syncs += 1;
        debug!(step = self.total_steps, syncs = self.target_syncs, "target network synchronized");
    }

    /// Save the networks and schedule state to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let snapshot = AgentSnapshot {
            config: self.config.clone(),
            epsilon: self.epsilon,
            total_steps: self.total_steps,
            target_syncs: self.target_syncs,
            q_network: NetworkParts {
                layers: self.q_network.layer_parts(),
            },
            target_network: NetworkParts {
                layers: self.target_network.layer_parts(),
            },
        };
        let serialized = bincode::serialize(&snapshot)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load an agent from disk. The replay buffer starts empty.
    ///
    /// Layer shapes, the layer size chain and the network sizes against
    /// the stored config are all checked; a malformed snapshot fails with
    /// `InvalidDimension`.
    pub fn load<P: AsRef<Path>>(path: P, rng: StdRng) -> Result<Self> {
        let data = std::fs::read(path)?;
        let snapshot: AgentSnapshot = bincode::deserialize(&data)?;
        let q_network = QNetwork::from_layer_parts(snapshot.q_network.layers)?;
        let target_network = QNetwork::from_layer_parts(snapshot.target_network.layers)?;
        let mut agent = Self::with_networks(snapshot.config, q_network, target_network, rng)?;
        agent.epsilon = snapshot.epsilon;
        agent.total_steps = snapshot.total_steps;
        agent.target_syncs = snapshot.target_syncs;
        Ok(agent)
    }
}

/// Index of the largest value, ties going to the lowest index.
pub(crate) fn argmax(values: &Array1<f32>) -> Result<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some((idx, value));
        }
    }
    best.map(|(idx, _)| idx)
        .ok_or_else(|| ReasonerError::NumericalError("No valid Q-values".to_string()))
}
