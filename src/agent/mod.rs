//! # DQN Agent Module
//!
//! The reasoning agent behind advanced mode: an epsilon-greedy Deep
//! Q-Network with an experience replay buffer and a periodically
//! synchronized target network.
//!
//! ## Training step
//!
//! Each call to [`DqnAgent::train`] samples a batch from the replay buffer
//! (uniformly, with replacement) and, for every transition, computes
//!
//! - `target = reward` for terminal transitions,
//! - `target = reward + gamma * max_a target_network(next_state)[a]` otherwise,
//!
//! then backpropagates `0.5 * (target - q_network(state)[action])^2` through
//! all layers. The averaged, clipped gradients are applied with SGD. After
//! the update the step counter advances, the target network is refreshed
//! every `target_update_freq` steps, and epsilon decays toward its floor.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ultima::agent::{DqnAgentBuilder, DqnConfig};
//!
//! let config = DqnConfig::from_json_file("agent.json").unwrap_or_default();
//! let mut agent = DqnAgentBuilder::new().config(config).seed(7).build().unwrap();
//!
//! let state = agent.encode("What can you do?");
//! let action = agent.select_action(state.view()).unwrap();
//! let confidence = agent.get_confidence(state.view()).unwrap();
//! println!("action {} confidence {:.3}", action, confidence);
//! ```

mod config;
mod dqn;

pub use config::{DqnAgentBuilder, DqnConfig};
pub use dqn::DqnAgent;
#[cfg(test)]
pub(crate) use dqn::{argmax, AgentSnapshot};
