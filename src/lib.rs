//! # ULTIMA - DQN Reasoning Core
//!
//! ULTIMA is the reasoning engine behind a chat-style assistant. Messages are
//! answered either by a lightweight heuristic or by a Deep Q-Network agent
//! that learns from every interaction.
//!
//! ## Key Features
//!
//! - **State Encoding**: fixed-length character-code features from free text
//! - **Q-Network**: `state -> 128 -> 64 -> actions` feed-forward approximator with ReLU
//! - **Experience Replay**: bounded FIFO buffer with uniform sampling
//! - **DQN Agent**: epsilon-greedy policy, target network, backpropagated TD updates
//! - **Trainer**: synthetic-episode replay of conversational samples
//! - **Session**: prompt, activity log, mode toggle, and a lock-guarded shared handle
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ultima::agent::DqnAgentBuilder;
//! use ultima::session::Session;
//! use ultima::trainer::TrainingSample;
//!
//! let agent = DqnAgentBuilder::new().seed(42).build().unwrap();
//! let mut session = Session::new(agent);
//!
//! session.toggle_mode();
//! let reply = session.chat("How do neural networks learn?").unwrap();
//! println!("{}", reply.reasoning);
//!
//! let stats = session
//!     .train(&[TrainingSample::new("user", "hi"), TrainingSample::new("assistant", "hello")])
//!     .unwrap();
//! println!("buffer {} epsilon {:.3}", stats.buffer_size, stats.epsilon);
//! ```
//!
//! ## Module Organization
//!
//! - [`agent`] - DQN agent, configuration and builder
//! - [`encoder`] - Text to state-vector encoding
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense ReLU layer with backpropagation
//! - [`network`] - Q-network composition
//! - [`optimizer`] - SGD and gradient clipping
//! - [`reasoning`] - Simple and advanced reasoning strategies
//! - [`replay_buffer`] - Experience replay
//! - [`session`] - Assistant session state
//! - [`trainer`] - Batch training driver

pub mod agent;
pub mod encoder;
pub mod error;
pub mod layers;
pub mod network;
pub mod optimizer;
pub mod reasoning;
pub mod replay_buffer;
pub mod session;
pub mod trainer;

pub use error::{ReasonerError, Result};

#[cfg(test)]
mod tests;
