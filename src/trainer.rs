use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::DqnAgent;
use crate::error::Result;
use crate::replay_buffer::Transition;

/// Default number of passes over the supplied samples
pub const DEFAULT_EPISODES: usize = 100;

/// Text encoded as the next state of every synthesized transition
pub const PLACEHOLDER_RESPONSE: &str = "processed_response";

/// One conversational record fed to the trainer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub role: String,
    pub content: String,
}

impl TrainingSample {
    pub fn new<R: Into<String>, C: Into<String>>(role: R, content: C) -> Self {
        TrainingSample {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Assistant turns are rewarded higher than anything else.
    pub fn reward(&self) -> f32 {
        if self.role == "assistant" {
            1.0
        } else {
            0.5
        }
    }
}

/// Snapshot of the agent's training progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingStats {
    pub buffer_size: usize,
    pub epsilon: f32,
    pub total_steps: usize,
}

impl From<&DqnAgent> for TrainingStats {
    fn from(agent: &DqnAgent) -> Self {
        TrainingStats {
            buffer_size: agent.buffer().len(),
            epsilon: agent.epsilon(),
            total_steps: agent.total_steps(),
        }
    }
}

/// Offline driver that replays conversational samples as synthetic
/// episodes.
///
/// Every sample of every episode becomes one non-terminal transition
/// followed by one call to [`DqnAgent::train`].
#[derive(Clone, Debug)]
pub struct Trainer {
    episodes: usize,
}

impl Trainer {
    pub fn new() -> Self {
        Trainer {
            episodes: DEFAULT_EPISODES,
        }
    }

    pub fn with_episodes(episodes: usize) -> Self {
        Trainer { episodes }
    }

    pub fn episodes(&self) -> usize {
        self.episodes
    }

    pub fn load_training_data(&self, agent: &mut DqnAgent, samples: &[TrainingSample]) -> Result<TrainingStats> {
        let next_state = agent.encode(PLACEHOLDER_RESPONSE);

        for episode in 0..self.episodes {
            for sample in samples {
                let state = agent.encode(&sample.content);
                let action = agent.select_action(state.view())?;
                agent.remember(Transition {
                    state,
                    action,
                    reward: sample.reward(),
                    next_state: next_state.clone(),
                    done: false,
                })?;
                agent.train()?;
            }
            debug!(episode, epsilon = agent.epsilon(), "training episode finished");
        }

        let stats = Self::get_training_stats(agent);
        info!(
            samples = samples.len(),
            episodes = self.episodes,
            buffer_size = stats.buffer_size,
            total_steps = stats.total_steps,
            epsilon = stats.epsilon,
            "training run complete"
        );
        Ok(stats)
    }

    pub fn get_training_stats(agent: &DqnAgent) -> TrainingStats {
        TrainingStats::from(agent)
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new()
    }
}
