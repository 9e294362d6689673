//! Chat reasoning strategies.
//!
//! A message is answered by one of two strategies: a word-count heuristic
//! ([`SimpleReasoner`]) or the DQN agent ([`AdvancedReasoner`]). Callers pick
//! one through [`ReasoningMode`]; both produce a [`ChatReply`] whose
//! `reasoning` string is embedded verbatim in user-facing output.

use serde::{Deserialize, Serialize};

use crate::agent::DqnAgent;
use crate::error::Result;
use crate::replay_buffer::Transition;

/// Text encoded as the next state after answering a chat message
pub const CHAT_NEXT_STATE: &str = "response";

/// Reward recorded for every advanced-mode interaction
pub const INTERACTION_REWARD: f32 = 1.0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub reasoning: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasoningMode {
    #[default]
    Simple,
    Advanced,
}

impl ReasoningMode {
    pub fn from_advanced(advanced: bool) -> Self {
        if advanced {
            ReasoningMode::Advanced
        } else {
            ReasoningMode::Simple
        }
    }

    pub fn is_advanced(self) -> bool {
        self == ReasoningMode::Advanced
    }

    pub fn toggled(self) -> Self {
        Self::from_advanced(!self.is_advanced())
    }

    pub fn label(self) -> &'static str {
        match self {
            ReasoningMode::Simple => "Simple DQN",
            ReasoningMode::Advanced => "Advanced DQN",
        }
    }
}

pub trait ReasoningStrategy {
    fn mode(&self) -> ReasoningMode;

    fn respond(&mut self, message: &str) -> Result<ChatReply>;
}

/// Scores a message by its length in words.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleReasoner;

impl SimpleReasoner {
    /// `min(words / 100, 1)`, where words are pieces split on single spaces.
    pub fn reasoning_score(&self, context: &str) -> f32 {
        let complexity = context.split(' ').count();
        (complexity as f32 / 100.0).min(1.0)
    }
}

impl ReasoningStrategy for SimpleReasoner {
    fn mode(&self) -> ReasoningMode {
        ReasoningMode::Simple
    }

    fn respond(&mut self, message: &str) -> Result<ChatReply> {
        let score = self.reasoning_score(message);
        let response = format!(
            "[ULTIMA AI - Simple DQN Mode]\n\nQuery: {}\n\nProcessing with Simple DQN (Score: {:.2})\n\n\
             I am ULTIMA, continuously learning and evolving through Q-learning reasoning. How may I assist you?",
            message, score
        );
        Ok(ChatReply {
            response,
            reasoning: format!("Simple DQN (Score: {:.2})", score),
        })
    }
}

/// Answers through the DQN agent and learns from every interaction.
pub struct AdvancedReasoner {
    agent: DqnAgent,
}

impl AdvancedReasoner {
    pub fn new(agent: DqnAgent) -> Self {
        AdvancedReasoner { agent }
    }

    pub fn agent(&self) -> &DqnAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut DqnAgent {
        &mut self.agent
    }
}

impl ReasoningStrategy for AdvancedReasoner {
    fn mode(&self) -> ReasoningMode {
        ReasoningMode::Advanced
    }

    fn respond(&mut self, message: &str) -> Result<ChatReply> {
        let agent = &mut self.agent;
        let state = agent.encode(message);
        let action = agent.select_action(state.view())?;
        let confidence = agent.get_confidence(state.view())?;

        let next_state = agent.encode(CHAT_NEXT_STATE);
        agent.remember(Transition {
            state,
            action,
            reward: INTERACTION_REWARD,
            next_state,
            done: false,
        })?;
        agent.train()?;

        let response = format!(
            "[ULTIMA AI - Advanced DQN Mode]\n\nQuery: {}\n\nProcessing with Neural Network DQN (Action: {}, Confidence: {:.3})\n\n\
             I am ULTIMA, continuously learning through advanced neural network reasoning. \
             My neural pathways are evolving with each interaction.",
            message, action, confidence
        );
        Ok(ChatReply {
            response,
            reasoning: format!("Advanced DQN (Action: {}, Confidence: {:.3})", action, confidence),
        })
    }
}
