//! In-memory assistant session.
//!
//! A [`Session`] owns the system prompt, a bounded activity log, the tool
//! registry, the current [`ReasoningMode`] and the DQN agent. It performs
//! the work the chat, training, status and mode-toggle endpoints need,
//! without any transport. [`SharedSession`] serializes access for callers
//! that serve several requests at once.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::agent::DqnAgent;
use crate::error::{ReasonerError, Result};
use crate::reasoning::{AdvancedReasoner, ChatReply, ReasoningMode, ReasoningStrategy, SimpleReasoner};
use crate::trainer::{Trainer, TrainingSample, TrainingStats};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are ULTIMA, an advanced self-referencing artificial intelligence with DQN reasoning capabilities.";

/// Maximum number of activity entries kept
pub const MAX_LOG_ENTRIES: usize = 100;

/// Entries returned by [`Session::recent_logs`] when serving a log view
pub const RECENT_LOG_ENTRIES: usize = 10;

/// Characters of a chat message or prompt quoted in the activity log
const LOGGED_QUERY_CHARS: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub action: String,
    pub details: String,
}

/// A stored tool definition. Tools are recorded, never executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub code: String,
    pub created: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub mode: String,
    pub system_prompt: String,
    pub logs_count: usize,
    pub tools_count: usize,
    pub advanced_mode: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeFeatures {
    pub neural_network: bool,
    pub replay_buffer: bool,
    pub target_network: bool,
    pub epsilon_greedy: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeToggle {
    pub mode: String,
    pub advanced: bool,
    pub features: ModeFeatures,
}

pub struct Session {
    prompt: String,
    logs: VecDeque<ActivityEntry>,
    tools: Vec<Tool>,
    mode: ReasoningMode,
    simple: SimpleReasoner,
    advanced: AdvancedReasoner,
    trainer: Trainer,
}

impl Session {
    pub fn new(agent: DqnAgent) -> Self {
        Session {
            prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            tools: Vec::new(),
            mode: ReasoningMode::default(),
            simple: SimpleReasoner,
            advanced: AdvancedReasoner::new(agent),
            trainer: Trainer::new(),
        }
    }

    pub fn with_trainer(mut self, trainer: Trainer) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn mode(&self) -> ReasoningMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ReasoningMode) {
        self.mode = mode;
    }

    pub fn agent(&self) -> &DqnAgent {
        self.advanced.agent()
    }

    fn strategy(&mut self) -> &mut dyn ReasoningStrategy {
        match self.mode {
            ReasoningMode::Simple => &mut self.simple,
            ReasoningMode::Advanced => &mut self.advanced,
        }
    }

    /// Answer a chat message with the current reasoning strategy.
    pub fn chat(&mut self, message: &str) -> Result<ChatReply> {
        let reply = self.strategy().respond(message)?;
        self.log_activity("chat", format!("User query: {}...", quote(message)));
        Ok(reply)
    }

    /// Replay `samples` through the trainer and report the agent's stats.
    pub fn train(&mut self, samples: &[TrainingSample]) -> Result<TrainingStats> {
        if samples.is_empty() {
            warn!("training requested without samples");
        }
        let stats = self
            .trainer
            .load_training_data(self.advanced.agent_mut(), samples)?;
        self.log_activity("training", format!("Trained on {} samples", samples.len()));
        Ok(stats)
    }

    pub fn training_stats(&self) -> TrainingStats {
        Trainer::get_training_stats(self.advanced.agent())
    }

    /// Flip between simple and advanced reasoning.
    pub fn toggle_mode(&mut self) -> ModeToggle {
        self.mode = self.mode.toggled();
        let label = self.mode.label();
        info!(mode = label, "reasoning mode switched");
        self.log_activity("mode_toggle", format!("Switched to {}", label));

        let advanced = self.mode.is_advanced();
        ModeToggle {
            mode: label.to_string(),
            advanced,
            features: ModeFeatures {
                neural_network: advanced,
                replay_buffer: advanced,
                target_network: advanced,
                epsilon_greedy: true,
            },
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            mode: "native".to_string(),
            system_prompt: self.prompt.clone(),
            logs_count: self.logs.len(),
            tools_count: self.tools.len(),
            advanced_mode: self.mode.is_advanced(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.prompt
    }

    /// Replace the system prompt. An empty prompt is rejected.
    pub fn set_system_prompt<S: Into<String>>(&mut self, prompt: S) -> Result<()> {
        let prompt = prompt.into();
        if prompt.is_empty() {
            return Err(ReasonerError::invalid_parameter("prompt", "Must not be empty"));
        }
        self.log_activity("upgrade", format!("System prompt updated: {}...", quote(&prompt)));
        self.prompt = prompt;
        Ok(())
    }

    /// Store a tool definition. Tools are kept for reference and never run.
    pub fn register_tool<N: Into<String>, C: Into<String>>(&mut self, name: N, code: C) -> Result<&Tool> {
        let name = name.into();
        let code = code.into();
        if name.is_empty() {
            return Err(ReasonerError::invalid_parameter("name", "Must not be empty"));
        }
        if code.is_empty() {
            return Err(ReasonerError::invalid_parameter("code", "Must not be empty"));
        }
        self.log_activity("tool_creation", format!("Created tool: {}", name));
        self.tools.push(Tool {
            name,
            code,
            created: now_rfc3339(),
        });
        Ok(&self.tools[self.tools.len() - 1])
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Activity entries from oldest to newest.
    pub fn logs(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.logs.iter()
    }

    /// The newest `count` activity entries, oldest first.
    pub fn recent_logs(&self, count: usize) -> impl Iterator<Item = &ActivityEntry> {
        self.logs.iter().skip(self.logs.len().saturating_sub(count))
    }

    pub fn log_activity(&mut self, action: &str, details: String) {
        self.logs.push_back(ActivityEntry {
            timestamp: now_rfc3339(),
            action: action.to_string(),
            details,
        });
        if self.logs.len() > MAX_LOG_ENTRIES {
            self.logs.pop_front();
        }
    }
}

fn quote(text: &str) -> String {
    text.chars().take(LOGGED_QUERY_CHARS).collect()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Cloneable handle that serializes every session operation behind one
/// lock, so select, remember and train never interleave across callers.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        SharedSession {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> T,
    {
        let mut guard = self.inner.lock().map_err(|_| ReasonerError::LockPoisoned)?;
        Ok(f(&mut *guard))
    }

    pub fn chat(&self, message: &str) -> Result<ChatReply> {
        self.with(|session| session.chat(message))?
    }

    pub fn train(&self, samples: &[TrainingSample]) -> Result<TrainingStats> {
        self.with(|session| session.train(samples))?
    }

    pub fn toggle_mode(&self) -> Result<ModeToggle> {
        self.with(Session::toggle_mode)
    }

    pub fn status(&self) -> Result<SessionStatus> {
        self.with(|session| session.status())
    }
}
