use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of transitions kept by a replay buffer
pub const DEFAULT_CAPACITY: usize = 10_000;

/// One step of experience.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

/// Bounded FIFO store of transitions.
///
/// Once full, every `add` evicts the oldest transition. Sampling draws
/// uniformly *with replacement*, so one batch may contain duplicates.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    pub fn add(&mut self, transition: Transition) {
        self.buffer.push_back(transition);
        if self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    /// Draw `min(batch_size, len)` transitions, each picked independently.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<&Transition> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let count = batch_size.min(self.buffer.len());
        (0..count)
            .map(|_| &self.buffer[rng.gen_range(0..self.buffer.len())])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
