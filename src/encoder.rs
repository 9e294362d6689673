use ndarray::Array1;

/// Default length of an encoded state vector
pub const DEFAULT_STATE_SIZE: usize = 128;

/// Maps free-form text onto a fixed-length feature vector.
///
/// Each character position `i` below the vector length carries the
/// character code scaled by `1/255`. Codes above 255 saturate at `1.0`.
/// Positions past the end of the text are zero, and text longer than the
/// vector is truncated.
///
/// ```
/// use ultima::encoder::StateEncoder;
///
/// let encoder = StateEncoder::new(4);
/// let state = encoder.encode("AB");
/// assert_eq!(state.len(), 4);
/// assert_eq!(state[0], 65.0 / 255.0);
/// assert_eq!(state[3], 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateEncoder {
    state_size: usize,
}

impl StateEncoder {
    pub fn new(state_size: usize) -> Self {
        StateEncoder { state_size }
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn encode(&self, text: &str) -> Array1<f32> {
        let mut encoded = Array1::zeros(self.state_size);
        for (slot, ch) in encoded.iter_mut().zip(text.chars()) {
            *slot = (ch as u32).min(255) as f32 / 255.0;
        }
        encoded
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_SIZE)
    }
}
