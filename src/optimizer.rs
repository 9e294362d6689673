use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::layers::LayerGradients;

pub trait Optimizer {
    fn update_weights(&mut self, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);
}

/// Plain stochastic gradient descent.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// Gradient clipping methods
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum GradientClipper {
    /// Clip every gradient component into `[min, max]`
    ClipByValue { min: f32, max: f32 },

    /// No clipping
    None,
}

impl GradientClipper {
    /// Symmetric value clipping, or no clipping for a non-positive bound.
    pub fn by_value(bound: f32) -> Self {
        if bound > 0.0 {
            GradientClipper::ClipByValue { min: -bound, max: bound }
        } else {
            GradientClipper::None
        }
    }

    pub fn clip_weights(&self, gradients: &mut Array2<f32>) {
        match self {
            GradientClipper::ClipByValue { min, max } => {
                gradients.mapv_inplace(|g| g.max(*min).min(*max));
            }
            GradientClipper::None => {}
        }
    }

    pub fn clip_biases(&self, gradients: &mut Array1<f32>) {
        match self {
            GradientClipper::ClipByValue { min, max } => {
                gradients.mapv_inplace(|g| g.max(*min).min(*max));
            }
            GradientClipper::None => {}
        }
    }

    /// Clip one layer's parameter gradients in place.
    pub fn clip(&self, gradients: &mut LayerGradients) {
        self.clip_weights(&mut gradients.weights);
        self.clip_biases(&mut gradients.biases);
    }
}

impl Default for GradientClipper {
    fn default() -> Self {
        GradientClipper::None
    }
}
