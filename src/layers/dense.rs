use ndarray::{Array1, Array2, ArrayView1, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ReasonerError, Result};

/// A fully connected layer with a ReLU nonlinearity.
///
/// Weights are stored as an `output_size x input_size` matrix, so row `i`
/// holds the incoming weights of output unit `i`:
///
/// `output[i] = max(0, weights[i] . input + biases[i])`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "LayerParts")]
pub struct DenseLayer {
    weights: Array2<f32>,
    biases: Array1<f32>,
}

/// Unchecked layer parameters, as stored in snapshots.
///
/// Converting into a [`DenseLayer`] validates the shapes.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LayerParts {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl TryFrom<LayerParts> for DenseLayer {
    type Error = ReasonerError;

    fn try_from(parts: LayerParts) -> Result<Self> {
        DenseLayer::from_parts(parts.weights, parts.biases)
    }
}

impl From<&DenseLayer> for LayerParts {
    fn from(layer: &DenseLayer) -> Self {
        LayerParts {
            weights: layer.weights.clone(),
            biases: layer.biases.clone(),
        }
    }
}

/// Gradients of the squared error with respect to one layer's parameters,
/// plus the error signal handed to the previous layer.
#[derive(Clone, Debug)]
pub struct LayerGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub input_error: Array1<f32>,
}

impl LayerGradients {
    pub fn zeros(input_size: usize, output_size: usize) -> Self {
        LayerGradients {
            weights: Array2::zeros((output_size, input_size)),
            biases: Array1::zeros(output_size),
            input_error: Array1::zeros(input_size),
        }
    }

    /// Accumulate another sample's parameter gradients into this one.
    pub fn accumulate(&mut self, other: &LayerGradients) {
        self.weights += &other.weights;
        self.biases += &other.biases;
    }

    pub fn scale(&mut self, factor: f32) {
        self.weights.mapv_inplace(|g| g * factor);
        self.biases.mapv_inplace(|g| g * factor);
    }
}

impl DenseLayer {
    /// Create a new dense layer with weights and biases drawn uniformly
    /// from `[-1, 1)` using the supplied random source.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(ReasonerError::invalid_dimension(
                "non-zero layer sizes".to_string(),
                format!("{} inputs, {} outputs", input_size, output_size),
            ));
        }
        let init = Uniform::new(-1.0f32, 1.0f32);
        let weights = Array2::random_using((output_size, input_size), init, rng);
        let biases = Array1::random_using(output_size, init, rng);
        Ok(DenseLayer { weights, biases })
    }

    /// Build a layer from explicit parameters.
    pub fn from_parts(weights: Array2<f32>, biases: Array1<f32>) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows == 0 || cols == 0 {
            return Err(ReasonerError::invalid_dimension(
                "non-empty weight matrix".to_string(),
                format!("{}x{}", rows, cols),
            ));
        }
        if biases.len() != rows {
            return Err(ReasonerError::invalid_dimension(
                format!("{} biases", rows),
                format!("{} biases", biases.len()),
            ));
        }
        Ok(DenseLayer { weights, biases })
    }

    pub fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn output_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn biases(&self) -> &Array1<f32> {
        &self.biases
    }

    pub(crate) fn weights_mut(&mut self) -> &mut Array2<f32> {
        &mut self.weights
    }

    pub(crate) fn biases_mut(&mut self) -> &mut Array1<f32> {
        &mut self.biases
    }

    /// Perform a forward pass for a single input vector.
    pub fn forward(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        Ok(self.pre_activation(input)?.mapv(relu))
    }

    /// Affine part of the forward pass, before the ReLU is applied.
    pub fn pre_activation(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        if input.len() != self.input_size() {
            return Err(ReasonerError::length_mismatch(self.input_size(), input.len()));
        }
        Ok(self.weights.dot(&input) + &self.biases)
    }

    /// Compute gradients for this layer given the error at its output.
    ///
    /// `input` and `pre_activation` must be the values recorded during the
    /// forward pass that produced the output.
    pub fn backward(
        &self,
        input: ArrayView1<f32>,
        pre_activation: ArrayView1<f32>,
        output_error: ArrayView1<f32>,
    ) -> LayerGradients {
        let delta = &output_error * &pre_activation.mapv(relu_derivative);
        let weights = delta
            .view()
            .insert_axis(Axis(1))
            .dot(&input.insert_axis(Axis(0)));
        let input_error = self.weights.t().dot(&delta);
        LayerGradients {
            weights,
            biases: delta,
            input_error,
        }
    }
}

#[inline]
fn relu(x: f32) -> f32 {
    x.max(0.0)
}

#[inline]
fn relu_derivative(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}
