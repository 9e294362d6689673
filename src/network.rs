use ndarray::{Array1, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ReasonerError, Result};
use crate::layers::{DenseLayer, LayerGradients, LayerParts};
use crate::optimizer::{GradientClipper, Optimizer};

/// Hidden layer widths of the default Q-network
pub const HIDDEN_SIZES: [usize; 2] = [128, 64];

/// A feed-forward Q-value approximator.
///
/// The default shape is `state_size -> 128 -> 64 -> action_size`, with a
/// ReLU applied by every layer. Forward passes take `&self` and never
/// touch the weights, so repeated calls on the same state agree exactly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "NetworkParts")]
pub struct QNetwork {
    layers: Vec<DenseLayer>,
}

/// Unchecked network parameters; see [`QNetwork::from_layer_parts`].
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NetworkParts {
    pub layers: Vec<LayerParts>,
}

impl TryFrom<NetworkParts> for QNetwork {
    type Error = ReasonerError;

    fn try_from(parts: NetworkParts) -> Result<Self> {
        QNetwork::from_layer_parts(parts.layers)
    }
}

/// Intermediate values recorded during a forward pass, needed for
/// backpropagation.
#[derive(Clone, Debug)]
pub struct ForwardTrace {
    inputs: Vec<Array1<f32>>,
    pre_activations: Vec<Array1<f32>>,
    output: Array1<f32>,
}

impl ForwardTrace {
    pub fn output(&self) -> &Array1<f32> {
        &self.output
    }
}

impl QNetwork {
    /// Create a network with the default hidden layers.
    pub fn new<R: Rng + ?Sized>(state_size: usize, action_size: usize, rng: &mut R) -> Result<Self> {
        let sizes = [state_size, HIDDEN_SIZES[0], HIDDEN_SIZES[1], action_size];
        Self::from_sizes(&sizes, rng)
    }

    /// Create a network from a list of layer sizes, including the input
    /// and output sizes.
    pub fn from_sizes<R: Rng + ?Sized>(layer_sizes: &[usize], rng: &mut R) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(ReasonerError::invalid_parameter(
                "layer_sizes",
                "Must have at least an input and an output size",
            ));
        }
        let layers = layer_sizes
            .windows(2)
            .map(|window| DenseLayer::new(window[0], window[1], &mut *rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(QNetwork { layers })
    }

    /// Assemble a network from existing layers, checking that adjacent
    /// layer sizes line up.
    pub fn with_layers(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(ReasonerError::invalid_dimension(
                "at least one layer".to_string(),
                "0 layers".to_string(),
            ));
        }
        for pair in layers.windows(2) {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(ReasonerError::invalid_dimension(
                    format!("{} inputs", pair[0].output_size()),
                    format!("{} inputs", pair[1].input_size()),
                ));
            }
        }
        Ok(QNetwork { layers })
    }

    /// Rebuild a network from raw parameters, checking every layer shape
    /// and the size chain between layers.
    pub fn from_layer_parts(parts: Vec<LayerParts>) -> Result<Self> {
        let layers = parts
            .into_iter()
            .map(DenseLayer::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::with_layers(layers)
    }

    pub fn layer_parts(&self) -> Vec<LayerParts> {
        self.layers.iter().map(LayerParts::from).collect()
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn state_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn action_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    /// Compute the Q-values for a state.
    pub fn forward(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.check_state(state)?;
        let mut current = state.to_owned();
        for layer in &self.layers {
            current = layer.forward(current.view())?;
        }
        Ok(current)
    }

    /// Forward pass that keeps every layer's input and pre-activation.
    pub fn forward_trace(&self, state: ArrayView1<f32>) -> Result<ForwardTrace> {
        self.check_state(state)?;
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut current = state.to_owned();
        for layer in &self.layers {
            let pre = layer.pre_activation(current.view())?;
            let next = pre.mapv(|v| v.max(0.0));
            inputs.push(current);
            pre_activations.push(pre);
            current = next;
        }
        Ok(ForwardTrace {
            inputs,
            pre_activations,
            output: current,
        })
    }

    /// Backpropagate an error at the output through every layer.
    ///
    /// Returns one gradient set per layer, in layer order.
    pub fn backward(&self, trace: &ForwardTrace, output_error: ArrayView1<f32>) -> Vec<LayerGradients> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_error.to_owned();
        for (i, layer) in self.layers.iter().enumerate().rev() {
            let grads = layer.backward(
                trace.inputs[i].view(),
                trace.pre_activations[i].view(),
                current_error.view(),
            );
            current_error = grads.input_error.clone();
            gradients.push(grads);
        }
        gradients.reverse();
        gradients
    }

    /// Zeroed gradient accumulators matching this network's shape.
    pub fn zero_gradients(&self) -> Vec<LayerGradients> {
        self.layers
            .iter()
            .map(|layer| LayerGradients::zeros(layer.input_size(), layer.output_size()))
            .collect()
    }

    /// Clip and apply per-layer gradients with the given optimizer.
    pub fn apply_gradients<O: Optimizer>(
        &mut self,
        gradients: &mut [LayerGradients],
        optimizer: &mut O,
        clipper: &GradientClipper,
        learning_rate: f32,
    ) {
        for (layer, grads) in self.layers.iter_mut().zip(gradients.iter_mut()) {
            clipper.clip(grads);
            optimizer.update_weights(layer.weights_mut(), &grads.weights, learning_rate);
            optimizer.update_biases(layer.biases_mut(), &grads.biases, learning_rate);
        }
    }

    /// Deep-copy every layer's weights and biases from `other`.
    pub fn copy_from(&mut self, other: &QNetwork) {
        self.layers.clone_from(&other.layers);
    }

    fn check_state(&self, state: ArrayView1<f32>) -> Result<()> {
        if state.len() != self.state_size() {
            return Err(ReasonerError::length_mismatch(self.state_size(), state.len()));
        }
        Ok(())
    }
}
