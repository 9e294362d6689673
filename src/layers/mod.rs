pub mod dense;

pub use dense::{DenseLayer, LayerGradients, LayerParts};

/// The layer type used by [`crate::network::QNetwork`]
pub type Layer = DenseLayer;
