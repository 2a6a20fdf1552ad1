//! Embedding network configuration.

use crate::aggregate::Aggregation;
use crate::error::{Error, Result};
use crate::nn::Activation;

/// Shape and nonlinearity settings shared by both embedding variants.
///
/// # Examples
///
/// ```
/// use u_heurnet::embed::EmbeddingConfig;
/// use u_heurnet::aggregate::Aggregation;
///
/// let config = EmbeddingConfig::default()
///     .with_depth(6)
///     .with_units(16)
///     .with_aggregation(Aggregation::Sum);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmbeddingConfig {
    /// Number of message-passing rounds. Each round has its own weights.
    pub depth: usize,

    /// Node feature width `F`. Bin packing uses one feature, the item size.
    pub node_features: usize,

    /// Embedding width `U`.
    pub units: usize,

    /// Activation after the encoders and in the original variant's updates.
    pub activation: Activation,

    /// Neighbor aggregation of the original variant.
    ///
    /// The gated variant always sums.
    pub aggregation: Aggregation,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            depth: 12,
            node_features: 1,
            units: 32,
            activation: Activation::Silu,
            aggregation: Aggregation::Mean,
        }
    }
}

impl EmbeddingConfig {
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_node_features(mut self, f: usize) -> Self {
        self.node_features = f;
        self
    }

    pub fn with_units(mut self, units: usize) -> Self {
        self.units = units;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::InvalidConfig("embedding depth must be positive".into()));
        }
        if self.node_features == 0 {
            return Err(Error::InvalidConfig("node_features must be positive".into()));
        }
        if self.units == 0 {
            return Err(Error::InvalidConfig("units must be positive".into()));
        }
        Ok(())
    }
}
