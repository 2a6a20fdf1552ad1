//! Scorer configuration.
//!
//! [`NetConfig`] selects the embedding variant, its shape, the heads to
//! build and the parameter seed.

use crate::embed::{EmbeddingConfig, EmbeddingVariant};
use crate::error::{Error, Result};
use crate::nn::Activation;

/// Configuration for [`Net`](super::Net).
///
/// # Defaults
///
/// ```
/// use u_heurnet::net::NetConfig;
/// use u_heurnet::embed::EmbeddingVariant;
///
/// let config = NetConfig::default();
/// assert_eq!(config.variant, EmbeddingVariant::Gated);
/// assert_eq!(config.embedding.depth, 12);
/// assert_eq!(config.embedding.units, 32);
/// assert_eq!(config.head_depth, 3);
/// assert!(config.partition_out_dim.is_none());
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_heurnet::net::NetConfig;
///
/// let config = NetConfig::default()
///     .with_variant_name("embnet")
///     .unwrap()
///     .with_depth(6)
///     .with_partition_head(1)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetConfig {
    /// Embedding architecture.
    pub variant: EmbeddingVariant,

    /// Embedding shape, activation and aggregation.
    pub embedding: EmbeddingConfig,

    /// Number of linear layers in the heuristic head.
    pub head_depth: usize,

    /// Outputs per edge of the heuristic head. With 1 the scores are a
    /// length-`M` vector.
    pub preds: usize,

    /// Width of the partition estimate. `None` builds no partition head.
    pub partition_out_dim: Option<usize>,

    /// Parameter seed. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            variant: EmbeddingVariant::Gated,
            embedding: EmbeddingConfig::default(),
            head_depth: 3,
            preds: 1,
            partition_out_dim: None,
            seed: None,
        }
    }
}

impl NetConfig {
    /// Sets the embedding variant.
    pub fn with_variant(mut self, variant: EmbeddingVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Sets the embedding variant by name (`gated`/`gcn`, `original`/`embnet`).
    ///
    /// Unknown names fail here, before any network is built.
    pub fn with_variant_name(mut self, name: &str) -> Result<Self> {
        self.variant = name.parse()?;
        Ok(self)
    }

    /// Replaces the whole embedding configuration.
    pub fn with_embedding(mut self, embedding: EmbeddingConfig) -> Self {
        self.embedding = embedding;
        self
    }

    /// Sets the number of message-passing rounds.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.embedding.depth = depth;
        self
    }

    /// Sets the embedding width `U` (shared by the heads).
    pub fn with_units(mut self, units: usize) -> Self {
        self.embedding.units = units;
        self
    }

    /// Sets the activation used by encoders, heads and the original variant.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.embedding.activation = activation;
        self
    }

    /// Sets the heuristic head depth.
    pub fn with_head_depth(mut self, depth: usize) -> Self {
        self.head_depth = depth;
        self
    }

    /// Sets the number of outputs per edge.
    pub fn with_preds(mut self, preds: usize) -> Self {
        self.preds = preds;
        self
    }

    /// Builds a partition-estimate head of width `out_dim`.
    pub fn with_partition_head(mut self, out_dim: usize) -> Self {
        self.partition_out_dim = Some(out_dim);
        self
    }

    /// Sets the parameter seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for smoke tests: one round, width 4.
    pub fn tiny() -> Self {
        Self::default().with_depth(1).with_units(4)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.embedding.validate()?;
        if self.head_depth == 0 {
            return Err(Error::InvalidConfig("head_depth must be positive".into()));
        }
        if self.preds == 0 {
            return Err(Error::InvalidConfig("preds must be positive".into()));
        }
        if self.partition_out_dim == Some(0) {
            return Err(Error::InvalidConfig(
                "partition_out_dim must be positive".into(),
            ));
        }
        Ok(())
    }
}
