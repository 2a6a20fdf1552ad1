//! Edge embedding networks.
//!
//! Two structurally different message-passing stacks sit behind the
//! [`EmbeddingNetwork`] trait. Both encode node/edge features once, run
//! `depth` synchronous rounds, and return the final edge representation
//! `[M, U]`. Node representations never leave the network.
//!
//! # Variants
//!
//! - [`GatedGcnEmbNet`]: gated graph convolution. Edges are updated from
//!   three projections, nodes from a sigmoid-gated sum of neighbor
//!   projections.
//! - [`OriginalEmbNet`]: four node projections and one edge projection per
//!   round, with a configurable (sum/mean) neighbor aggregation.
//!
//! The variant is picked once, by [`EmbeddingVariant::build`]. Neither
//! implementation branches on the other.
//!
//! # References
//!
//! - Bresson & Laurent (2017), "Residual Gated Graph ConvNets"
//! - Ye et al. (2023), "DeepACO: Neural-enhanced Ant Systems for
//!   Combinatorial Optimization"

mod config;
mod gated;
mod original;

pub use config::EmbeddingConfig;
pub use gated::{GatedGcnEmbNet, GatedGcnLayer};
pub use original::{OriginalEmbNet, OriginalRound};

use crate::error::{Error, Result};
use crate::graph::InstanceGraph;
use crate::nn::{Mode, ParamStore};
use candle_core::{DType, Device, Tensor};
use std::fmt;
use std::str::FromStr;

/// A message-passing network producing one representation per edge.
///
/// Implementations own all of their parameters and running statistics;
/// nothing is carried between calls except those.
pub trait EmbeddingNetwork: fmt::Debug + Send + Sync {
    /// Which architecture this is.
    fn variant(&self) -> EmbeddingVariant;

    /// Number of message-passing rounds.
    fn depth(&self) -> usize;

    /// Embedding width `U`.
    fn units(&self) -> usize;

    /// Runs the encoders and every round, returning edge representations
    /// `[M, U]` in the graph's edge order.
    fn embed(&self, graph: &InstanceGraph, mode: Mode) -> Result<Tensor>;
}

/// Embedding architecture selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EmbeddingVariant {
    /// [`GatedGcnEmbNet`].
    #[default]
    Gated,
    /// [`OriginalEmbNet`].
    Original,
}

impl EmbeddingVariant {
    /// Builds the selected network, drawing parameters from `store`.
    pub fn build(
        self,
        config: &EmbeddingConfig,
        store: &mut ParamStore,
    ) -> Result<Box<dyn EmbeddingNetwork>> {
        config.validate()?;
        Ok(match self {
            EmbeddingVariant::Gated => Box::new(GatedGcnEmbNet::new(config, store, "emb")?),
            EmbeddingVariant::Original => Box::new(OriginalEmbNet::new(config, store, "emb")?),
        })
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            EmbeddingVariant::Gated => "gated",
            EmbeddingVariant::Original => "original",
        }
    }
}

impl fmt::Display for EmbeddingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmbeddingVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gated" | "gcn" => Ok(EmbeddingVariant::Gated),
            "original" | "embnet" => Ok(EmbeddingVariant::Original),
            _ => Err(Error::UnknownVariant(s.to_string())),
        }
    }
}

/// `[0, U]` edge representation for graphs without edges.
fn no_edges(units: usize, device: &Device) -> Result<Tensor> {
    Ok(Tensor::zeros((0, units), DType::F32, device)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant() {
        assert_eq!("gcn".parse::<EmbeddingVariant>().unwrap(), EmbeddingVariant::Gated);
        assert_eq!("Gated".parse::<EmbeddingVariant>().unwrap(), EmbeddingVariant::Gated);
        assert_eq!(
            "embnet".parse::<EmbeddingVariant>().unwrap(),
            EmbeddingVariant::Original
        );
        assert!(matches!(
            "transformer".parse::<EmbeddingVariant>(),
            Err(Error::UnknownVariant(name)) if name == "transformer"
        ));
    }

    #[test]
    fn test_display_roundtrip() {
        for v in [EmbeddingVariant::Gated, EmbeddingVariant::Original] {
            assert_eq!(v.to_string().parse::<EmbeddingVariant>().unwrap(), v);
        }
    }

    #[test]
    fn test_both_variants_same_shape() {
        let dev = Device::Cpu;
        let graph = InstanceGraph::complete(&[0.1, 0.4, 0.2, 0.8, 0.5], &dev).unwrap();
        let config = EmbeddingConfig::default().with_depth(2).with_units(6);

        for variant in [EmbeddingVariant::Gated, EmbeddingVariant::Original] {
            let mut store = ParamStore::new(9, &dev);
            let net = variant.build(&config, &mut store).unwrap();
            assert_eq!(net.variant(), variant);
            assert_eq!(net.depth(), 2);
            let emb = net.embed(&graph, Mode::Inference).unwrap();
            assert_eq!(emb.dims(), &[20, 6]);
        }
    }

    #[test]
    fn test_build_validates_config() {
        let mut store = ParamStore::new(0, &Device::Cpu);
        let config = EmbeddingConfig::default().with_units(0);
        assert!(matches!(
            EmbeddingVariant::Original.build(&config, &mut store),
            Err(Error::InvalidConfig(_))
        ));
    }
}
