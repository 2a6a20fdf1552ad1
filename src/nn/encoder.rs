//! Node and edge feature encoders.

use super::activation::Activation;
use super::params::ParamStore;
use crate::error::{Error, Result};
use crate::graph::instance::EDGE_FEATURE_WIDTH;
use crate::graph::InstanceGraph;
use candle_core::{Module, Tensor};
use candle_nn::Linear;

/// Projects raw node features `[N, F]` and edge features `[M, 1]` to the
/// embedding width `U`, then applies the activation.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    node_features: usize,
    node: Linear,
    edge: Linear,
    activation: Activation,
}

impl FeatureEncoder {
    /// Creates the encoder pair under `name.v_lin0` / `name.e_lin0`.
    pub fn new(
        store: &mut ParamStore,
        name: &str,
        node_features: usize,
        units: usize,
        activation: Activation,
    ) -> Result<Self> {
        Ok(Self {
            node_features,
            node: store.linear(&format!("{name}.v_lin0"), node_features, units)?,
            edge: store.linear(&format!("{name}.e_lin0"), EDGE_FEATURE_WIDTH, units)?,
            activation,
        })
    }

    /// Encodes the graph's node and edge features.
    ///
    /// Returns `(h, e)` shaped `[N, U]` and `[M, U]`. A node feature width
    /// other than the configured `F` is rejected rather than broadcast.
    pub fn encode(&self, graph: &InstanceGraph) -> Result<(Tensor, Tensor)> {
        let h = self.encode_nodes(graph.node_features())?;
        let e = self.encode_edges(graph.edge_features())?;
        Ok((h, e))
    }

    /// Checks the graph's feature widths without running the projections.
    ///
    /// A graph with no nodes has no feature rows to check.
    pub fn check_widths(&self, graph: &InstanceGraph) -> Result<()> {
        if graph.num_nodes() > 0 {
            check_width(graph.node_features(), self.node_features, "node feature width")?;
        }
        check_width(graph.edge_features(), EDGE_FEATURE_WIDTH, "edge feature width")
    }

    /// Encodes node features `[N, F]`.
    pub fn encode_nodes(&self, x: &Tensor) -> Result<Tensor> {
        check_width(x, self.node_features, "node feature width")?;
        self.activation.apply(&self.node.forward(x)?)
    }

    /// Encodes edge features `[M, 1]`.
    pub fn encode_edges(&self, edge_attr: &Tensor) -> Result<Tensor> {
        check_width(edge_attr, EDGE_FEATURE_WIDTH, "edge feature width")?;
        self.activation.apply(&self.edge.forward(edge_attr)?)
    }
}

fn check_width(t: &Tensor, expected: usize, what: &'static str) -> Result<()> {
    let (_, got) = t.dims2()?;
    if got != expected {
        return Err(Error::ShapeMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}
