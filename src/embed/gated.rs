//! Gated graph convolution embedding.

use super::config::EmbeddingConfig;
use super::{no_edges, EmbeddingNetwork, EmbeddingVariant};
use crate::aggregate::{group_reduce, Aggregation};
use crate::error::{Error, Result};
use crate::graph::InstanceGraph;
use crate::nn::{FeatureEncoder, Mode, ParamStore, RunningNorm};
use candle_core::{Module, Tensor};
use candle_nn::Linear;

/// One synchronous round of gated node/edge co-update.
///
/// For an edge `i -> j` with value `e` and node values `h`:
///
/// ```text
/// e'   = e   + ReLU(norm_e(A e + B h_i + C h_j))
/// agg_j = sum over edges i -> j of sigmoid(e'_ij) * (V h_i)
/// h'_j = h_j + ReLU(norm_h(U h_j + agg_j))
/// ```
///
/// Both updates are residual. The gate reads the already-updated edge
/// value; the node update reads the round's input node values. A node with
/// no incoming edge gets `agg = 0`.
#[derive(Debug, Clone)]
pub struct GatedGcnLayer {
    u: Linear,
    v: Linear,
    a: Linear,
    b: Linear,
    c: Linear,
    bn_node: RunningNorm,
    bn_edge: RunningNorm,
    units: usize,
}

impl GatedGcnLayer {
    /// Creates a `units -> units` layer with its own parameters.
    pub fn new(store: &mut ParamStore, name: &str, units: usize) -> Result<Self> {
        Ok(Self {
            u: store.linear(&format!("{name}.u"), units, units)?,
            v: store.linear(&format!("{name}.v"), units, units)?,
            a: store.linear(&format!("{name}.a"), units, units)?,
            b: store.linear(&format!("{name}.b"), units, units)?,
            c: store.linear(&format!("{name}.c"), units, units)?,
            bn_node: RunningNorm::new(store, &format!("{name}.bn_node"), units)?,
            bn_edge: RunningNorm::new(store, &format!("{name}.bn_edge"), units)?,
            units,
        })
    }

    /// Runs one round.
    ///
    /// `h` is `[N, U]`, `e` is `[M, U]`, `sources`/`targets` are `u32`
    /// vectors of length `M`. Returns `(h', e')` with unchanged shapes.
    pub fn forward(
        &self,
        h: &Tensor,
        e: &Tensor,
        sources: &Tensor,
        targets: &Tensor,
        mode: Mode,
    ) -> Result<(Tensor, Tensor)> {
        let (n, width) = h.dims2()?;
        if width != self.units {
            return Err(Error::ShapeMismatch {
                what: "gated layer node width",
                expected: self.units,
                got: width,
            });
        }

        let h_src = h.index_select(sources, 0)?;
        let h_dst = h.index_select(targets, 0)?;
        let edge_in = ((self.a.forward(e)? + self.b.forward(&h_src)?)? + self.c.forward(&h_dst)?)?;
        let e_new = (e + self.bn_edge.forward(&edge_in, mode)?.relu()?)?;

        let gate = candle_nn::ops::sigmoid(&e_new)?;
        let msg = (gate * self.v.forward(&h_src)?)?;
        let agg = group_reduce(&msg, targets, n, Aggregation::Sum)?;

        let node_in = (self.u.forward(h)? + agg)?;
        let h_new = (h + self.bn_node.forward(&node_in, mode)?.relu()?)?;

        Ok((h_new, e_new))
    }
}

/// Feature encoders followed by `depth` independent [`GatedGcnLayer`]s.
#[derive(Debug, Clone)]
pub struct GatedGcnEmbNet {
    encoder: FeatureEncoder,
    layers: Vec<GatedGcnLayer>,
    units: usize,
}

impl GatedGcnEmbNet {
    /// Creates the network under `name`.
    pub fn new(config: &EmbeddingConfig, store: &mut ParamStore, name: &str) -> Result<Self> {
        let encoder = FeatureEncoder::new(
            store,
            name,
            config.node_features,
            config.units,
            config.activation,
        )?;
        let layers = (0..config.depth)
            .map(|i| GatedGcnLayer::new(store, &format!("{name}.layers.{i}"), config.units))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            encoder,
            layers,
            units: config.units,
        })
    }
}

impl EmbeddingNetwork for GatedGcnEmbNet {
    fn variant(&self) -> EmbeddingVariant {
        EmbeddingVariant::Gated
    }

    fn depth(&self) -> usize {
        self.layers.len()
    }

    fn units(&self) -> usize {
        self.units
    }

    fn embed(&self, graph: &InstanceGraph, mode: Mode) -> Result<Tensor> {
        if graph.num_edges() == 0 {
            self.encoder.check_widths(graph)?;
            return no_edges(self.units, graph.device());
        }
        let (mut h, mut e) = self.encoder.encode(graph)?;
        for layer in &self.layers {
            (h, e) = layer.forward(&h, &e, graph.sources(), graph.targets(), mode)?;
        }
        Ok(e)
    }
}
