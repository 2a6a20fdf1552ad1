//! Multi-projection embedding network.

use super::config::EmbeddingConfig;
use super::{no_edges, EmbeddingNetwork, EmbeddingVariant};
use crate::aggregate::{group_reduce, Aggregation};
use crate::error::Result;
use crate::graph::InstanceGraph;
use crate::nn::{Activation, FeatureEncoder, Mode, ParamStore, RunningNorm};
use candle_core::{Module, Tensor};
use candle_nn::Linear;

/// Parameters of one round of [`OriginalEmbNet`].
///
/// ```text
/// x1..x4 = V1..V4 h          w1 = W e          w2 = sigmoid(e)
/// h' = h + act(norm_h(x1 + AGG_{i -> j}(w2 * x2_i)))
/// e' = e + act(norm_e(w1 + x3_i + x4_j))
/// ```
///
/// Both updates read the round's input `h` and `e`.
#[derive(Debug, Clone)]
pub struct OriginalRound {
    v_lin1: Linear,
    v_lin2: Linear,
    v_lin3: Linear,
    v_lin4: Linear,
    e_lin: Linear,
    v_bn: RunningNorm,
    e_bn: RunningNorm,
}

impl OriginalRound {
    /// Creates a round of width `units`.
    pub fn new(store: &mut ParamStore, name: &str, units: usize) -> Result<Self> {
        Ok(Self {
            v_lin1: store.linear(&format!("{name}.v_lin1"), units, units)?,
            v_lin2: store.linear(&format!("{name}.v_lin2"), units, units)?,
            v_lin3: store.linear(&format!("{name}.v_lin3"), units, units)?,
            v_lin4: store.linear(&format!("{name}.v_lin4"), units, units)?,
            e_lin: store.linear(&format!("{name}.e_lin"), units, units)?,
            v_bn: RunningNorm::new(store, &format!("{name}.v_bn"), units)?,
            e_bn: RunningNorm::new(store, &format!("{name}.e_bn"), units)?,
        })
    }

    /// Runs the round. Shapes as in [`GatedGcnLayer::forward`](super::GatedGcnLayer::forward).
    #[allow(clippy::too_many_arguments)]
    pub fn forward(
        &self,
        h: &Tensor,
        e: &Tensor,
        sources: &Tensor,
        targets: &Tensor,
        activation: Activation,
        aggregation: Aggregation,
        mode: Mode,
    ) -> Result<(Tensor, Tensor)> {
        let n = h.dim(0)?;

        let x1 = self.v_lin1.forward(h)?;
        let x2 = self.v_lin2.forward(h)?;
        let x3 = self.v_lin3.forward(h)?;
        let x4 = self.v_lin4.forward(h)?;
        let w1 = self.e_lin.forward(e)?;
        let w2 = candle_nn::ops::sigmoid(e)?;

        let msg = (w2 * x2.index_select(sources, 0)?)?;
        let agg = group_reduce(&msg, targets, n, aggregation)?;
        let node_in = (x1 + agg)?;
        let h_new = (h + activation.apply(&self.v_bn.forward(&node_in, mode)?)?)?;

        let edge_in = ((w1 + x3.index_select(sources, 0)?)? + x4.index_select(targets, 0)?)?;
        let e_new = (e + activation.apply(&self.e_bn.forward(&edge_in, mode)?)?)?;

        Ok((h_new, e_new))
    }
}

/// Feature encoders followed by `depth` independent [`OriginalRound`]s.
#[derive(Debug, Clone)]
pub struct OriginalEmbNet {
    encoder: FeatureEncoder,
    rounds: Vec<OriginalRound>,
    activation: Activation,
    aggregation: Aggregation,
    units: usize,
}

impl OriginalEmbNet {
    /// Creates the network under `name`.
    pub fn new(config: &EmbeddingConfig, store: &mut ParamStore, name: &str) -> Result<Self> {
        let encoder = FeatureEncoder::new(
            store,
            name,
            config.node_features,
            config.units,
            config.activation,
        )?;
        let rounds = (0..config.depth)
            .map(|i| OriginalRound::new(store, &format!("{name}.rounds.{i}"), config.units))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            encoder,
            rounds,
            activation: config.activation,
            aggregation: config.aggregation,
            units: config.units,
        })
    }

    /// Neighbor aggregation in use.
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }
}

impl EmbeddingNetwork for OriginalEmbNet {
    fn variant(&self) -> EmbeddingVariant {
        EmbeddingVariant::Original
    }

    fn depth(&self) -> usize {
        self.rounds.len()
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
        for round in &self.rounds {
            (h, e) = round.forward(
                &h,
                &e,
                graph.sources(),
                graph.targets(),
                self.activation,
                self.aggregation,
                mode,
            )?;
        }
        Ok(e)
    }
}
