//! Feed-forward heads.
//!
//! - [`Mlp`]: linear stack with the activation between layers and a sigmoid
//!   after the last
//! - [`ParNet`]: the heuristic head, one bounded score per edge
//! - [`PartitionHead`]: the log-partition estimate, averaged over edges

use super::activation::Activation;
use super::params::ParamStore;
use crate::error::{Error, Result};
use candle_core::{Module, Tensor, D};
use candle_nn::Linear;

/// Smallest output of the final sigmoid.
const OUTPUT_MIN: f64 = f32::MIN_POSITIVE as f64;
/// Largest output of the final sigmoid: the greatest `f32` below 1.
const OUTPUT_MAX: f64 = 1.0 - (f32::EPSILON / 2.0) as f64;

/// A stack of linear layers.
///
/// Layer `i` maps `units[i] -> units[i + 1]`. Every layer but the last is
/// followed by the activation; the last is followed by a sigmoid, so every
/// output lies in (0, 1). Large logits saturate an `f32` sigmoid to exactly
/// 0 or 1, so the output is clamped to `[OUTPUT_MIN, OUTPUT_MAX]`.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Linear>,
    activation: Activation,
}

impl Mlp {
    /// Creates the stack. `units` must have at least two entries.
    pub fn new(
        store: &mut ParamStore,
        name: &str,
        units: &[usize],
        activation: Activation,
    ) -> Result<Self> {
        if units.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "mlp needs at least one layer, got widths {units:?}"
            )));
        }
        let layers = units
            .windows(2)
            .enumerate()
            .map(|(i, w)| store.linear(&format!("{name}.lins.{i}"), w[0], w[1]))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers, activation })
    }

    /// Number of linear layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Applies the stack to `[B, units[0]]`.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let last = self.layers.len() - 1;
        let mut x = x.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x)?;
            x = if i < last {
                self.activation.apply(&x)?
            } else {
                candle_nn::ops::sigmoid(&x)?.clamp(OUTPUT_MIN, OUTPUT_MAX)?
            };
        }
        Ok(x)
    }
}

/// Heuristic head: edge representations `[M, U]` to scores in (0, 1).
///
/// `depth` linear layers, `depth - 1` of them `U -> U`, the last
/// `U -> preds`. With one prediction per edge the trailing dimension is
/// squeezed away and the output is a length-`M` vector.
#[derive(Debug, Clone)]
pub struct ParNet {
    mlp: Mlp,
    units: usize,
    preds: usize,
}

impl ParNet {
    /// Creates the head.
    pub fn new(
        store: &mut ParamStore,
        name: &str,
        depth: usize,
        units: usize,
        preds: usize,
        activation: Activation,
    ) -> Result<Self> {
        let mut widths = vec![units; depth];
        widths.push(preds);
        Ok(Self {
            mlp: Mlp::new(store, name, &widths, activation)?,
            units,
            preds,
        })
    }

    /// Scores every edge representation.
    pub fn forward(&self, emb: &Tensor) -> Result<Tensor> {
        let (_, width) = emb.dims2()?;
        if width != self.units {
            return Err(Error::ShapeMismatch {
                what: "heuristic head input width",
                expected: self.units,
                got: width,
            });
        }
        let out = self.mlp.forward(emb)?;
        if self.preds == 1 {
            Ok(out.squeeze(D::Minus1)?)
        } else {
            Ok(out)
        }
    }
}

/// Partition-estimate head: `U -> U`, ReLU, `U -> out_dim`, mean over edges.
#[derive(Debug, Clone)]
pub struct PartitionHead {
    hidden: Linear,
    output: Linear,
    units: usize,
    out_dim: usize,
}

impl PartitionHead {
    /// Creates the head.
    pub fn new(store: &mut ParamStore, name: &str, units: usize, out_dim: usize) -> Result<Self> {
        Ok(Self {
            hidden: store.linear(&format!("{name}.0"), units, units)?,
            output: store.linear(&format!("{name}.2"), units, out_dim)?,
            units,
            out_dim,
        })
    }

    /// Width of the estimate.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Averages the projected edge representations into one `[out_dim]`
    /// vector. Fails with [`Error::EmptyGraph`] when there are no edges.
    pub fn forward(&self, emb: &Tensor) -> Result<Tensor> {
        let (m, width) = emb.dims2()?;
        if width != self.units {
            return Err(Error::ShapeMismatch {
                what: "partition head input width",
                expected: self.units,
                got: width,
            });
        }
        if m == 0 {
            return Err(Error::EmptyGraph);
        }
        let z = self.hidden.forward(emb)?.relu()?;
        let z = self.output.forward(&z)?;
        Ok(z.mean(0)?)
    }
}
