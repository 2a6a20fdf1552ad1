//! Per-channel normalization with explicit running statistics.

use super::params::ParamStore;
use super::Mode;
use crate::error::{Error, Result};
use candle_core::{Tensor, Var};
use std::sync::{Arc, Mutex};

const EPS: f64 = 1e-5;
const MOMENTUM: f64 = 0.1;

/// Normalizes a `[B, C]` batch per channel, then applies a learned affine
/// transform.
///
/// The running mean/variance pair is owned here and is the only state a
/// forward pass may change. In [`Mode::Inference`] the running statistics
/// are read and nothing is written. In [`Mode::Train`] the batch is
/// normalized with its own (biased) statistics and the running pair moves
/// toward them by `MOMENTUM`, the variance using the unbiased estimate.
///
/// Train-mode passes may run concurrently through `&self`: the
/// read-modify-write of the running pair is serialized, so no update is
/// lost. Clones share the running pair and the lock.
#[derive(Debug, Clone)]
pub struct RunningNorm {
    channels: usize,
    weight: Tensor,
    bias: Tensor,
    running_mean: Var,
    running_var: Var,
    update_lock: Arc<Mutex<()>>,
}

impl RunningNorm {
    /// Creates a normalization over `channels` channels.
    ///
    /// Affine weight starts at 1, bias at 0, running mean at 0 and running
    /// variance at 1.
    pub fn new(store: &mut ParamStore, name: &str, channels: usize) -> Result<Self> {
        Ok(Self {
            channels,
            weight: store.constant(&format!("{name}.weight"), channels, 1.0)?,
            bias: store.constant(&format!("{name}.bias"), channels, 0.0)?,
            running_mean: store.buffer(&format!("{name}.running_mean"), channels, 0.0)?,
            running_var: store.buffer(&format!("{name}.running_var"), channels, 1.0)?,
            update_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Normalizes `x` (`[B, C]`).
    pub fn forward(&self, x: &Tensor, mode: Mode) -> Result<Tensor> {
        let (batch, channels) = x.dims2()?;
        if channels != self.channels {
            return Err(Error::ShapeMismatch {
                what: "normalization channels",
                expected: self.channels,
                got: channels,
            });
        }

        let normalized = match mode {
            Mode::Inference => {
                let centered = x.broadcast_sub(self.running_mean.as_tensor())?;
                let std = (self.running_var.as_tensor() + EPS)?.sqrt()?;
                centered.broadcast_div(&std)?
            }
            Mode::Train => {
                if batch == 0 {
                    return Ok(x.clone());
                }
                let mean = x.mean_keepdim(0)?;
                let centered = x.broadcast_sub(&mean)?;
                let var = centered.sqr()?.mean_keepdim(0)?;
                let std = (&var + EPS)?.sqrt()?;
                self.update_running(&mean.squeeze(0)?, &var.squeeze(0)?, batch)?;
                centered.broadcast_div(&std)?
            }
        };
        Ok(normalized
            .broadcast_mul(&self.weight)?
            .broadcast_add(&self.bias)?)
    }

    /// Current running mean.
    pub fn running_mean(&self) -> Result<Vec<f32>> {
        Ok(self.running_mean.as_tensor().to_vec1::<f32>()?)
    }

    /// Current running variance.
    pub fn running_var(&self) -> Result<Vec<f32>> {
        Ok(self.running_var.as_tensor().to_vec1::<f32>()?)
    }

    fn update_running(&self, mean: &Tensor, biased_var: &Tensor, batch: usize) -> Result<()> {
        let unbiased = if batch > 1 {
            (biased_var * (batch as f64 / (batch - 1) as f64))?
        } else {
            biased_var.clone()
        };
        // Guards no data, so poisoning is harmless.
        let _guard = self
            .update_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let new_mean = ((self.running_mean.as_tensor() * (1.0 - MOMENTUM))? + (mean * MOMENTUM)?)?;
        let new_var =
            ((self.running_var.as_tensor() * (1.0 - MOMENTUM))? + (unbiased * MOMENTUM)?)?;
        self.running_mean.set(&new_mean)?;
        self.running_var.set(&new_var)?;
        Ok(())
    }
}
