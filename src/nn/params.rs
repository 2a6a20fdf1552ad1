//! Seeded parameter initialization.
//!
//! Every learnable tensor is created through a [`ParamStore`], which draws
//! initial values from a seeded [`StdRng`] and records the resulting
//! [`Var`] under a dotted name. Two stores built from the same seed produce
//! bit-identical parameters when the same modules are built in the same
//! order.

use crate::error::Result;
use candle_core::{Device, Tensor, Var};
use candle_nn::Linear;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Whether a variable is a learned weight or a running buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Learned by an optimizer.
    Weight,
    /// Updated by the forward pass itself (normalization statistics).
    Buffer,
}

/// A variable with its registry name.
#[derive(Debug, Clone)]
pub struct NamedVar {
    /// Dotted path, e.g. `emb.layers.3.a.weight`.
    pub name: String,
    /// Weight or buffer.
    pub kind: ParamKind,
    /// The variable. Module tensors share its storage.
    pub var: Var,
}

/// Creates and records the variables of a network.
pub struct ParamStore {
    rng: StdRng,
    device: Device,
    vars: Vec<NamedVar>,
}

impl ParamStore {
    /// Creates a store whose draws are determined by `seed`.
    pub fn new(seed: u64, device: &Device) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            device: device.clone(),
            vars: Vec::new(),
        }
    }

    /// Device new variables are placed on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Creates a linear layer `in_dim -> out_dim`.
    ///
    /// Weight and bias are drawn from `U(-1/sqrt(in_dim), 1/sqrt(in_dim))`.
    pub fn linear(&mut self, name: &str, in_dim: usize, out_dim: usize) -> Result<Linear> {
        let bound = 1.0 / (in_dim.max(1) as f32).sqrt();
        let weight = self.uniform(&format!("{name}.weight"), (out_dim, in_dim), bound)?;
        let bias = self.uniform(&format!("{name}.bias"), (out_dim,), bound)?;
        Ok(Linear::new(weight, Some(bias)))
    }

    /// Creates a weight tensor filled from `U(-bound, bound)`.
    pub fn uniform<S: Into<candle_core::Shape>>(
        &mut self,
        name: &str,
        shape: S,
        bound: f32,
    ) -> Result<Tensor> {
        let shape = shape.into();
        let values: Vec<f32> = (0..shape.elem_count())
            .map(|_| self.rng.random_range(-bound..bound))
            .collect();
        let tensor = Tensor::from_vec(values, shape, &self.device)?;
        self.register(name, ParamKind::Weight, &tensor)
    }

    /// Creates a constant weight vector of length `len`.
    pub fn constant(&mut self, name: &str, len: usize, value: f32) -> Result<Tensor> {
        let tensor = Tensor::from_vec(vec![value; len], len, &self.device)?;
        self.register(name, ParamKind::Weight, &tensor)
    }

    /// Creates a buffer vector of length `len` and returns its variable.
    pub fn buffer(&mut self, name: &str, len: usize, value: f32) -> Result<Var> {
        let var = Var::from_tensor(&Tensor::from_vec(vec![value; len], len, &self.device)?)?;
        self.vars.push(NamedVar {
            name: name.to_string(),
            kind: ParamKind::Buffer,
            var: var.clone(),
        });
        Ok(var)
    }

    /// Drains the variables recorded so far.
    ///
    /// Used to split one store's output into per-component groups.
    pub fn take(&mut self) -> Vec<NamedVar> {
        std::mem::take(&mut self.vars)
    }

    fn register(&mut self, name: &str, kind: ParamKind, tensor: &Tensor) -> Result<Tensor> {
        let var = Var::from_tensor(tensor)?;
        let out = var.as_tensor().clone();
        self.vars.push(NamedVar {
            name: name.to_string(),
            kind,
            var,
        });
        Ok(out)
    }
}
