//! Neural building blocks shared by the embedding networks and heads.
//!
//! # Submodules
//!
//! - [`params`]: seeded parameter initialization and the named-variable
//!   registry used for freezing and checkpointing
//! - [`activation`]: configurable element-wise nonlinearities
//! - [`norm`]: per-channel normalization with explicit running statistics
//! - [`encoder`]: node/edge feature encoders
//! - [`mlp`]: the heuristic head and the partition-estimate head

pub mod activation;
pub mod encoder;
pub mod mlp;
pub mod norm;
pub mod params;

pub use activation::Activation;
pub use encoder::FeatureEncoder;
pub use mlp::{Mlp, ParNet, PartitionHead};
pub use norm::RunningNorm;
pub use params::{NamedVar, ParamKind, ParamStore};

/// Forward-pass mode.
///
/// Passed explicitly down every forward call. Only [`RunningNorm`] reads it:
/// in [`Mode::Train`] it normalizes with batch statistics and folds them
/// into its running mean/variance, in [`Mode::Inference`] it reads the
/// running statistics and mutates nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Read-only forward pass. Reproducible.
    #[default]
    Inference,
    /// Batch statistics, running statistics updated.
    Train,
}
