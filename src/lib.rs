//! Learned edge heuristics for ant-colony bin packing.
//!
//! Scores every candidate packing relation of a bin-packing instance with a
//! value in (0, 1) that biases the downstream ant-colony sampler, and
//! optionally estimates the log-partition function used to calibrate a
//! flow-matching training objective.
//!
//! - **Instance graphs** ([`graph`]): items as nodes, directed candidate
//!   edges, validated once at construction.
//! - **Group-reduce** ([`aggregate`]): the scatter sum/mean that turns
//!   per-edge messages into per-node updates.
//! - **Building blocks** ([`nn`]): seeded parameters, activations,
//!   running normalization, encoders, feed-forward heads.
//! - **Embedding networks** ([`embed`]): a gated graph convolution and the
//!   original multi-projection network behind one trait.
//! - **Scorer** ([`net`]): composes the above and reshapes per-edge scores
//!   into the `N x N` matrix the sampler indexes.
//!
//! # Architecture
//!
//! This crate provides the learned component of a metaheuristic pipeline.
//! Instance generation, the ant-colony search and training orchestration
//! are supplied by consumers; only the forward computation lives here.
//!
//! # Example
//!
//! ```
//! use candle_core::Device;
//! use u_heurnet::graph::InstanceGraph;
//! use u_heurnet::net::{Net, NetConfig};
//!
//! let dev = Device::Cpu;
//! let net = Net::new(NetConfig::default().with_seed(42), &dev).unwrap();
//! let graph = InstanceGraph::complete(&[0.31, 0.52, 0.18, 0.77], &dev).unwrap();
//!
//! let matrix = net.heuristic_matrix(&graph).unwrap();
//! assert_eq!(matrix.dims(), &[4, 4]);
//! ```

pub mod aggregate;
pub mod embed;
pub mod error;
pub mod graph;
pub mod net;
pub mod nn;

pub use error::{Error, Result};
