//! Instance graphs.
//!
//! A bin-packing instance reaches the scoring network as a directed graph:
//! one node per item, one edge per candidate packing relation. The
//! [`InstanceGraph`] type validates this input once at construction so the
//! network can assume in-range, unique edges and consistent widths.
//!
//! # Key Types
//!
//! - [`InstanceGraph`]: node features `[N, F]`, edge endpoints, edge
//!   features `[M, 1]`

pub(crate) mod instance;

pub use instance::InstanceGraph;
