//! Group-reduce (scatter) aggregation.
//!
//! Combines per-edge rows into per-node rows by grouping on a parallel index
//! array. This is the only place where edge contributions are summed, so the
//! empty-group and ordering rules live here:
//!
//! - every input row is counted exactly once, in a single batched
//!   `index_add`;
//! - a group with no members yields the additive identity (zero) for both
//!   [`Aggregation::Sum`] and [`Aggregation::Mean`];
//! - the result does not depend on row order beyond floating-point
//!   summation tolerance.

use crate::error::{Error, Result};
use candle_core::{DType, Tensor};
use std::str::FromStr;

/// Reduction applied within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Aggregation {
    /// Sum of the group's rows.
    Sum,
    /// Arithmetic mean of the group's rows.
    #[default]
    Mean,
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" | "add" => Ok(Aggregation::Sum),
            "mean" => Ok(Aggregation::Mean),
            _ => Err(Error::UnknownAggregation(s.to_string())),
        }
    }
}

/// Reduces the rows of `values` (`[M, D]`) into `num_groups` rows by `index`.
///
/// `index` is an integer tensor of length `M`; row `k` of `values` belongs
/// to group `index[k]`. Returns a `[num_groups, D]` tensor.
///
/// # Examples
///
/// ```
/// use candle_core::{Device, Tensor};
/// use u_heurnet::aggregate::{group_reduce, Aggregation};
///
/// let dev = Device::Cpu;
/// let values = Tensor::new(&[[1f32], [2.], [4.]], &dev).unwrap();
/// let index = Tensor::new(&[0u32, 2, 0], &dev).unwrap();
///
/// let out = group_reduce(&values, &index, 3, Aggregation::Sum).unwrap();
/// assert_eq!(out.to_vec2::<f32>().unwrap(), vec![vec![5.], vec![0.], vec![2.]]);
/// ```
pub fn group_reduce(
    values: &Tensor,
    index: &Tensor,
    num_groups: usize,
    aggregation: Aggregation,
) -> Result<Tensor> {
    let (m, width) = values.dims2()?;
    let len = index.dims1()?;
    if len != m {
        return Err(Error::ShapeMismatch {
            what: "group index length",
            expected: m,
            got: len,
        });
    }

    let zeros = Tensor::zeros((num_groups, width), values.dtype(), values.device())?;
    let sums = zeros.index_add(index, values, 0)?;
    match aggregation {
        Aggregation::Sum => Ok(sums),
        Aggregation::Mean => {
            let counts = group_counts(index, num_groups, values.dtype())?;
            // Empty groups divide a zero sum by one.
            let counts = counts.maximum(1.0)?;
            Ok(sums.broadcast_div(&counts)?)
        }
    }
}

/// Number of members in each group, as a `[num_groups, 1]` tensor.
pub fn group_counts(index: &Tensor, num_groups: usize, dtype: DType) -> Result<Tensor> {
    let m = index.dims1()?;
    let ones = Tensor::ones((m, 1), dtype, index.device())?;
    let zeros = Tensor::zeros((num_groups, 1), dtype, index.device())?;
    Ok(zeros.index_add(index, &ones, 0)?)
}
