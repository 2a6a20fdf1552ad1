//! Instance graph construction and validation.

use crate::error::{Error, Result};
use candle_core::{DType, Device, Tensor};
use std::collections::HashSet;

/// Width of the per-edge input feature.
pub(crate) const EDGE_FEATURE_WIDTH: usize = 1;

/// A bin-packing instance encoded as a directed graph.
///
/// Holds node features `[N, F]`, the edge index as two parallel `u32`
/// tensors of length `M`, and edge features `[M, 1]`. The edge set need not
/// be symmetric, but every `(source, target)` pair appears at most once:
/// [`Net::reshape`](crate::net::Net::reshape) relies on that to scatter one
/// value per matrix cell.
///
/// # Examples
///
/// ```
/// use candle_core::Device;
/// use u_heurnet::graph::InstanceGraph;
///
/// let graph = InstanceGraph::new(
///     &[vec![2.0], vec![1.0], vec![3.0]],
///     &[(0, 1), (1, 2), (2, 0)],
///     &[0.5, 0.5, 0.5],
///     &Device::Cpu,
/// )
/// .unwrap();
/// assert_eq!(graph.num_nodes(), 3);
/// assert_eq!(graph.num_edges(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct InstanceGraph {
    x: Tensor,
    sources: Tensor,
    targets: Tensor,
    edge_attr: Tensor,
    edges: Vec<(usize, usize)>,
}

impl InstanceGraph {
    /// Builds a graph from host-side rows.
    ///
    /// Every row of `node_features` must have the same width, `edges` and
    /// `edge_features` must have the same length, endpoints must lie in
    /// `[0, N)` and no `(source, target)` pair may repeat.
    pub fn new(
        node_features: &[Vec<f32>],
        edges: &[(usize, usize)],
        edge_features: &[f32],
        device: &Device,
    ) -> Result<Self> {
        let n = node_features.len();
        let width = node_features.first().map_or(0, Vec::len);
        for row in node_features {
            if row.len() != width {
                return Err(Error::ShapeMismatch {
                    what: "node feature row",
                    expected: width,
                    got: row.len(),
                });
            }
        }
        if edge_features.len() != edges.len() {
            return Err(Error::ShapeMismatch {
                what: "edge feature count",
                expected: edges.len(),
                got: edge_features.len(),
            });
        }
        validate_edges(edges, n)?;

        let flat: Vec<f32> = node_features.iter().flatten().copied().collect();
        let x = Tensor::from_vec(flat, (n, width), device)?;
        let edge_attr = Tensor::from_vec(
            edge_features.to_vec(),
            (edges.len(), EDGE_FEATURE_WIDTH),
            device,
        )?;
        let (sources, targets) = index_tensors(edges, device)?;

        Ok(Self {
            x,
            sources,
            targets,
            edge_attr,
            edges: edges.to_vec(),
        })
    }

    /// Builds a graph from pre-built tensors.
    ///
    /// `x` must be `[N, F]`, `sources`/`targets` integer vectors of length
    /// `M` and `edge_attr` `[M, 1]`. The same checks as [`InstanceGraph::new`]
    /// apply.
    pub fn from_tensors(
        x: Tensor,
        sources: &Tensor,
        targets: &Tensor,
        edge_attr: Tensor,
    ) -> Result<Self> {
        let (n, _) = x.dims2()?;
        let src = sources.to_dtype(DType::U32)?.to_vec1::<u32>()?;
        let dst = targets.to_dtype(DType::U32)?.to_vec1::<u32>()?;
        if dst.len() != src.len() {
            return Err(Error::ShapeMismatch {
                what: "edge target count",
                expected: src.len(),
                got: dst.len(),
            });
        }
        let (m, width) = edge_attr.dims2()?;
        if m != src.len() {
            return Err(Error::ShapeMismatch {
                what: "edge feature count",
                expected: src.len(),
                got: m,
            });
        }
        if width != EDGE_FEATURE_WIDTH {
            return Err(Error::ShapeMismatch {
                what: "edge feature width",
                expected: EDGE_FEATURE_WIDTH,
                got: width,
            });
        }

        let edges: Vec<(usize, usize)> = src
            .iter()
            .zip(&dst)
            .map(|(&s, &t)| (s as usize, t as usize))
            .collect();
        validate_edges(&edges, n)?;

        let (sources, targets) = index_tensors(&edges, x.device())?;
        Ok(Self {
            x,
            sources,
            targets,
            edge_attr,
            edges,
        })
    }

    /// Builds the complete bin-packing graph for a list of item sizes.
    ///
    /// One node per item with its size as the single feature, and one edge
    /// for every ordered pair `(i, j)` with `i != j`. The edge feature is the
    /// size of the target item `j`.
    pub fn complete(item_sizes: &[f32], device: &Device) -> Result<Self> {
        let n = item_sizes.len();
        let mut edges = Vec::with_capacity(n * n.saturating_sub(1));
        let mut weights = Vec::with_capacity(edges.capacity());
        for i in 0..n {
            for (j, &size) in item_sizes.iter().enumerate() {
                if i != j {
                    edges.push((i, j));
                    weights.push(size);
                }
            }
        }
        let rows: Vec<Vec<f32>> = item_sizes.iter().map(|&s| vec![s]).collect();
        Self::new(&rows, &edges, &weights, device)
    }

    /// Number of nodes `N`.
    pub fn num_nodes(&self) -> usize {
        self.x.dims()[0]
    }

    /// Number of edges `M`.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Width `F` of the node feature rows.
    pub fn node_feature_width(&self) -> usize {
        self.x.dims()[1]
    }

    /// Node feature tensor `[N, F]`.
    pub fn node_features(&self) -> &Tensor {
        &self.x
    }

    /// Edge feature tensor `[M, 1]`.
    pub fn edge_features(&self) -> &Tensor {
        &self.edge_attr
    }

    /// Source node index of each edge, as a `u32` tensor of length `M`.
    pub fn sources(&self) -> &Tensor {
        &self.sources
    }

    /// Target node index of each edge, as a `u32` tensor of length `M`.
    pub fn targets(&self) -> &Tensor {
        &self.targets
    }

    /// Edge endpoints in input order.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Device the graph's tensors live on.
    pub fn device(&self) -> &Device {
        self.x.device()
    }
}

fn validate_edges(edges: &[(usize, usize)], num_nodes: usize) -> Result<()> {
    let mut seen = HashSet::with_capacity(edges.len());
    for (edge, &(s, t)) in edges.iter().enumerate() {
        for index in [s, t] {
            if index >= num_nodes {
                return Err(Error::IndexOutOfRange {
                    edge,
                    index,
                    num_nodes,
                });
            }
        }
        if !seen.insert((s, t)) {
            return Err(Error::DuplicateEdge { from: s, to: t });
        }
    }
    Ok(())
}

fn index_tensors(edges: &[(usize, usize)], device: &Device) -> Result<(Tensor, Tensor)> {
    let src: Vec<u32> = edges.iter().map(|&(s, _)| s as u32).collect();
    let dst: Vec<u32> = edges.iter().map(|&(_, t)| t as u32).collect();
    let m = edges.len();
    Ok((
        Tensor::from_vec(src, m, device)?,
        Tensor::from_vec(dst, m, device)?,
    ))
}
