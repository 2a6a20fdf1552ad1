//! Top-level scorer.

use super::config::NetConfig;
use crate::embed::{EmbeddingNetwork, EmbeddingVariant};
use crate::error::{Error, Result};
use crate::graph::InstanceGraph;
use crate::nn::{Mode, NamedVar, ParNet, ParamKind, ParamStore, PartitionHead};
use candle_core::{DType, Device, Tensor, Var};
use tracing::{debug, trace};

/// Edge-heuristic scorer: encoders, embedding network, heuristic head and
/// an optional partition-estimate head.
///
/// # Examples
///
/// ```
/// use candle_core::Device;
/// use u_heurnet::graph::InstanceGraph;
/// use u_heurnet::net::{Net, NetConfig};
///
/// let dev = Device::Cpu;
/// let net = Net::new(NetConfig::tiny().with_seed(7), &dev).unwrap();
/// let graph = InstanceGraph::complete(&[0.4, 0.7, 0.2], &dev).unwrap();
///
/// let heu = net.score(&graph).unwrap();
/// assert_eq!(heu.dims(), &[6]);
///
/// let matrix = Net::reshape(&graph, &heu).unwrap();
/// assert_eq!(matrix.dims(), &[3, 3]);
/// ```
#[derive(Debug)]
pub struct Net {
    config: NetConfig,
    emb_net: Box<dyn EmbeddingNetwork>,
    par_net_heu: ParNet,
    z_net: Option<PartitionHead>,
    emb_vars: Vec<NamedVar>,
    head_vars: Vec<NamedVar>,
    emb_frozen: bool,
}

impl Net {
    /// Builds the scorer.
    ///
    /// Fails on an invalid configuration before any parameter is drawn.
    pub fn new(config: NetConfig, device: &Device) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut store = ParamStore::new(seed, device);

        let emb_net = config.variant.build(&config.embedding, &mut store)?;
        let emb_vars = store.take();

        let units = config.embedding.units;
        let par_net_heu = ParNet::new(
            &mut store,
            "par_net_heu",
            config.head_depth,
            units,
            config.preds,
            config.embedding.activation,
        )?;
        let z_net = config
            .partition_out_dim
            .map(|dim| PartitionHead::new(&mut store, "z_net", units, dim))
            .transpose()?;
        let head_vars = store.take();

        let net = Self {
            config,
            emb_net,
            par_net_heu,
            z_net,
            emb_vars,
            head_vars,
            emb_frozen: false,
        };
        debug!(
            variant = %net.variant(),
            depth = net.emb_net.depth(),
            units,
            partition_head = net.has_partition_head(),
            parameters = net.num_parameters(),
            seed,
            "built heuristic scorer"
        );
        Ok(net)
    }

    /// The configuration this network was built from.
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Embedding architecture in use.
    pub fn variant(&self) -> EmbeddingVariant {
        self.emb_net.variant()
    }

    /// Whether the partition-estimate head was built.
    pub fn has_partition_head(&self) -> bool {
        self.z_net.is_some()
    }

    /// Final edge representations `[M, U]`.
    pub fn embed(&self, graph: &InstanceGraph, mode: Mode) -> Result<Tensor> {
        trace!(
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            ?mode,
            "embedding instance"
        );
        self.emb_net.embed(graph, mode)
    }

    /// Heuristic vector: one value in (0, 1) per edge, in edge order.
    pub fn score(&self, graph: &InstanceGraph) -> Result<Tensor> {
        self.score_t(graph, Mode::Inference)
    }

    /// [`Net::score`] with an explicit forward mode.
    pub fn score_t(&self, graph: &InstanceGraph, mode: Mode) -> Result<Tensor> {
        let emb = self.embed(graph, mode)?;
        self.heuristic(&emb, graph.device())
    }

    /// Heuristic vector plus the partition estimate `[Z_out_dim]`.
    ///
    /// Fails with [`Error::MissingPartitionHead`] when the network was built
    /// without the head, and with [`Error::EmptyGraph`] when the graph has
    /// no edges to average over.
    pub fn score_with_partition_estimate(&self, graph: &InstanceGraph) -> Result<(Tensor, Tensor)> {
        self.score_with_partition_estimate_t(graph, Mode::Inference)
    }

    /// [`Net::score_with_partition_estimate`] with an explicit forward mode.
    pub fn score_with_partition_estimate_t(
        &self,
        graph: &InstanceGraph,
        mode: Mode,
    ) -> Result<(Tensor, Tensor)> {
        let z_net = self.z_net.as_ref().ok_or(Error::MissingPartitionHead)?;
        if graph.num_edges() == 0 {
            return Err(Error::EmptyGraph);
        }
        let emb = self.embed(graph, mode)?;
        let heu = self.heuristic(&emb, graph.device())?;
        let log_z = z_net.forward(&emb)?;
        Ok((heu, log_z))
    }

    /// Scores several instances.
    ///
    /// With the `parallel` feature the instances are scored concurrently;
    /// each forward pass stays single-threaded.
    pub fn score_batch(&self, graphs: &[InstanceGraph]) -> Result<Vec<Tensor>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            graphs.par_iter().map(|g| self.score(g)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            graphs.iter().map(|g| self.score(g)).collect()
        }
    }

    /// `reshape(graph, score(graph))`.
    ///
    /// Only defined for one prediction per edge; a network built with
    /// `preds > 1` fails with [`Error::InvalidConfig`].
    pub fn heuristic_matrix(&self, graph: &InstanceGraph) -> Result<Tensor> {
        if self.config.preds != 1 {
            return Err(Error::InvalidConfig(format!(
                "heuristic matrix needs preds = 1, network has preds = {}",
                self.config.preds
            )));
        }
        Self::reshape(graph, &self.score(graph)?)
    }

    /// Scatters a per-edge vector into an `N x N` matrix.
    ///
    /// `matrix[source, target] = vector[k]` for edge `k`; every other cell
    /// is exactly zero. Edges are unique per `(source, target)`, so no cell
    /// is written twice. Pure: the same inputs always give the same matrix.
    pub fn reshape(graph: &InstanceGraph, vector: &Tensor) -> Result<Tensor> {
        let n = graph.num_nodes();
        let m = graph.num_edges();
        let dims = vector.dims();
        if dims.len() != 1 {
            return Err(Error::ShapeMismatch {
                what: "heuristic vector rank",
                expected: 1,
                got: dims.len(),
            });
        }
        if dims[0] != m {
            return Err(Error::ShapeMismatch {
                what: "heuristic vector length",
                expected: m,
                got: dims[0],
            });
        }

        let device = graph.device();
        if m == 0 {
            return Ok(Tensor::zeros((n, n), vector.dtype(), device)?);
        }
        let cells: Vec<i64> = graph
            .edges()
            .iter()
            .map(|&(s, t)| (s * n + t) as i64)
            .collect();
        let cells = Tensor::from_vec(cells, m, device)?;
        let zeros = Tensor::zeros(n * n, vector.dtype(), device)?;
        Ok(zeros.index_add(&cells, vector, 0)?.reshape((n, n))?)
    }

    /// Excludes every embedding-network parameter from
    /// [`Net::trainable_parameters`]. There is no way back.
    ///
    /// Forward values are unaffected.
    pub fn freeze_embedding(&mut self) {
        if !self.emb_frozen {
            debug!(
                parameters = self.emb_vars.len(),
                "freezing embedding network"
            );
        }
        self.emb_frozen = true;
    }

    /// Whether [`Net::freeze_embedding`] has been called.
    pub fn is_embedding_frozen(&self) -> bool {
        self.emb_frozen
    }

    /// Learned weights an optimizer may update.
    ///
    /// Normalization running statistics are never included; embedding
    /// weights are dropped once the embedding is frozen.
    pub fn trainable_parameters(&self) -> Vec<Var> {
        let emb = self.emb_vars.iter().filter(|_| !self.emb_frozen);
        emb.chain(&self.head_vars)
            .filter(|v| v.kind == ParamKind::Weight)
            .map(|v| v.var.clone())
            .collect()
    }

    /// Every variable, weights and buffers, by name.
    pub fn parameters(&self) -> impl Iterator<Item = &NamedVar> {
        self.emb_vars.iter().chain(&self.head_vars)
    }

    /// Total number of learned scalar weights.
    pub fn num_parameters(&self) -> usize {
        self.parameters()
            .filter(|v| v.kind == ParamKind::Weight)
            .map(|v| v.var.elem_count())
            .sum()
    }

    fn heuristic(&self, emb: &Tensor, device: &Device) -> Result<Tensor> {
        if emb.dim(0)? == 0 {
            let empty = if self.config.preds == 1 {
                Tensor::zeros(0, DType::F32, device)?
            } else {
                Tensor::zeros((0, self.config.preds), DType::F32, device)?
            };
            return Ok(empty);
        }
        self.par_net_heu.forward(emb)
    }
}
