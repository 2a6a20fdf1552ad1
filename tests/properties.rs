//! Property tests over random instance graphs.

use candle_core::{Device, Tensor};
use proptest::prelude::*;
use std::collections::BTreeSet;
use u_heurnet::aggregate::{group_reduce, Aggregation};
use u_heurnet::embed::EmbeddingVariant;
use u_heurnet::graph::InstanceGraph;
use u_heurnet::net::{Net, NetConfig};

/// Item sizes plus a unique edge set over them.
fn instance() -> impl Strategy<Value = (Vec<f32>, Vec<(usize, usize)>, Vec<f32>)> {
    (1usize..7).prop_flat_map(|n| {
        let sizes = prop::collection::vec(0.01f32..1.0, n);
        let edges = prop::collection::btree_set((0..n, 0..n), 0..=n * n);
        (sizes, edges).prop_flat_map(|(sizes, edges): (Vec<f32>, BTreeSet<(usize, usize)>)| {
            let m = edges.len();
            let edges: Vec<(usize, usize)> = edges.into_iter().collect();
            (
                Just(sizes),
                Just(edges),
                prop::collection::vec(0.0f32..1.0, m),
            )
        })
    })
}

fn build(sizes: &[f32], edges: &[(usize, usize)], weights: &[f32]) -> InstanceGraph {
    let rows: Vec<Vec<f32>> = sizes.iter().map(|&s| vec![s]).collect();
    InstanceGraph::new(&rows, edges, weights, &Device::Cpu).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_scores_in_open_unit_interval(
        (sizes, edges, weights) in instance(),
        original in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let graph = build(&sizes, &edges, &weights);
        let variant = if original { EmbeddingVariant::Original } else { EmbeddingVariant::Gated };
        let config = NetConfig::default()
            .with_variant(variant)
            .with_depth(2)
            .with_units(8)
            .with_seed(seed);
        let net = Net::new(config, &Device::Cpu).unwrap();

        let heu = net.score(&graph).unwrap().to_vec1::<f32>().unwrap();
        prop_assert_eq!(heu.len(), edges.len());
        for v in &heu {
            prop_assert!(*v > 0.0 && *v < 1.0, "score {} outside (0, 1)", v);
        }
    }

    #[test]
    fn prop_reshape_is_sparse_encoding(
        (sizes, edges, weights) in instance(),
    ) {
        let graph = build(&sizes, &edges, &weights);
        let n = sizes.len();
        let vector = Tensor::new(weights.as_slice(), &Device::Cpu).unwrap();
        let matrix = Net::reshape(&graph, &vector).unwrap().to_vec2::<f32>().unwrap();

        prop_assert_eq!(matrix.len(), n);
        let edge_set: BTreeSet<(usize, usize)> = edges.iter().copied().collect();
        for (k, &(s, t)) in edges.iter().enumerate() {
            prop_assert_eq!(matrix[s][t], weights[k]);
        }
        for i in 0..n {
            for j in 0..n {
                if !edge_set.contains(&(i, j)) {
                    prop_assert_eq!(matrix[i][j], 0.0);
                }
            }
        }
    }

    #[test]
    fn prop_group_sum_matches_host_sum(
        rows in prop::collection::vec((0usize..5, -10.0f32..10.0), 0..40),
    ) {
        let dev = Device::Cpu;
        let index: Vec<u32> = rows.iter().map(|&(g, _)| g as u32).collect();
        let values: Vec<f32> = rows.iter().map(|&(_, v)| v).collect();
        let m = rows.len();

        let values_t = Tensor::from_vec(values.clone(), (m, 1), &dev).unwrap();
        let index_t = Tensor::from_vec(index, m, &dev).unwrap();
        let out = group_reduce(&values_t, &index_t, 5, Aggregation::Sum).unwrap();
        let out = out.flatten_all().unwrap().to_vec1::<f32>().unwrap();

        let mut expected = [0.0f32; 5];
        for &(g, v) in &rows {
            expected[g] += v;
        }
        for (a, b) in out.iter().zip(expected.iter()) {
            prop_assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }
}

proptest! {
    // Full-depth networks on bin-packing-scale instances are slow; fewer cases.
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn prop_default_config_scores_in_open_unit_interval(
        sizes in (20usize..=60).prop_flat_map(|n| prop::collection::vec(20.0f32..100.0, n)),
        original in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let graph = InstanceGraph::complete(&sizes, &Device::Cpu).unwrap();
        let variant = if original { EmbeddingVariant::Original } else { EmbeddingVariant::Gated };
        let net = Net::new(NetConfig::default().with_variant(variant).with_seed(seed), &Device::Cpu).unwrap();

        let heu = net.score(&graph).unwrap().to_vec1::<f32>().unwrap();
        prop_assert_eq!(heu.len(), sizes.len() * (sizes.len() - 1));
        for v in &heu {
            prop_assert!(*v > 0.0 && *v < 1.0, "score {} outside (0, 1)", v);
        }
    }
}
