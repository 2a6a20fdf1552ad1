//! End-to-end scorer behavior on small instances.

use candle_core::{Device, Tensor};
use u_heurnet::embed::EmbeddingVariant;
use u_heurnet::graph::InstanceGraph;
use u_heurnet::net::{Net, NetConfig};
use u_heurnet::nn::Mode;
use u_heurnet::Error;

fn example_graph(dev: &Device) -> InstanceGraph {
    InstanceGraph::new(
        &[vec![2.0], vec![1.0], vec![3.0]],
        &[(0, 1), (1, 2), (2, 0)],
        &[0.5, 0.5, 0.5],
        dev,
    )
    .unwrap()
}

fn variants() -> [EmbeddingVariant; 2] {
    [EmbeddingVariant::Gated, EmbeddingVariant::Original]
}

#[test]
fn test_three_node_example() {
    let dev = Device::Cpu;
    let graph = example_graph(&dev);

    for variant in variants() {
        let config = NetConfig::default()
            .with_variant(variant)
            .with_depth(1)
            .with_units(4)
            .with_seed(2024);
        let net = Net::new(config, &dev).unwrap();

        let heu = net.score(&graph).unwrap();
        let values = heu.to_vec1::<f32>().unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| *v > 0.0 && *v < 1.0));

        let matrix = Net::reshape(&graph, &heu).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(matrix[0][1], values[0]);
        assert_eq!(matrix[1][2], values[1]);
        assert_eq!(matrix[2][0], values[2]);
        let zeros = [(0, 0), (0, 2), (1, 0), (1, 1), (2, 1), (2, 2)];
        for (i, j) in zeros {
            assert_eq!(matrix[i][j], 0.0, "cell ({i}, {j}) should be empty");
        }
    }
}

fn bin_packing_sizes(n: usize) -> Vec<f32> {
    (0..n).map(|i| 20.0 + ((i * 37) % 81) as f32).collect()
}

#[test]
fn test_default_config_scores_stay_open_on_large_instances() {
    let dev = Device::Cpu;
    for n in [20, 50, 120] {
        let graph = InstanceGraph::complete(&bin_packing_sizes(n), &dev).unwrap();
        for variant in variants() {
            for seed in 0..2 {
                let config = NetConfig::default().with_variant(variant).with_seed(seed);
                let net = Net::new(config, &dev).unwrap();
                let heu = net.score(&graph).unwrap().to_vec1::<f32>().unwrap();
                assert_eq!(heu.len(), n * (n - 1));
                let bad = heu.iter().filter(|v| !(**v > 0.0 && **v < 1.0)).count();
                assert_eq!(bad, 0, "{variant} n={n} seed={seed}: {bad} scores outside (0, 1)");
            }
        }
    }
}

#[test]
fn test_empty_instance() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::complete(&[], &dev).unwrap();
    assert_eq!(graph.num_nodes(), 0);
    for variant in variants() {
        let net = Net::new(NetConfig::tiny().with_variant(variant).with_seed(4), &dev).unwrap();
        assert_eq!(net.score(&graph).unwrap().dims(), &[0]);
        assert_eq!(net.heuristic_matrix(&graph).unwrap().dims(), &[0, 0]);
    }
}

#[test]
fn test_heuristic_matrix_needs_single_prediction() {
    let dev = Device::Cpu;
    let graph = example_graph(&dev);
    let net = Net::new(NetConfig::tiny().with_preds(2).with_seed(5), &dev).unwrap();
    assert_eq!(net.score(&graph).unwrap().dims(), &[3, 2]);
    assert!(matches!(
        net.heuristic_matrix(&graph),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_reshape_is_bit_identical_across_calls() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::complete(&[0.4, 0.1, 0.9, 0.6, 0.3], &dev).unwrap();
    let net = Net::new(NetConfig::tiny().with_seed(8), &dev).unwrap();
    let heu = net.score(&graph).unwrap();

    let a = Net::reshape(&graph, &heu).unwrap().to_vec2::<f32>().unwrap();
    let b = Net::reshape(&graph, &heu).unwrap().to_vec2::<f32>().unwrap();
    let bits = |m: &Vec<Vec<f32>>| -> Vec<u32> { m.iter().flatten().map(|v| v.to_bits()).collect() };
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn test_zero_edge_graph() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::new(&[vec![1.0], vec![2.0], vec![3.0]], &[], &[], &dev).unwrap();

    for variant in variants() {
        let net = Net::new(NetConfig::tiny().with_variant(variant).with_seed(1), &dev).unwrap();
        let heu = net.score(&graph).unwrap();
        assert_eq!(heu.dims(), &[0]);

        let matrix = Net::reshape(&graph, &heu).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(matrix, vec![vec![0.0; 3]; 3]);
    }
}

#[test]
fn test_zero_edge_graph_partition_estimate() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::new(&[vec![1.0]], &[], &[], &dev).unwrap();
    let net = Net::new(NetConfig::tiny().with_partition_head(1).with_seed(1), &dev).unwrap();
    assert!(matches!(
        net.score_with_partition_estimate(&graph),
        Err(Error::EmptyGraph)
    ));
}

#[test]
fn test_variants_share_output_shape() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::complete(&[0.2, 0.9, 0.4, 0.6], &dev).unwrap();
    let shapes: Vec<Vec<usize>> = variants()
        .iter()
        .map(|&v| {
            let config = NetConfig::default()
                .with_variant(v)
                .with_depth(3)
                .with_units(16)
                .with_seed(9);
            let net = Net::new(config, &dev).unwrap();
            net.embed(&graph, Mode::Inference).unwrap().dims().to_vec()
        })
        .collect();
    assert_eq!(shapes[0], vec![12, 16]);
    assert_eq!(shapes[0], shapes[1]);
}

#[test]
fn test_same_seed_same_scores() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::complete(&[0.25, 0.5, 0.75], &dev).unwrap();
    for variant in variants() {
        let config = NetConfig::default().with_variant(variant).with_seed(77);
        let a = Net::new(config.clone(), &dev).unwrap();
        let b = Net::new(config, &dev).unwrap();
        assert_eq!(
            a.score(&graph).unwrap().to_vec1::<f32>().unwrap(),
            b.score(&graph).unwrap().to_vec1::<f32>().unwrap()
        );
    }
}

#[test]
fn test_freeze_keeps_outputs() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::complete(&[0.3, 0.8, 0.5], &dev).unwrap();
    let config = NetConfig::default()
        .with_variant(EmbeddingVariant::Original)
        .with_partition_head(1)
        .with_seed(13);
    let mut net = Net::new(config, &dev).unwrap();

    let (heu, log_z) = net.score_with_partition_estimate(&graph).unwrap();
    net.freeze_embedding();
    net.freeze_embedding();
    let (heu2, log_z2) = net.score_with_partition_estimate(&graph).unwrap();

    assert_eq!(heu.to_vec1::<f32>().unwrap(), heu2.to_vec1::<f32>().unwrap());
    assert_eq!(log_z.to_vec1::<f32>().unwrap(), log_z2.to_vec1::<f32>().unwrap());
    assert!(net.is_embedding_frozen());
}

#[test]
fn test_node_feature_width_mismatch() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::new(
        &[vec![1.0, 0.5], vec![2.0, 0.5]],
        &[(0, 1)],
        &[1.0],
        &dev,
    )
    .unwrap();
    let net = Net::new(NetConfig::tiny().with_seed(0), &dev).unwrap();
    assert!(matches!(
        net.score(&graph),
        Err(Error::ShapeMismatch {
            what: "node feature width",
            expected: 1,
            got: 2
        })
    ));
}

#[test]
fn test_wider_node_features() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::new(
        &[vec![1.0, 0.5], vec![2.0, 0.5], vec![0.1, 0.9]],
        &[(0, 1), (1, 2), (2, 1)],
        &[1.0, 0.2, 0.3],
        &dev,
    )
    .unwrap();
    let mut config = NetConfig::tiny().with_seed(0);
    config.embedding.node_features = 2;
    let net = Net::new(config, &dev).unwrap();
    assert_eq!(net.score(&graph).unwrap().dims(), &[3]);
}

#[test]
fn test_asymmetric_edges_reshape() {
    let dev = Device::Cpu;
    let graph = InstanceGraph::new(
        &[vec![1.0], vec![1.0], vec![1.0], vec![1.0]],
        &[(3, 0), (0, 3), (1, 2)],
        &[0.1, 0.2, 0.3],
        &dev,
    )
    .unwrap();
    let vector = Tensor::new(&[0.7f32, 0.8, 0.9], &dev).unwrap();
    let matrix = Net::reshape(&graph, &vector).unwrap().to_vec2::<f32>().unwrap();
    assert_eq!(matrix[3][0], 0.7);
    assert_eq!(matrix[0][3], 0.8);
    assert_eq!(matrix[1][2], 0.9);
    assert_eq!(matrix[2][1], 0.0);
    let nonzero = matrix.iter().flatten().filter(|v| **v != 0.0).count();
    assert_eq!(nonzero, 3);
}
