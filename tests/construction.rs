mod common;

use common::{class, ConfigBuilder};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use thermonet_core::graph::ProbabilisticGraphBuilder;
use thermonet_core::grid::GridTopology;
use thermonet_core::network::Network;
use thermonet_core::placement::NodePlacementEngine;
use thermonet_data::{NetworkMode, NodeRole, RuleType};

fn random_config(link_separation: usize) -> thermonet_core::config::AppConfig {
    ConfigBuilder::empty(10, 2)
        .bipartite(false)
        .mode(NetworkMode::Random)
        .link_separation(link_separation)
        .class(class("network", NodeRole::Network, 100, 4))
        .rule("network", "network", RuleType::Adaptive)
        .build()
}

#[test]
fn test_random_quota_build_conserves_degree() {
    let config = random_config(0);
    let grid = GridTopology::new(10, 2);
    let rules = config.rule_table();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let placement = NodePlacementEngine::new(&config, &grid, &rules)
        .place(&mut rng)
        .unwrap();
    let outcome = ProbabilisticGraphBuilder::new(&config, &grid, &placement, &rules).build(&mut rng);
    let topology = &outcome.topology;

    let degrees: Vec<usize> = (0..100).map(|i| topology.degree(i)).collect();
    let degree_sum: usize = degrees.iter().sum();
    assert_eq!(degree_sum, 2 * topology.edge_count());
    assert_eq!(degree_sum + outcome.unmet_connections(), outcome.quotas.iter().sum::<usize>());
    assert_eq!(outcome.quotas.iter().sum::<usize>(), 400);
    for (i, &d) in degrees.iter().enumerate() {
        assert!(d <= 4, "node {} exceeds its quota with degree {}", i, d);
        assert_eq!(d + outcome.failures[i], outcome.quotas[i]);
    }

    let mut seen = HashSet::new();
    for &(a, b) in &topology.synapse_key_map {
        assert_ne!(a, b);
        assert!(seen.insert((a.min(b), a.max(b))), "duplicate edge {}-{}", a, b);
    }
}

#[test]
fn test_neighbor_edges_follow_precedence_and_parity() {
    let network = Network::build_with_seed(&ConfigBuilder::new().build(), 8).unwrap();
    let topology = &network.topology;
    let mut seen = HashSet::new();

    for &(a, b) in &topology.synapse_key_map[..topology.edge_count()] {
        // Earlier-ranked class second.
        assert!(network.placement.class_of(b) <= network.placement.class_of(a));
        assert_ne!(network.grid.parity(a), network.grid.parity(b));
        assert_eq!(network.grid.distance(a, b), 1);
        assert!(seen.insert((a.min(b), a.max(b))));
    }
}

#[test]
fn test_logic_group_never_adjacent_in_default_network() {
    let network = Network::build_with_seed(&ConfigBuilder::new().build(), 21).unwrap();
    for &i in network.logic_group() {
        for &j in &network.topology.node_to_node[i] {
            assert!(!network.placement.role_of(j).is_logic_group());
        }
    }
}

#[test]
fn test_plastic_set_is_order_then_recurrent() {
    let config = ConfigBuilder::new()
        .with_config(|c| {
            c.classes[2].variants[0].recur = 2;
        })
        .build();
    let network = Network::build_with_seed(&config, 13).unwrap();
    let topology = &network.topology;

    assert_eq!(topology.recurrent.len(), 60 * 2);
    let expected: Vec<usize> = topology
        .order
        .iter()
        .chain(&topology.recurrent)
        .copied()
        .collect();
    assert_eq!(topology.plastic, expected);
    for &k in &topology.recurrent {
        let (a, b) = topology.endpoints(k);
        assert_eq!(a, b);
        assert_eq!(network.placement.role_of(a), NodeRole::Network);
        assert!(network.synapses[k].is_recurrent());
    }
    // Bias synapses are fixed and never order-eligible.
    for &k in &topology.order {
        let (a, b) = topology.endpoints(k);
        assert_ne!(network.placement.role_of(a), NodeRole::Bias);
        assert_ne!(network.placement.role_of(b), NodeRole::Bias);
    }
}

#[test]
fn test_every_position_holds_one_node_of_the_catalog() {
    let config = ConfigBuilder::new().build();
    let network = Network::build_with_seed(&config, 4).unwrap();
    let records = network.node_records();
    assert_eq!(records.len(), network.grid.len());

    let positions: HashSet<Vec<usize>> = records.iter().map(|r| r.position.clone()).collect();
    assert_eq!(positions.len(), records.len());

    for (rank, class) in config.classes.iter().enumerate() {
        let placed = network
            .placement
            .nodes
            .iter()
            .filter(|p| p.class == rank)
            .count();
        let wanted: usize = class.variants.iter().map(|v| v.quantity).sum();
        assert_eq!(placed, wanted, "class {}", class.name);
    }
}

#[test]
fn test_complement_instances_alternate_polarity() {
    let network = Network::build_with_seed(&ConfigBuilder::new().build(), 6).unwrap();
    for p in &network.placement.nodes {
        if p.role.is_logic_group() {
            assert_eq!(p.complement, p.instance % 2 == 1);
            assert_eq!(p.polarity, if p.complement { -1 } else { 1 });
        }
    }
}
