//! Terminal edge weight distributions.
//!
//! Weights are scaled by `sqrt(2 * energy_factor)` of their synapse and binned at
//! a fixed resolution of four bins per unit. Each bin carries the count at the
//! end of the run next to the count captured right after priming.

use crate::network::Network;
use thermonet_data::{HistogramBin, WeightDistributions};

/// Bins per unit of scaled weight.
pub const RESOLUTION: f64 = 4.0;

/// Scaled weight samples taken at one point of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightSnapshot {
    /// One entry per plastic synapse.
    pub weight: Vec<f64>,
    /// One entry per network-group node.
    pub node_sum: Vec<f64>,
    pub node_abs_sum: Vec<f64>,
}

impl WeightSnapshot {
    pub fn capture(network: &Network) -> Self {
        let scaled = |k: usize| {
            let s = &network.synapses[k];
            s.weight * (2.0 * s.energy_factor).sqrt()
        };

        let weight = network.topology.plastic.iter().map(|&k| scaled(k)).collect();
        let (node_sum, node_abs_sum) = network
            .network_group()
            .iter()
            .map(|&i| {
                network.topology.node_to_synapse[i]
                    .iter()
                    .fold((0.0, 0.0), |(sum, abs), &k| {
                        let w = scaled(k);
                        (sum + w, abs + w.abs())
                    })
            })
            .unzip();

        Self {
            weight,
            node_sum,
            node_abs_sum,
        }
    }

    /// Pairs this (final) snapshot with the initial one.
    pub fn distributions(&self, initial: &WeightSnapshot) -> WeightDistributions {
        WeightDistributions {
            weight: signed_histogram(&self.weight, &initial.weight),
            node_sum: signed_histogram(&self.node_sum, &initial.node_sum),
            node_abs_sum: magnitude_histogram(&self.node_abs_sum, &initial.node_abs_sum),
        }
    }
}

#[inline]
fn bin_of(value: f64) -> i64 {
    (RESOLUTION * value).round() as i64
}

fn extent(samples: &[&[f64]]) -> i64 {
    samples
        .iter()
        .flat_map(|s| s.iter())
        .map(|&v| bin_of(v).abs())
        .max()
        .unwrap_or(0)
}

/// Bins from `-max` to `max`.
pub fn signed_histogram(final_values: &[f64], initial_values: &[f64]) -> Vec<HistogramBin> {
    let max = extent(&[final_values, initial_values]);
    let width = (2 * max + 1) as usize;
    let mut final_count = vec![0; width];
    let mut initial_count = vec![0; width];
    for &v in final_values {
        final_count[(bin_of(v) + max) as usize] += 1;
    }
    for &v in initial_values {
        initial_count[(bin_of(v) + max) as usize] += 1;
    }
    (0..width)
        .map(|m| HistogramBin {
            bin: (m as i64 - max) as f64 / RESOLUTION,
            final_count: final_count[m],
            initial_count: initial_count[m],
        })
        .collect()
}

/// Bins from `0` to `max` for non-negative samples.
pub fn magnitude_histogram(final_values: &[f64], initial_values: &[f64]) -> Vec<HistogramBin> {
    let max = extent(&[final_values, initial_values]);
    let width = (max + 1) as usize;
    let mut final_count = vec![0; width];
    let mut initial_count = vec![0; width];
    for &v in final_values {
        final_count[bin_of(v).unsigned_abs() as usize] += 1;
    }
    for &v in initial_values {
        initial_count[bin_of(v).unsigned_abs() as usize] += 1;
    }
    (0..width)
        .map(|m| HistogramBin {
            bin: m as f64 / RESOLUTION,
            final_count: final_count[m],
            initial_count: initial_count[m],
        })
        .collect()
}
