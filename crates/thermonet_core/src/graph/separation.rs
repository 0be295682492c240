use super::Topology;
use crate::error::{NetworkError, Result, SeparationViolation};
use crate::placement::Placement;
use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;
use thermonet_data::NodeId;

/// Checks the realized graph distance between logic-group nodes.
pub struct SeparationValidator<'a> {
    placement: &'a Placement,
    cap: usize,
    required: usize,
}

impl<'a> SeparationValidator<'a> {
    /// `cap` bounds the search depth (the grid edge); `required` is the minimum
    /// link separation.
    pub fn new(placement: &'a Placement, cap: usize, required: usize) -> Self {
        Self {
            placement,
            cap,
            required,
        }
    }

    /// Distance from every logic-group node to the nearest other one, capped.
    pub fn separations(&self, topology: &Topology) -> Vec<SeparationViolation> {
        let graph = topology.to_graph();
        let group: Vec<NodeId> = (0..self.placement.len())
            .filter(|&i| self.placement.role_of(i).is_logic_group())
            .collect();

        group
            .iter()
            .map(|&node| {
                let reached = dijkstra(&graph, NodeIndex::new(node), None, |_| 1usize);
                let separation = group
                    .iter()
                    .filter(|&&other| other != node)
                    .filter_map(|&other| reached.get(&NodeIndex::new(other)).copied())
                    .min()
                    .unwrap_or(self.cap)
                    .min(self.cap);
                SeparationViolation { node, separation }
            })
            .collect()
    }

    /// Returns the minimum separation, or a fatal error listing every node below
    /// the requirement.
    ///
    /// # Errors
    /// Returns [`NetworkError::Separation`] when any logic-group node sits closer
    /// than `required` links to another one.
    pub fn validate(&self, topology: &Topology) -> Result<usize> {
        let separations = self.separations(topology);
        let found = separations
            .iter()
            .map(|s| s.separation)
            .min()
            .unwrap_or(self.cap);

        if found < self.required {
            let violations: Vec<SeparationViolation> = separations
                .into_iter()
                .filter(|s| s.separation < self.required)
                .collect();
            for v in &violations {
                tracing::error!(node = v.node, separation = v.separation, "Logic node separation error");
            }
            return Err(NetworkError::Separation {
                found,
                required: self.required,
                violations,
            });
        }

        tracing::debug!(min_separation = found, "Separation check passed");
        Ok(found)
    }
}
