use rand::Rng;
use serde::{Deserialize, Serialize};
use thermonet_data::{NodeId, RuleType, SynapseId};

/// Weight dynamics of a synapse, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plasticity {
    /// Weight never moves from its initial value.
    Fixed,
    /// Weight relaxes toward the Hebbian drive and the target.
    Adaptive,
}

/// Construction parameters resolved from the class-pair rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct SynapseParams {
    pub id: SynapseId,
    pub rule: RuleType,
    pub energy_factor: f64,
    pub depth: u64,
    pub bound: f64,
    pub target: f64,
    pub noise: f64,
    pub size_mass: f64,
    pub change_mass: f64,
}

/// A weighted link between two nodes (or a node and itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    pub id: SynapseId,
    pub i: NodeId,
    pub j: NodeId,
    pub plasticity: Plasticity,
    pub energy_factor: f64,
    /// Number of weight updates applied.
    pub depth: u64,
    pub bound: f64,
    pub target: f64,
    pub noise: f64,
    pub size_mass: f64,
    pub change_mass: f64,
    pub weight: f64,
    /// Last values pushed by the `i` and `j` endpoints.
    pushed: [f64; 2],
}

impl Synapse {
    /// Builds a synapse between `i` and `j` with a noisy initial weight.
    ///
    /// `plastic` reports membership in the plastic partition; synapses outside it
    /// keep their weight even when their rule is adaptive.
    pub fn new<R: Rng>(params: &SynapseParams, i: NodeId, j: NodeId, plastic: bool, rng: &mut R) -> Self {
        let plasticity = if plastic && params.rule != RuleType::Fixed {
            Plasticity::Adaptive
        } else {
            Plasticity::Fixed
        };
        let jitter = if params.noise > 0.0 {
            params.noise * rng.gen_range(-1.0..=1.0)
        } else {
            0.0
        };
        Self {
            id: params.id,
            i,
            j,
            plasticity,
            energy_factor: params.energy_factor,
            depth: params.depth,
            bound: params.bound,
            target: params.target,
            noise: params.noise,
            size_mass: params.size_mass,
            change_mass: params.change_mass,
            weight: (params.target + jitter).clamp(-params.bound, params.bound),
            pushed: [0.0; 2],
        }
    }

    #[inline]
    pub fn is_recurrent(&self) -> bool {
        self.i == self.j
    }

    /// Records the output of an endpoint.
    pub fn push_state(&mut self, node: NodeId, value: f64) {
        if node == self.i {
            self.pushed[0] = value;
        }
        if node == self.j {
            self.pushed[1] = value;
        }
    }

    /// Last value pushed by `node`.
    #[inline]
    pub fn value_of(&self, node: NodeId) -> f64 {
        if node == self.i {
            self.pushed[0]
        } else {
            self.pushed[1]
        }
    }

    /// Pushed value of the endpoint opposite to `node` (its own value for a self loop).
    #[inline]
    pub fn other_value(&self, node: NodeId) -> f64 {
        if node == self.i {
            self.pushed[1]
        } else {
            self.pushed[0]
        }
    }

    /// Contribution of this synapse to the local field of `node`.
    #[inline]
    pub fn input_for(&self, node: NodeId) -> f64 {
        self.weight * self.other_value(node)
    }

    /// Applies one adaptive weight step from the pushed endpoint values.
    ///
    /// `w += (ef * x_i * x_j - (w - target) / size_mass) / change_mass`, clamped
    /// to `[-bound, bound]`. A zero size mass disables the restoring term.
    pub fn update_state(&mut self, weight_update: bool) {
        if !weight_update || self.plasticity == Plasticity::Fixed {
            return;
        }
        let [xi, xj] = self.pushed;
        let drive = self.energy_factor * xi * xj;
        let restore = if self.size_mass > 0.0 {
            (self.weight - self.target) / self.size_mass
        } else {
            0.0
        };
        self.weight = (self.weight + (drive - restore) / self.change_mass).clamp(-self.bound, self.bound);
        self.depth += 1;
    }

    /// Alignment of the weight with its endpoint values.
    #[inline]
    pub fn order(&self) -> f64 {
        self.weight * self.pushed[0] * self.pushed[1]
    }

    #[inline]
    pub fn energy(&self) -> f64 {
        self.weight * self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(rule: RuleType) -> SynapseParams {
        SynapseParams {
            id: 0,
            rule,
            energy_factor: 1.0,
            depth: 0,
            bound: 1.0,
            target: 0.5,
            noise: 0.0,
            size_mass: 10.0,
            change_mass: 2.0,
        }
    }

    #[test]
    fn test_initial_weight_within_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let p = SynapseParams {
            noise: 5.0,
            ..params(RuleType::Adaptive)
        };
        for _ in 0..100 {
            let s = Synapse::new(&p, 0, 1, true, &mut rng);
            assert!(s.weight.abs() <= 1.0);
        }
    }

    #[test]
    fn test_fixed_synapse_never_changes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut s = Synapse::new(&params(RuleType::Fixed), 0, 1, true, &mut rng);
        s.push_state(0, 1.0);
        s.push_state(1, 1.0);
        s.update_state(true);
        assert_eq!(s.weight, 0.5);
        assert_eq!(s.depth, 0);
    }

    #[test]
    fn test_adaptive_update_moves_toward_alignment() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut s = Synapse::new(&params(RuleType::Adaptive), 0, 1, true, &mut rng);
        s.push_state(0, 1.0);
        s.push_state(1, -1.0);
        s.update_state(true);
        // (-1 - 0 / 10) / 2
        assert!((s.weight - 0.0).abs() < 1e-12);
        assert_eq!(s.depth, 1);

        s.update_state(false);
        assert_eq!(s.depth, 1);
    }

    #[test]
    fn test_self_loop_reads_own_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut s = Synapse::new(&params(RuleType::Adaptive), 3, 3, true, &mut rng);
        s.push_state(3, -1.0);
        assert!(s.is_recurrent());
        assert_eq!(s.input_for(3), -0.5);
        assert_eq!(s.order(), 0.5);
    }
}
