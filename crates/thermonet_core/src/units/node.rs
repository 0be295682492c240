use super::synapse::Synapse;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thermonet_data::{LogicMode, NodeId, NodeRole, NodeStateRecord, SynapseId};

/// Update behavior of a node, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Driven by the era's logic mode; `period` is the clamp half period.
    Logic { period: u32 },
    /// Holds its polarity.
    Bias,
    /// Relaxes under the Boltzmann rule.
    Network,
}

impl NodeKind {
    #[must_use]
    pub fn from_role(role: NodeRole, period: u32) -> Self {
        match role {
            NodeRole::Logic => NodeKind::Logic { period },
            NodeRole::Bias => NodeKind::Bias,
            NodeRole::Network => NodeKind::Network,
        }
    }

    #[inline]
    pub fn role(self) -> NodeRole {
        match self {
            NodeKind::Logic { .. } => NodeRole::Logic,
            NodeKind::Bias => NodeRole::Bias,
            NodeKind::Network => NodeRole::Network,
        }
    }
}

/// Construction parameters of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeParams {
    pub id: NodeId,
    pub class: usize,
    pub kind: NodeKind,
    pub states: u32,
    pub polarity: i8,
    pub energy_factor: f64,
    pub threshold: f64,
}

/// A synapse registered on a node with its weight target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynapseLink {
    pub synapse: SynapseId,
    pub target: f64,
}

/// Observables of a node after its latest update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub value: f64,
    pub energy: f64,
    pub free_energy: f64,
    pub entropy: f64,
    pub dissipation: f64,
    pub transport: f64,
    pub quality_numer: f64,
    pub quality_denom: f64,
    pub state_change: f64,
    /// The drawn level is not the minimum-energy level.
    pub fluctuation: bool,
    pub solved: bool,
    pub mode: LogicMode,
}

impl NodeState {
    fn resting(value: f64) -> Self {
        Self {
            value,
            energy: 0.0,
            free_energy: 0.0,
            entropy: 0.0,
            dissipation: 0.0,
            transport: 0.0,
            quality_numer: 0.0,
            quality_denom: 0.0,
            state_change: 0.0,
            fluctuation: false,
            solved: false,
            mode: LogicMode::Free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub time: u64,
    pub value: f64,
    pub energy: f64,
    pub entropy: f64,
}

/// Per-step inputs shared by every node of a phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateContext {
    pub seed: u64,
    pub time: u64,
    pub era: usize,
    pub weight_update: bool,
    pub logic_mode: LogicMode,
}

impl UpdateContext {
    /// Deterministic per-node stream so phase updates can run in any order.
    pub fn rng_for(&self, node: NodeId) -> ChaCha8Rng {
        let mut seed = self
            .time
            .wrapping_add(self.seed)
            .wrapping_mul(0x517C_C1B7_2722_0A95);
        seed ^= node as u64;
        seed = seed.wrapping_mul(0x517C_C1B7_2722_0A95);
        seed ^= self.era as u64;
        ChaCha8Rng::seed_from_u64(seed)
    }
}

/// A grid node with discrete state levels evenly spaced in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub class: usize,
    pub kind: NodeKind,
    pub states: u32,
    pub polarity: i8,
    pub energy_factor: f64,
    /// Temperature of the Boltzmann rule.
    pub threshold: f64,
    pub synapses: Vec<SynapseLink>,
    pub state: NodeState,
    pub history: Vec<HistoryEntry>,
}

impl Node {
    pub fn new(params: &NodeParams) -> Self {
        Self {
            id: params.id,
            class: params.class,
            kind: params.kind,
            states: params.states,
            polarity: params.polarity,
            energy_factor: params.energy_factor,
            threshold: params.threshold,
            synapses: Vec::new(),
            state: NodeState::resting(f64::from(params.polarity)),
            history: Vec::new(),
        }
    }

    pub fn add_synapse(&mut self, synapse: SynapseId, target: f64) {
        self.synapses.push(SynapseLink { synapse, target });
    }

    #[inline]
    pub fn role(&self) -> NodeRole {
        self.kind.role()
    }

    #[inline]
    pub fn level(&self, k: u32) -> f64 {
        -1.0 + 2.0 * f64::from(k) / f64::from(self.states - 1)
    }

    /// Local field and transport from the values pushed into the node's synapses.
    pub fn field(&self, synapses: &[Synapse]) -> (f64, f64) {
        self.synapses.iter().fold((0.0, 0.0), |(h, t), link| {
            let input = synapses[link.synapse].input_for(self.id);
            (h + input, t + input.abs())
        })
    }

    #[inline]
    fn energy_at(&self, value: f64, h: f64) -> f64 {
        -self.energy_factor * value * h
    }

    /// Computes the next state without mutating the node.
    pub fn compute(&self, ctx: &UpdateContext, synapses: &[Synapse]) -> NodeState {
        let (h, transport) = self.field(synapses);
        let mut rng = ctx.rng_for(self.id);

        let (value, free_energy, entropy, fluctuation, mode) = match self.kind {
            NodeKind::Bias => {
                let value = f64::from(self.polarity);
                let e = self.energy_at(value, h);
                (value, e, 0.0, false, ctx.logic_mode)
            }
            NodeKind::Logic { period } => match ctx.logic_mode {
                LogicMode::Noise => {
                    let value = self.level(rng.gen_range(0..self.states));
                    (value, self.energy_at(value, h), 0.0, false, LogicMode::Noise)
                }
                LogicMode::Clamp => {
                    let value = f64::from(self.polarity) * square_wave(ctx.time, period);
                    (value, self.energy_at(value, h), 0.0, false, LogicMode::Clamp)
                }
                LogicMode::Free => {
                    let (value, free, entropy, fluctuation) = self.boltzmann(h, &mut rng);
                    (value, free, entropy, fluctuation, LogicMode::Free)
                }
            },
            NodeKind::Network => {
                let (value, free, entropy, fluctuation) = self.boltzmann(h, &mut rng);
                (value, free, entropy, fluctuation, LogicMode::Free)
            }
        };

        let energy = self.energy_at(value, h);
        let previous = self.energy_at(self.state.value, h);
        NodeState {
            value,
            energy,
            free_energy,
            entropy,
            dissipation: (previous - energy).max(0.0),
            transport,
            quality_numer: h.abs(),
            quality_denom: transport,
            state_change: value - self.state.value,
            fluctuation,
            solved: self.state.solved,
            mode,
        }
    }

    /// Samples a level from `exp(-E / T)`.
    ///
    /// Returns (value, free energy, entropy, fluctuation). A zero temperature picks
    /// the minimum-energy level deterministically.
    fn boltzmann<R: Rng>(&self, h: f64, rng: &mut R) -> (f64, f64, f64, bool) {
        let energies: Vec<f64> = (0..self.states)
            .map(|k| self.energy_at(self.level(k), h))
            .collect();
        let (ground, e_min) = energies
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (k, e)| if e < best.1 { (k, e) } else { best });

        let t = self.threshold;
        if t <= 0.0 {
            return (self.level(ground as u32), e_min, 0.0, false);
        }

        let weights: Vec<f64> = energies.iter().map(|e| (-(e - e_min) / t).exp()).collect();
        let z: f64 = weights.iter().sum();
        let entropy = -weights
            .iter()
            .map(|w| w / z)
            .filter(|&p| p > 0.0)
            .map(|p| p * p.ln())
            .sum::<f64>();

        let mut seed = rng.gen::<f64>() * z;
        let mut chosen = weights.len() - 1;
        for (k, w) in weights.iter().enumerate() {
            if seed < *w {
                chosen = k;
                break;
            }
            seed -= w;
        }

        (
            self.level(chosen as u32),
            e_min - t * z.ln(),
            entropy,
            chosen != ground,
        )
    }

    /// Adopts a computed state, appending to the history when enabled.
    pub fn commit(&mut self, next: NodeState, time: u64, record_history: bool) {
        self.state = next;
        if record_history {
            self.history.push(HistoryEntry {
                time,
                value: next.value,
                energy: next.energy,
                entropy: next.entropy,
            });
        }
    }

    /// Marks a logic node solved when its state agrees with its field.
    pub fn evaluate(&mut self, synapses: &[Synapse]) {
        let (h, _) = self.field(synapses);
        self.state.solved = self.state.value * h > 0.0;
    }

    pub fn record(&self, time: u64) -> NodeStateRecord {
        NodeStateRecord {
            time,
            id: self.id,
            energy: self.state.energy,
            state: self.state.value,
            fluctuation: self.state.fluctuation,
            entropy: self.state.entropy,
            solved: self.state.solved,
            dissipation: self.state.dissipation,
            transport: self.state.transport,
            logic_mode: self.state.mode,
        }
    }
}

/// `+1` for the first half period, `-1` for the second; constant when `period` is 0.
fn square_wave(time: u64, period: u32) -> f64 {
    if period == 0 || (time / u64::from(period)) % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::synapse::{Synapse, SynapseParams};
    use thermonet_data::RuleType;

    fn node(id: NodeId, kind: NodeKind, threshold: f64) -> Node {
        Node::new(&NodeParams {
            id,
            class: 0,
            kind,
            states: 2,
            polarity: 1,
            energy_factor: 1.0,
            threshold,
        })
    }

    fn ctx(mode: LogicMode, time: u64) -> UpdateContext {
        UpdateContext {
            seed: 7,
            time,
            era: 0,
            weight_update: false,
            logic_mode: mode,
        }
    }

    fn link(weight: f64, other: f64) -> Vec<Synapse> {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut s = Synapse::new(
            &SynapseParams {
                id: 0,
                rule: RuleType::Adaptive,
                energy_factor: 1.0,
                depth: 0,
                bound: 2.0,
                target: weight,
                noise: 0.0,
                size_mass: 10.0,
                change_mass: 20.0,
            },
            0,
            1,
            true,
            &mut rng,
        );
        s.push_state(1, other);
        vec![s]
    }

    #[test]
    fn test_levels_span_unit_interval() {
        let mut n = node(0, NodeKind::Network, 1.0);
        n.states = 5;
        let levels: Vec<f64> = (0..5).map(|k| n.level(k)).collect();
        assert_eq!(levels, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_zero_temperature_picks_ground_state() {
        let mut n = node(0, NodeKind::Network, 0.0);
        n.add_synapse(0, 0.0);
        let synapses = link(1.0, -1.0);
        let next = n.compute(&ctx(LogicMode::Free, 1), &synapses);
        assert_eq!(next.value, -1.0);
        assert_eq!(next.energy, -1.0);
        assert!(!next.fluctuation);
        assert_eq!(next.state_change, -2.0);
        assert_eq!(next.dissipation, 2.0);
    }

    #[test]
    fn test_free_energy_and_entropy_of_two_levels() {
        let mut n = node(0, NodeKind::Network, 1.0);
        n.add_synapse(0, 0.0);
        let synapses = link(0.0, 1.0);
        let next = n.compute(&ctx(LogicMode::Free, 1), &synapses);
        // Zero field: both levels equally likely.
        assert!((next.entropy - std::f64::consts::LN_2).abs() < 1e-12);
        assert!((next.free_energy + std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_follows_square_wave() {
        let n = node(0, NodeKind::Logic { period: 3 }, 1.0);
        let values: Vec<f64> = (0..7)
            .map(|t| n.compute(&ctx(LogicMode::Clamp, t), &[]).value)
            .collect();
        assert_eq!(values, vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_bias_holds_polarity() {
        let mut n = node(0, NodeKind::Bias, 1.0);
        n.polarity = -1;
        for t in 0..5 {
            assert_eq!(n.compute(&ctx(LogicMode::Noise, t), &[]).value, -1.0);
        }
    }

    #[test]
    fn test_per_node_rng_is_reproducible() {
        let c = ctx(LogicMode::Noise, 4);
        let a: f64 = c.rng_for(3).gen();
        let b: f64 = c.rng_for(3).gen();
        let other: f64 = c.rng_for(4).gen();
        assert_eq!(a, b);
        assert_ne!(a, other);
    }

    #[test]
    fn test_evaluate_marks_agreement_with_field() {
        let mut n = node(0, NodeKind::Logic { period: 0 }, 1.0);
        n.add_synapse(0, 0.0);
        n.evaluate(&link(1.0, 1.0));
        assert!(n.state.solved);
        n.evaluate(&link(1.0, -1.0));
        assert!(!n.state.solved);
    }

    #[test]
    fn test_history_only_when_enabled() {
        let mut n = node(0, NodeKind::Network, 1.0);
        let next = n.compute(&ctx(LogicMode::Free, 1), &[]);
        n.commit(next, 1, false);
        assert!(n.history.is_empty());
        n.commit(next, 2, true);
        assert_eq!(n.history.len(), 1);
        assert_eq!(n.history[0].time, 2);
    }
}
