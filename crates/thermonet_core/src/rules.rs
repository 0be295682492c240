//! Dense class-pair lookup of synapse rules.

use crate::config::{AppConfig, SynapseRule};
use thermonet_data::RuleType;

/// Symmetric `classes x classes` table of synapse rules.
///
/// Pairs without an entry resolve to `None`, which construction treats like a
/// `fail` rule that forbids adjacency.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    classes: usize,
    entries: Vec<Option<SynapseRule>>,
}

impl RuleTable {
    pub fn from_config(config: &AppConfig) -> Self {
        let classes = config.classes.len();
        let mut entries = vec![None; classes * classes];
        for rule in &config.rules {
            let (Some(a), Some(b)) = (
                config.class_rank(&rule.classes[0]),
                config.class_rank(&rule.classes[1]),
            ) else {
                continue;
            };
            entries[a * classes + b] = Some(rule.clone());
            entries[b * classes + a] = Some(rule.clone());
        }
        Self { classes, entries }
    }

    #[inline]
    pub fn get(&self, a: usize, b: usize) -> Option<&SynapseRule> {
        self.entries.get(a * self.classes + b)?.as_ref()
    }

    /// Rule type for a class pair, `Fail` when the pairing is unspecified.
    #[inline]
    pub fn rule_type(&self, a: usize, b: usize) -> RuleType {
        self.get(a, b).map_or(RuleType::Fail, |r| r.rule)
    }

    /// Whether nodes of the two classes may be adjacent.
    #[inline]
    pub fn connect(&self, a: usize, b: usize) -> bool {
        self.get(a, b).is_some_and(|r| r.connect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_symmetric() {
        let config = AppConfig::default();
        let table = config.rule_table();
        for a in 0..config.classes.len() {
            for b in 0..config.classes.len() {
                assert_eq!(table.rule_type(a, b), table.rule_type(b, a));
                assert_eq!(table.connect(a, b), table.connect(b, a));
            }
        }
        assert_eq!(table.rule_type(0, 2), RuleType::Fixed);
        assert!(!table.connect(0, 1));
    }

    #[test]
    fn test_missing_pair_fails_closed() {
        let mut config = AppConfig::default();
        config.rules.retain(|r| r.classes != ["logic", "network"]);
        let table = config.rule_table();
        assert_eq!(table.rule_type(1, 2), RuleType::Fail);
        assert!(!table.connect(2, 1));
    }
}
