//! JSON-lines writers for streamed records.

use crate::error::{Result, ResultExt};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thermonet_core::network::Network;
use thermonet_core::scheduler::RecordSink;
use thermonet_data::{EpochRecord, StepRecord};

struct JsonLines {
    file: BufWriter<File>,
    name: &'static str,
    written: u64,
}

impl JsonLines {
    fn create(dir: &Path, name: &'static str) -> Result<Self> {
        let file = File::create(dir.join(name)).context(format!("creating {}", name))?;
        Ok(Self {
            file: BufWriter::new(file),
            name,
            written: 0,
        })
    }

    fn append<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.file, record).context(format!("encoding {}", self.name))?;
        writeln!(self.file).context(format!("writing {}", self.name))?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush().context(format!("flushing {}", self.name))
    }
}

/// Streams step, epoch and node-state records into a run's data directory.
pub struct RecordWriter {
    steps: JsonLines,
    epochs: JsonLines,
    node_states: Option<JsonLines>,
}

impl RecordWriter {
    pub fn create(dir: &Path, node_states: bool) -> Result<Self> {
        Ok(Self {
            steps: JsonLines::create(dir, "steps.jsonl")?,
            epochs: JsonLines::create(dir, "epochs.jsonl")?,
            node_states: if node_states {
                Some(JsonLines::create(dir, "node_states.jsonl")?)
            } else {
                None
            },
        })
    }

    pub fn steps_written(&self) -> u64 {
        self.steps.written
    }

    pub fn epochs_written(&self) -> u64 {
        self.epochs.written
    }

    /// Flushes every open file.
    pub fn finish(mut self) -> Result<()> {
        self.steps.flush()?;
        self.epochs.flush()?;
        if let Some(states) = self.node_states.as_mut() {
            states.flush()?;
        }
        tracing::debug!(
            steps = self.steps.written,
            epochs = self.epochs.written,
            "Record files closed"
        );
        Ok(())
    }
}

impl RecordSink for RecordWriter {
    fn on_step(&mut self, record: &StepRecord, network: &Network) -> anyhow::Result<()> {
        self.steps.append(record)?;
        if let Some(states) = self.node_states.as_mut() {
            for node in &network.nodes {
                states.append(&node.record(record.time))?;
            }
        }
        Ok(())
    }

    fn on_epoch(&mut self, record: &EpochRecord) -> anyhow::Result<()> {
        self.epochs.append(record)?;
        self.steps.flush()?;
        self.epochs.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use thermonet_core::config::AppConfig;
    use thermonet_core::scheduler::SimulationScheduler;
    use thermonet_data::NodeStateRecord;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "thermonet_writer_{}_{}",
            tag,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn small_config(node_states: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.simulation.time = 2;
        config.simulation.record_node_states = node_states;
        config
    }

    #[test]
    fn test_one_line_per_record() {
        let dir = scratch_dir("lines");
        let config = small_config(false);
        let mut network = Network::build_with_seed(&config, 4).unwrap();
        let mut writer = RecordWriter::create(&dir, false).unwrap();
        let summary = SimulationScheduler::from_network(&network)
            .run(&mut network, &mut writer)
            .unwrap();
        assert_eq!(writer.steps_written(), summary.steps);
        assert_eq!(writer.epochs_written() as usize, config.total_epochs());
        writer.finish().unwrap();

        let steps = fs::read_to_string(dir.join("steps.jsonl")).unwrap();
        let parsed: Vec<StepRecord> = steps
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len() as u64, summary.steps);
        assert_eq!(parsed[0].time, 1);
        assert!(!dir.join("node_states.jsonl").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_node_states_cover_every_node_each_step() {
        let dir = scratch_dir("states");
        let config = small_config(true);
        let mut network = Network::build_with_seed(&config, 5).unwrap();
        let mut writer = RecordWriter::create(&dir, true).unwrap();
        let summary = SimulationScheduler::from_network(&network)
            .run(&mut network, &mut writer)
            .unwrap();
        writer.finish().unwrap();

        let text = fs::read_to_string(dir.join("node_states.jsonl")).unwrap();
        let records: Vec<NodeStateRecord> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len() as u64, summary.steps * network.nodes.len() as u64);
        assert!(records.iter().all(|r| r.time >= 1 && r.time <= summary.steps));

        fs::remove_dir_all(&dir).ok();
    }
}
