//! Run directory lifecycle.
//!
//! Layout of a run named `name` under `output`:
//!
//! ```text
//! <output>/<name>/
//!     header.json
//!     config.toml
//!     data/
//!         topology.json
//!         steps.jsonl
//!         epochs.jsonl
//!         node_states.jsonl   (only with simulation.record_node_states)
//!         edges.json
//! ```

use crate::error::{Result, ResultExt, RunError};
use crate::writer::RecordWriter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thermonet_core::config::AppConfig;
use thermonet_core::network::Network;
use thermonet_data::{ConstructionReport, NodeRecord, WeightDistributions};

/// Identity of a run, written before construction starts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunHeader {
    pub name: String,
    pub created: DateTime<Utc>,
    pub seed: u64,
    /// SHA-256 of the configuration.
    pub fingerprint: String,
    pub version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TopologyFile {
    pub report: ConstructionReport,
    pub nodes: Vec<NodeRecord>,
    /// Node pairs of every realized edge, self loops included.
    pub edges: Vec<(usize, usize)>,
}

#[derive(Debug)]
pub struct RunDirectory {
    name: String,
    root: PathBuf,
    data: PathBuf,
}

impl RunDirectory {
    /// Timestamped default run name.
    #[must_use]
    pub fn default_name() -> String {
        format!("run_{}", Utc::now().format("%Y%m%d_%H%M%S"))
    }

    /// Creates `<output>/<name>/data/`. Fails if the run directory exists.
    pub fn create<P: AsRef<Path>>(output: P, name: &str) -> Result<Self> {
        let root = output.as_ref().join(name);
        if root.exists() {
            return Err(RunError::AlreadyExists(root));
        }
        let data = root.join("data");
        fs::create_dir_all(&data).context(format!("creating {}", data.display()))?;
        tracing::info!(path = %root.display(), "Run directory created");
        Ok(Self {
            name: name.to_string(),
            root,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data
    }

    /// Writes `header.json` and the `config.toml` snapshot.
    pub fn write_header(&self, config: &AppConfig, seed: u64) -> Result<RunHeader> {
        let header = RunHeader {
            name: self.name.clone(),
            created: Utc::now(),
            seed,
            fingerprint: config.fingerprint(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        write_json(&self.root.join("header.json"), &header)?;

        let snapshot = toml::to_string_pretty(config).context("serializing config snapshot")?;
        fs::write(self.root.join("config.toml"), snapshot).context("writing config.toml")?;
        Ok(header)
    }

    /// Writes `topology.json` for a built network.
    pub fn write_topology(&self, network: &Network) -> Result<()> {
        let file = TopologyFile {
            report: network.report.clone(),
            nodes: network.node_records(),
            edges: network
                .synapses
                .iter()
                .map(|s| (s.i, s.j))
                .collect(),
        };
        write_json(&self.data.join("topology.json"), &file)
    }

    /// Opens the streaming writers for step, epoch and optional node-state records.
    pub fn records(&self, node_states: bool) -> Result<RecordWriter> {
        RecordWriter::create(&self.data, node_states)
    }

    /// Writes the initial and final weight histograms to `edges.json`.
    pub fn write_distributions(&self, distributions: &WeightDistributions) -> Result<()> {
        write_json(&self.data.join("edges.json"), distributions)
    }

    /// Removes the whole run directory.
    pub fn teardown(self) -> Result<()> {
        fs::remove_dir_all(&self.root).context(format!("removing {}", self.root.display()))?;
        tracing::warn!(path = %self.root.display(), "Run directory removed");
        Ok(())
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context(format!("encoding {}", path.display()))?;
    fs::write(path, json).context(format!("writing {}", path.display()))
}
