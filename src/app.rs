use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thermonet_core::config::AppConfig;
use thermonet_core::network::Network;
use thermonet_core::scheduler::{RunSummary, SimulationScheduler};
use thermonet_data::ConstructionReport;
use thermonet_io::RunDirectory;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub path: PathBuf,
    pub seed: u64,
    pub report: ConstructionReport,
    pub summary: RunSummary,
}

pub struct App {
    pub config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Reads and validates a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = AppConfig::from_toml(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(Self { config })
    }

    /// Overrides the configured seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.config.simulation.seed = seed;
        }
        self
    }

    /// Builds the network without running it.
    pub fn check(&self) -> Result<ConstructionReport> {
        let network = Network::build(&self.config)?;
        Ok(network.report)
    }

    /// Builds and runs the network, writing every record under `<output>/<name>/`.
    ///
    /// A construction failure removes the run directory before the error is returned.
    pub fn run(&self, output: &Path, name: Option<&str>) -> Result<RunOutcome> {
        let seed = self
            .config
            .simulation
            .seed
            .unwrap_or_else(rand::random::<u64>);
        let name = name.map_or_else(RunDirectory::default_name, str::to_string);
        let run_dir = RunDirectory::create(output, &name)?;
        let header = run_dir.write_header(&self.config, seed)?;
        tracing::info!(
            run = %header.name,
            seed,
            fingerprint = %header.fingerprint,
            "Run started"
        );

        let mut network = match Network::build_with_seed(&self.config, seed) {
            Ok(network) => network,
            Err(e) => {
                tracing::error!(error = %e, fatal = e.is_fatal(), "Network construction failed");
                run_dir.teardown()?;
                return Err(e.into());
            }
        };
        run_dir.write_topology(&network)?;

        let mut records = run_dir.records(self.config.simulation.record_node_states)?;
        let scheduler = SimulationScheduler::from_network(&network);
        let summary = scheduler
            .run(&mut network, &mut records)
            .context("Simulation failed")?;
        records.finish()?;
        run_dir.write_distributions(&summary.distributions)?;

        tracing::info!(
            run = %name,
            steps = summary.steps,
            epochs = scheduler.metrics().epoch_count(),
            solved_epochs = scheduler.metrics().counter("solved_epochs"),
            "Run finished"
        );

        Ok(RunOutcome {
            path: run_dir.path().to_path_buf(),
            seed,
            report: network.report,
            summary,
        })
    }
}
