use std::sync::Arc;

pub mod classify;
pub mod config;
pub mod engine;
pub mod identity;
pub mod output;
pub mod probe;
pub mod report;

pub use classify::AuthStatus;
pub use config::{Cli, LoadTestConfig};
pub use probe::{Probe, ProbeError, RadclientProbe};
pub use report::LoadTestReport;

pub async fn run_load_test(config: LoadTestConfig) -> anyhow::Result<LoadTestReport> {
    let probe = Arc::new(RadclientProbe::new(&config));
    engine::run(config, probe).await
}
