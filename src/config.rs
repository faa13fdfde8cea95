use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::identity::IdentityTemplate;

pub const DEFAULT_PORT: u16 = 1812;
pub const DEFAULT_REQUESTS: usize = 1000;
pub const DEFAULT_CONCURRENCY: usize = 50;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_USER_START: u64 = 1;
pub const DEFAULT_USER_END: u64 = 10_000;
pub const DEFAULT_USER_TEMPLATE: &str = "TST#######";
pub const DEFAULT_MAX_ERROR_RATE: f64 = 1.0;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "radius-loadtest",
    about = "Async RADIUS authentication load client"
)]
pub struct Cli {
    /// Target server hostname or address
    #[arg(long)]
    pub server: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Shared secret for the target server
    #[arg(long, env = "RADIUS_SECRET")]
    pub secret: String,
    /// Password sent with every request
    #[arg(long, env = "RADIUS_PASSWORD")]
    pub password: String,
    #[arg(long)]
    pub nas_ip: Ipv4Addr,

    #[arg(long, default_value_t = DEFAULT_REQUESTS)]
    pub requests: usize,
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_USER_START)]
    pub user_start: u64,
    #[arg(long, default_value_t = DEFAULT_USER_END)]
    pub user_end: u64,
    /// Username template; the `#` run is the zero-padded user number
    #[arg(long, default_value = DEFAULT_USER_TEMPLATE)]
    pub user_template: String,

    #[arg(long, default_value = "results")]
    pub output_dir: PathBuf,
    #[arg(long, default_value_t = DEFAULT_MAX_ERROR_RATE)]
    pub max_error_rate: f64,
    /// Path to the radclient binary
    #[arg(long, default_value = "radclient")]
    pub radclient: PathBuf,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    pub server: String,
    pub port: u16,
    pub secret: String,
    pub password: String,
    pub nas_ip: Ipv4Addr,
    pub requests: usize,
    pub concurrency: usize,
    pub timeout_ms: u64,
    pub user_start: u64,
    pub user_end: u64,
    pub user_template: IdentityTemplate,
    pub output_dir: PathBuf,
    pub max_error_rate: f64,
    pub radclient: PathBuf,
    pub json: bool,
}

impl LoadTestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

impl TryFrom<Cli> for LoadTestConfig {
    type Error = anyhow::Error;

    fn try_from(args: Cli) -> Result<Self> {
        if args.server.is_empty() {
            bail!("--server must not be empty");
        }
        if args.concurrency == 0 {
            bail!("--concurrency must be greater than 0");
        }
        if args.timeout_ms == 0 {
            bail!("--timeout-ms must be greater than 0");
        }
        if args.user_start > args.user_end {
            bail!("--user-start must not exceed --user-end");
        }
        if !(0.0..=1.0).contains(&args.max_error_rate) {
            bail!("--max-error-rate must be between 0.0 and 1.0");
        }

        let user_template = IdentityTemplate::parse(&args.user_template)?;

        std::fs::create_dir_all(&args.output_dir).with_context(|| {
            format!(
                "failed to create output directory `{}`",
                args.output_dir.display()
            )
        })?;

        Ok(Self {
            server: args.server,
            port: args.port,
            secret: args.secret,
            password: args.password,
            nas_ip: args.nas_ip,
            requests: args.requests,
            concurrency: args.concurrency,
            timeout_ms: args.timeout_ms,
            user_start: args.user_start,
            user_end: args.user_end,
            user_template,
            output_dir: args.output_dir,
            max_error_rate: args.max_error_rate,
            radclient: args.radclient,
            json: args.json,
        })
    }
}
