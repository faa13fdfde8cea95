use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use radius_loadtest::{Cli, LoadTestConfig, output, run_load_test};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = match LoadTestConfig::try_from(cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err:#}");
            std::process::exit(2);
        }
    };

    let output_json = config.json;
    let output_dir = config.output_dir.clone();
    info!(
        server = %config.target(),
        requests = config.requests,
        concurrency = config.concurrency,
        "starting RADIUS load test"
    );

    match run_load_test(config).await {
        Ok(report) => {
            match output::write_artifacts(&output_dir, &report) {
                Ok((csv_path, json_path)) => {
                    info!(csv = %csv_path.display(), json = %json_path.display(), "results written");
                }
                Err(err) => {
                    eprintln!("failed to write results: {err:#}");
                    std::process::exit(2);
                }
            }

            if output_json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(err) => {
                        eprintln!("failed to serialize report: {err:#}");
                        std::process::exit(2);
                    }
                }
            } else {
                println!("{}", report.human_summary());
            }

            if report.passed {
                std::process::exit(0);
            }

            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("run failed: {err:#}");
            std::process::exit(1);
        }
    }
}
