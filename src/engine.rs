use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::classify::{self, AuthStatus};
use crate::config::LoadTestConfig;
use crate::identity::IdentityGenerator;
use crate::probe::Probe;
use crate::report::{LatencyStats, LoadTestReport, RequestRecord, RunSummary};

pub async fn run(config: LoadTestConfig, probe: Arc<dyn Probe>) -> Result<LoadTestReport> {
    let started = Instant::now();
    let generator = IdentityGenerator::new(
        config.user_start,
        config.user_end,
        config.user_template.clone(),
    );

    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let mut tasks = JoinSet::new();
    for id in 0..config.requests {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("acquire concurrency permit")?;

        let username = generator.username(id);
        let probe = Arc::clone(&probe);
        let timeout = config.timeout();

        tasks.spawn(async move {
            let _permit = permit;
            run_single_request(id, username, probe, timeout).await
        });
    }

    let mut records = Vec::with_capacity(config.requests);
    while let Some(joined) = tasks.join_next().await {
        let record = joined.context("request task join failed")?;
        records.push(record);
    }
    // completion order is arbitrary under concurrency
    records.sort_by_key(|record| record.id);

    let wall_time = started.elapsed();
    let summary = compute_summary(&records, wall_time, &config);
    let latency = compute_latency(&records);
    let passed = error_rate(&summary) <= config.max_error_rate;

    Ok(LoadTestReport {
        summary,
        passed,
        latency,
        records,
    })
}

/// A probe fault is absorbed here as an ERROR record; it never aborts the
/// run or a sibling attempt.
async fn run_single_request(
    id: usize,
    username: String,
    probe: Arc<dyn Probe>,
    timeout: Duration,
) -> RequestRecord {
    let attempt_start = Instant::now();
    let outcome = probe.authenticate(&username, timeout).await;
    let elapsed_ms = attempt_start.elapsed().as_millis();

    let (status, output) = classify::classify(outcome);
    debug!(id, %username, status = status.as_str(), elapsed_ms, "request complete");

    RequestRecord {
        id,
        username,
        status,
        elapsed_ms,
        output,
    }
}

fn compute_summary(
    records: &[RequestRecord],
    wall_time: Duration,
    config: &LoadTestConfig,
) -> RunSummary {
    let total_time_secs = wall_time.as_secs_f64();
    let throughput_per_sec = if total_time_secs > 0.0 {
        config.requests as f64 / total_time_secs
    } else {
        0.0
    };

    RunSummary {
        timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        server: config.target(),
        requests_total: config.requests,
        concurrency: config.concurrency,
        success: count(records, AuthStatus::Success),
        reject: count(records, AuthStatus::Reject),
        error: count(records, AuthStatus::Error),
        total_time_secs,
        throughput_per_sec,
    }
}

fn count(records: &[RequestRecord], status: AuthStatus) -> usize {
    records
        .iter()
        .filter(|record| record.status == status)
        .count()
}

fn error_rate(summary: &RunSummary) -> f64 {
    if summary.requests_total == 0 {
        0.0
    } else {
        summary.error as f64 / summary.requests_total as f64
    }
}

fn compute_latency(records: &[RequestRecord]) -> Option<LatencyStats> {
    let mut latencies = records
        .iter()
        .filter(|record| record.status == AuthStatus::Success)
        .map(|record| record.elapsed_ms)
        .collect::<Vec<_>>();
    if latencies.is_empty() {
        return None;
    }
    latencies.sort_unstable();

    let avg_ms = latencies.iter().sum::<u128>() as f64 / latencies.len() as f64;
    let p95_ms = percentile(&latencies, 0.95)?;
    let max_ms = *latencies.last()?;

    Some(LatencyStats {
        avg_ms,
        p95_ms,
        max_ms,
    })
}

/// Nearest-rank percentile over an ascending-sorted sample: the 0-indexed
/// rank is `ceil(p * n) - 1`, clamped to the sample bounds so small samples
/// never index out of range.
fn percentile(sorted: &[u128], p: f64) -> Option<u128> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (sorted.len() as f64 * p).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted.get(index).copied()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::classify::AuthStatus;
    use crate::config::LoadTestConfig;
    use crate::identity::IdentityTemplate;
    use crate::report::RequestRecord;

    use super::{compute_latency, compute_summary, percentile};

    fn test_config(requests: usize) -> LoadTestConfig {
        LoadTestConfig {
            server: "192.0.2.10".to_string(),
            port: 1812,
            secret: "testing123".to_string(),
            password: "password".to_string(),
            nas_ip: "10.0.0.1".parse().expect("nas ip"),
            requests,
            concurrency: 4,
            timeout_ms: 100,
            user_start: 1,
            user_end: 100,
            user_template: IdentityTemplate::parse("TST#####").expect("template"),
            output_dir: PathBuf::from("results"),
            max_error_rate: 1.0,
            radclient: PathBuf::from("radclient"),
            json: false,
        }
    }

    fn record(id: usize, status: AuthStatus, elapsed_ms: u128) -> RequestRecord {
        RequestRecord {
            id,
            username: format!("TST{id:05}"),
            status,
            elapsed_ms,
            output: String::new(),
        }
    }

    #[test]
    fn nearest_rank_p95() {
        let sorted = vec![100, 200, 300, 400, 500];
        assert_eq!(percentile(&sorted, 0.95), Some(500));
        assert_eq!(percentile(&sorted, 0.50), Some(300));
    }

    #[test]
    fn percentile_clamps_small_samples() {
        assert_eq!(percentile(&[70], 0.95), Some(70));
        assert_eq!(percentile(&[10, 20], 0.95), Some(20));
        assert_eq!(percentile(&[], 0.95), None);
    }

    #[test]
    fn counts_partition_the_records() {
        let records = vec![
            record(0, AuthStatus::Success, 10),
            record(1, AuthStatus::Reject, 11),
            record(2, AuthStatus::Error, 12),
            record(3, AuthStatus::Success, 13),
        ];

        let summary = compute_summary(&records, Duration::from_millis(100), &test_config(4));
        assert_eq!(summary.success + summary.reject + summary.error, 4);
        assert_eq!(summary.success, 2);
        assert_eq!(summary.reject, 1);
        assert_eq!(summary.error, 1);
        assert!(summary.throughput_per_sec > 0.0);
    }

    #[test]
    fn zero_wall_time_yields_zero_throughput() {
        let summary = compute_summary(&[], Duration::ZERO, &test_config(0));
        assert_eq!(summary.throughput_per_sec, 0.0);
    }

    #[test]
    fn latency_only_covers_success_records() {
        let records = vec![
            record(0, AuthStatus::Success, 10),
            record(1, AuthStatus::Error, 5000),
            record(2, AuthStatus::Success, 30),
        ];

        let latency = compute_latency(&records).expect("latency should exist");
        assert_eq!(latency.avg_ms, 20.0);
        assert_eq!(latency.p95_ms, 30);
        assert_eq!(latency.max_ms, 30);
    }

    #[test]
    fn latency_absent_without_successes() {
        let records = vec![
            record(0, AuthStatus::Reject, 10),
            record(1, AuthStatus::Error, 20),
        ];
        assert!(compute_latency(&records).is_none());
    }
}
