use serde::{Deserialize, Serialize};

use crate::classify::AuthStatus;

/// One row per authentication attempt, immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: usize,
    pub username: String,
    pub status: AuthStatus,
    pub elapsed_ms: u128,
    pub output: String,
}

/// Run-level aggregate, built exactly once after every record is in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub server: String,
    pub requests_total: usize,
    pub concurrency: usize,
    pub success: usize,
    pub reject: usize,
    pub error: usize,
    pub total_time_secs: f64,
    pub throughput_per_sec: f64,
}

/// Latency statistics over SUCCESS records only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatencyStats {
    pub avg_ms: f64,
    pub p95_ms: u128,
    pub max_ms: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestReport {
    pub summary: RunSummary,
    pub passed: bool,
    pub latency: Option<LatencyStats>,
    pub records: Vec<RequestRecord>,
}

impl LoadTestReport {
    pub fn human_summary(&self) -> String {
        let mut output = String::new();
        output.push_str("RADIUS load test report\n");
        output.push_str(&format!(
            "status: {}\n",
            if self.passed { "PASS" } else { "FAIL" }
        ));
        output.push_str(&format!("server: {}\n", self.summary.server));
        output.push_str(&format!(
            "requests: total={}, concurrency={}\n",
            self.summary.requests_total, self.summary.concurrency
        ));
        output.push_str(&format!(
            "results: success={}, reject={}, error={}\n",
            self.summary.success, self.summary.reject, self.summary.error
        ));
        output.push_str(&format!(
            "timing: total={:.2}s throughput={:.2}/s\n",
            self.summary.total_time_secs, self.summary.throughput_per_sec
        ));
        match &self.latency {
            Some(latency) => output.push_str(&format!(
                "latency: avg={:.1}ms p95={}ms max={}ms\n",
                latency.avg_ms, latency.p95_ms, latency.max_ms
            )),
            None => output.push_str("no successful requests to calculate response times\n"),
        }
        output
    }
}
