//! Load, stability, and long-poll measurement.
//!
//! [`LoadTestRunner`] fans a closure out over simulated users as tokio
//! tasks, with a semaphore bounding how many run at once, and collects
//! per-request latencies into a [`LoadReport`]. [`StabilityRunner`] drives
//! the same kind of closure serially over wall-clock time. Both report raw
//! numbers; pass/fail thresholds stay in the tests that own them.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Semaphore};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::logging::{log_info, log_warn};

/// Aggregated outcome of one load run.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    /// Mean latency over successful requests.
    pub average: Duration,
    /// 95th percentile latency over successful requests.
    pub p95: Duration,
    /// Error strings from failed requests, in completion order.
    pub errors: Vec<String>,
}

impl LoadReport {
    /// Fraction of requests that succeeded, in [0.0, 1.0].
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.success as f64 / self.total as f64
    }
}

#[derive(Debug, Default)]
struct LoadStats {
    latencies: Vec<Duration>,
    errors: Vec<String>,
}

/// Concurrent load driver: `users x requests_per_user` invocations of an
/// async closure, at most `concurrency` in flight.
#[derive(Debug, Clone)]
pub struct LoadTestRunner {
    pub users: usize,
    pub requests_per_user: usize,
    pub concurrency: usize,
}

impl LoadTestRunner {
    pub fn new(users: usize, requests_per_user: usize, concurrency: usize) -> Self {
        Self {
            users,
            requests_per_user,
            concurrency: concurrency.max(1),
        }
    }

    /// Run the closure once per (user, request) pair and aggregate.
    ///
    /// The closure receives the user index and request index, mirroring how
    /// a test binds each simulated user to its own credentials or payload.
    /// A task that panics is counted as a failure, not a crash of the run.
    pub async fn run<F, Fut>(&self, op: F) -> LoadReport
    where
        F: Fn(usize, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<()>> + Send + 'static,
    {
        let op = Arc::new(op);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let stats = Arc::new(Mutex::new(LoadStats::default()));
        let total = self.users * self.requests_per_user;

        log_info!(
            users = self.users,
            requests_per_user = self.requests_per_user,
            concurrency = self.concurrency,
            total = total,
            "Load run starting"
        );

        let started = Instant::now();
        let mut handles = Vec::with_capacity(total);

        for user in 0..self.users {
            for request in 0..self.requests_per_user {
                let op = Arc::clone(&op);
                let semaphore = Arc::clone(&semaphore);
                let stats = Arc::clone(&stats);

                handles.push(tokio::spawn(async move {
                    // Closed only when the runner is dropped mid-run, which
                    // cannot happen while we hold these handles.
                    let Ok(_permit) = semaphore.acquire().await else {
                        return;
                    };

                    let begun = Instant::now();
                    let outcome = op(user, request).await;
                    let elapsed = begun.elapsed();

                    let mut stats = stats.lock().await;
                    match outcome {
                        Ok(()) => stats.latencies.push(elapsed),
                        Err(e) => stats.errors.push(e.to_string()),
                    }
                }));
            }
        }

        let mut panicked = 0usize;
        for handle in handles {
            if handle.await.is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            log_warn!(panicked = panicked, "Load tasks panicked");
        }

        let stats = stats.lock().await;
        let success = stats.latencies.len();
        let mut errors = stats.errors.clone();
        for _ in 0..panicked {
            errors.push("task panicked".to_string());
        }
        let failure = total - success;

        let mut sorted = stats.latencies.clone();
        sorted.sort_unstable();
        let average = if success > 0 {
            sorted.iter().sum::<Duration>() / success as u32
        } else {
            Duration::ZERO
        };
        let p95 = percentile_95(&sorted);

        let report = LoadReport {
            total,
            success,
            failure,
            average,
            p95,
            errors,
        };

        log_info!(
            total = report.total,
            success = report.success,
            failure = report.failure,
            success_rate = report.success_rate(),
            average_ms = report.average.as_millis(),
            p95_ms = report.p95.as_millis(),
            wall_seconds = started.elapsed().as_secs_f64(),
            "Load run finished"
        );

        report
    }
}

/// P95 over an ascending-sorted slice: the element at index
/// `floor(0.95 * len)`, clamped into range. Empty input yields zero.
pub fn percentile_95(sorted: &[Duration]) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let index = ((sorted.len() as f64) * 0.95).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Terminal state of a document parse.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Completed { elapsed: Duration },
    Failed { error: String },
}

/// Poll `GET /api/documents/{id}` until its `parse_status` reaches a
/// terminal state or the budget runs out.
///
/// The budget overrunning maps to [`ApiError::Timeout`]; a poll whose HTTP
/// request itself fails propagates that error immediately.
pub async fn poll_parse_status(
    client: &ApiClient,
    document_id: &str,
    interval: Duration,
    budget: Duration,
) -> ApiResult<ParseOutcome> {
    let endpoint = format!("/api/documents/{}", document_id);
    let started = Instant::now();

    loop {
        let response = client.get(&endpoint).await?;
        let body = response.json()?;
        let status = body
            .get("parse_status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        match status {
            "completed" => {
                let elapsed = started.elapsed();
                log_info!(
                    document_id = document_id,
                    elapsed_seconds = elapsed.as_secs_f64(),
                    "Document parse completed"
                );
                return Ok(ParseOutcome::Completed { elapsed });
            }
            "failed" => {
                let error = body
                    .get("parse_error")
                    .and_then(|e| e.as_str())
                    .unwrap_or("unreported")
                    .to_string();
                log_warn!(document_id = document_id, error = %error, "Document parse failed");
                return Ok(ParseOutcome::Failed { error });
            }
            other => {
                if started.elapsed() + interval > budget {
                    return Err(ApiError::timeout(budget.as_secs()));
                }
                log_info!(
                    document_id = document_id,
                    parse_status = other,
                    elapsed_seconds = started.elapsed().as_secs_f64(),
                    "Document parse in progress"
                );
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Aggregated outcome of one stability run.
#[derive(Debug, Clone)]
pub struct StabilityReport {
    pub requests: usize,
    pub errors: usize,
}

impl StabilityReport {
    /// Fraction of requests that failed, in [0.0, 1.0].
    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.errors as f64 / self.requests as f64
    }
}

/// Serial endurance driver: one request per `interval` until `duration`
/// elapses or the stop flag is raised.
#[derive(Debug, Clone)]
pub struct StabilityRunner {
    pub duration: Duration,
    pub interval: Duration,
}

impl StabilityRunner {
    pub fn new(duration: Duration, interval: Duration) -> Self {
        Self { duration, interval }
    }

    /// Run the closure repeatedly, logging progress every 100 requests.
    /// The stop flag lets a test end the run early (or a signal handler
    /// abort it) without losing the report.
    pub async fn run<F, Fut>(&self, op: F, stop: Arc<AtomicBool>) -> StabilityReport
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        let started = Instant::now();
        let mut requests = 0usize;
        let mut errors = 0usize;

        log_info!(
            duration_seconds = self.duration.as_secs(),
            interval_ms = self.interval.as_millis(),
            "Stability run starting"
        );

        while started.elapsed() < self.duration && !stop.load(Ordering::Relaxed) {
            requests += 1;
            if let Err(e) = op(requests).await {
                errors += 1;
                log_warn!(request = requests, error = %e, "Stability request failed");
            }

            if requests % 100 == 0 {
                log_info!(
                    requests = requests,
                    errors = errors,
                    elapsed_seconds = started.elapsed().as_secs(),
                    "Stability run progress"
                );
            }

            tokio::time::sleep(self.interval).await;
        }

        let report = StabilityReport { requests, errors };
        log_info!(
            requests = report.requests,
            errors = report.errors,
            error_rate = report.error_rate(),
            "Stability run finished"
        );
        report
    }
}
