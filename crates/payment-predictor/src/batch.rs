//! Scoring many customers while isolating per-customer failures.
//!
//! Every account id gets its own `CustomerProjector`. Successes land in the
//! results table, failures in the errors table, and one failing customer
//! never stops the run. Progress is pushed to an injected
//! `ProgressReporter` so the core has no presentation state.
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::BatchConfig;
use crate::customer::{CustomerProjector, ScoringContext};
use crate::error::{PredictorError, PredictorResult};

/// Successful projection of one customer, as written to the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerResult {
    pub acctrefno: i64,
    pub accuracy: f64,
    pub certainty: f64,
    pub payment_prediction: Vec<u8>,
    pub next_payment_probability: Vec<f64>,
    pub payment_codes: Vec<i64>,
}

impl From<&CustomerProjector> for CustomerResult {
    fn from(p: &CustomerProjector) -> Self {
        Self {
            acctrefno: p.acctrefno,
            accuracy: p.accuracy,
            certainty: p.certainty,
            payment_prediction: p.payment_prediction.clone(),
            next_payment_probability: p.next_payment_probability.clone(),
            payment_codes: p.payment_codes.clone(),
        }
    }
}

/// Failed projection of one customer, as written to the errors table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerError {
    pub acctrefno: i64,
    pub kind: String,
    pub message: String,
}

impl CustomerError {
    fn new(acctrefno: i64, err: &PredictorError) -> Self {
        Self {
            acctrefno,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Terminal state of a run; partial success is valid.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: Vec<CustomerResult>,
    pub errors: Vec<CustomerError>,
}

impl BatchOutcome {
    pub fn processed(&self) -> usize {
        self.results.len() + self.errors.len()
    }
}

/// Snapshot handed to a `ProgressReporter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub errors: usize,
    pub elapsed: Duration,
    pub since_last_report: Duration,
    pub estimated_remaining: Option<Duration>,
}

impl BatchProgress {
    fn estimate(completed: usize, total: usize, elapsed: Duration) -> Option<Duration> {
        if completed == 0 {
            return None;
        }
        let per_customer = elapsed.as_secs_f64() / completed as f64;
        Some(Duration::from_secs_f64(
            per_customer * total.saturating_sub(completed) as f64,
        ))
    }
}

/// Observer for batch progress. Implementations must tolerate calls from
/// worker threads when the runner fans out.
pub trait ProgressReporter: Sync {
    /// Called after every customer, successful or not.
    fn on_customer(&self, _acctrefno: i64, _ok: bool) {}

    /// Called every `report_interval` customers and for the first one.
    fn on_progress(&self, progress: &BatchProgress);

    fn on_finish(&self, _outcome: &BatchOutcome, _elapsed: Duration) {}
}

/// Reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn on_progress(&self, p: &BatchProgress) {
        log::info!(
            "completed {}/{} | total runtime = {}s | batch run time = {}s | errors encountered = {} | expected time needed = {}",
            p.completed,
            p.total,
            p.elapsed.as_secs(),
            p.since_last_report.as_secs(),
            p.errors,
            p.estimated_remaining
                .map(|d| format!("{}s", d.as_secs()))
                .unwrap_or_else(|| "unknown".to_string())
        );
    }

    fn on_finish(&self, outcome: &BatchOutcome, elapsed: Duration) {
        log::info!(
            "Scored {} customers in {:.2}s ({} errors)",
            outcome.results.len(),
            elapsed.as_secs_f64(),
            outcome.errors.len()
        );
    }
}

/// Reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_progress(&self, _progress: &BatchProgress) {}
}

/// Project one customer, turning panics inside collaborators into an
/// `Unexpected` error so the batch boundary never unwinds.
pub fn project_customer(acctrefno: i64, ctx: &ScoringContext<'_>) -> PredictorResult<CustomerResult> {
    match panic::catch_unwind(AssertUnwindSafe(|| CustomerProjector::new(acctrefno, ctx))) {
        Ok(result) => result.map(|p| CustomerResult::from(&p)),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic while projecting customer".to_string());
            Err(PredictorError::Unexpected(msg))
        }
    }
}

struct Tally {
    completed: usize,
    failed: usize,
    last_report: Instant,
}

pub struct BatchRunner<'a> {
    ctx: ScoringContext<'a>,
    config: BatchConfig,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> BatchRunner<'a> {
    pub fn new(ctx: ScoringContext<'a>, config: BatchConfig) -> Self {
        Self {
            ctx,
            config,
            reporter: &LogProgress,
        }
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    fn should_report(&self, completed: usize, total: usize) -> bool {
        completed == 1
            || completed == total
            || (self.config.report_interval > 0 && completed % self.config.report_interval == 0)
    }

    /// Score `ids` sequentially or in parallel according to the config.
    pub fn execute(&self, ids: &[i64]) -> BatchOutcome {
        if self.config.parallel {
            self.run_parallel(ids)
        } else {
            self.run(ids)
        }
    }

    /// Score every distinct account of the transaction table.
    pub fn execute_all(&self) -> BatchOutcome {
        let ids = self.ctx.transactions.unique_accounts();
        self.execute(&ids)
    }

    /// Score `ids` one after another, in order.
    pub fn run(&self, ids: &[i64]) -> BatchOutcome {
        let start = Instant::now();
        let mut last_report = start;
        let mut outcome = BatchOutcome::default();

        for (i, &acctrefno) in ids.iter().enumerate() {
            match project_customer(acctrefno, &self.ctx) {
                Ok(result) => {
                    self.reporter.on_customer(acctrefno, true);
                    outcome.results.push(result);
                }
                Err(err) => {
                    log::debug!("acctrefno {} failed: {}", acctrefno, err);
                    self.reporter.on_customer(acctrefno, false);
                    outcome.errors.push(CustomerError::new(acctrefno, &err));
                }
            }

            let completed = i + 1;
            if self.should_report(completed, ids.len()) {
                let now = Instant::now();
                let elapsed = now - start;
                self.reporter.on_progress(&BatchProgress {
                    completed,
                    total: ids.len(),
                    errors: outcome.errors.len(),
                    elapsed,
                    since_last_report: now - last_report,
                    estimated_remaining: BatchProgress::estimate(completed, ids.len(), elapsed),
                });
                last_report = now;
            }
        }

        self.reporter.on_finish(&outcome, start.elapsed());
        outcome
    }

    /// Score `ids` on the rayon pool; each worker builds its own projector.
    /// Results and errors are returned in input order.
    pub fn run_parallel(&self, ids: &[i64]) -> BatchOutcome {
        let start = Instant::now();
        let tally = Mutex::new(Tally {
            completed: 0,
            failed: 0,
            last_report: start,
        });

        let scored: Vec<(i64, PredictorResult<CustomerResult>)> = ids
            .par_iter()
            .map(|&acctrefno| {
                let result = project_customer(acctrefno, &self.ctx);
                self.reporter.on_customer(acctrefno, result.is_ok());

                // counting and reporting share one lock so snapshots stay monotonic
                let mut t = tally.lock().unwrap_or_else(|e| e.into_inner());
                t.completed += 1;
                if result.is_err() {
                    t.failed += 1;
                }
                if self.should_report(t.completed, ids.len()) {
                    let now = Instant::now();
                    let elapsed = now - start;
                    self.reporter.on_progress(&BatchProgress {
                        completed: t.completed,
                        total: ids.len(),
                        errors: t.failed,
                        elapsed,
                        since_last_report: now - t.last_report,
                        estimated_remaining: BatchProgress::estimate(t.completed, ids.len(), elapsed),
                    });
                    t.last_report = now;
                }
                drop(t);
                (acctrefno, result)
            })
            .collect();

        let mut outcome = BatchOutcome::default();
        for (acctrefno, result) in scored {
            match result {
                Ok(r) => outcome.results.push(r),
                Err(err) => outcome.errors.push(CustomerError::new(acctrefno, &err)),
            }
        }

        self.reporter.on_finish(&outcome, start.elapsed());
        outcome
    }
}
