//! The benchmark harness: repeated, sequential Flight and HTTP transfers.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use chrono::Local;
use hyper::Uri;
use tracing::{debug, info, warn};

use crate::{
    client::{Fetched, Transfer},
    common::{
        Method, DEFAULT_FLIGHT_HOST, DEFAULT_FLIGHT_PORT, DEFAULT_HTTP_URL, DEFAULT_RESULTS_DIR,
        DEFAULT_RUNS,
    },
    error::{BenchError, TransferError},
    report::Report,
};

/// Options of the benchmark harness.
#[derive(Debug, Clone)]
pub struct BenchOptions {
    runs: usize,
    pub flight_host: String,
    pub flight_port: u16,
    pub http_url: String,
    pub results_dir: PathBuf,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            flight_host: DEFAULT_FLIGHT_HOST.to_string(),
            flight_port: DEFAULT_FLIGHT_PORT,
            http_url: DEFAULT_HTTP_URL.to_string(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
        }
    }
}

impl BenchOptions {
    /// Fails with [`BenchError::Config`] when `runs` is zero or `http_url`
    /// is not a valid `http://` URL.
    pub fn new(
        runs: usize,
        flight_host: impl Into<String>,
        flight_port: u16,
        http_url: impl Into<String>,
        results_dir: impl Into<PathBuf>,
    ) -> Result<Self, BenchError> {
        if runs == 0 {
            return Err(BenchError::Config(
                "run count must be at least 1".to_string(),
            ));
        }
        let http_url = http_url.into();
        let uri = http_url.parse::<Uri>().map_err(|err| {
            BenchError::Config(format!("invalid HTTP URL '{}': {}", http_url, err))
        })?;
        if uri.scheme_str() != Some("http") || uri.host().is_none() {
            return Err(BenchError::Config(format!(
                "HTTP URL '{}' must be an absolute http:// URL",
                http_url
            )));
        }
        Ok(Self {
            runs,
            flight_host: flight_host.into(),
            flight_port,
            http_url,
            results_dir: results_dir.into(),
        })
    }

    pub fn runs(&self) -> usize {
        self.runs
    }
}

/// One elapsed-time measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub method: Method,
    /// Zero-based run index.
    pub run: usize,
    pub elapsed: Duration,
    pub fetched: Fetched,
}

/// The two measurements of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub run: usize,
    pub flight: Sample,
    pub http: Sample,
}

/// Progress of a benchmark run, reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress<'a> {
    /// Run `run` is about to start its transfers.
    Started { run: usize },
    /// Both transfers of a run completed.
    Finished(&'a Trial),
}

/// Samples of all runs, in run order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Samples {
    pub trials: Vec<Trial>,
}

impl Samples {
    /// Elapsed seconds of `method`, in run order.
    pub fn seconds(&self, method: Method) -> Vec<f64> {
        self.trials
            .iter()
            .map(|trial| match method {
                Method::Flight => trial.flight.elapsed.as_secs_f64(),
                Method::Http => trial.http.elapsed.as_secs_f64(),
            })
            .collect()
    }

    pub fn report(&self) -> Option<Report> {
        Report::from_samples(&self.seconds(Method::Flight), &self.seconds(Method::Http))
    }
}

async fn timed<T: Transfer + ?Sized>(transfer: &T, run: usize) -> Result<Sample, TransferError> {
    let start = Instant::now();
    let fetched = transfer.fetch().await?;
    let elapsed = start.elapsed();
    debug!(
        "Run {} {}: {:?}, {} rows",
        run,
        transfer.method(),
        elapsed,
        fetched.rows
    );
    Ok(Sample {
        method: transfer.method(),
        run,
        elapsed,
        fetched,
    })
}

/// Run every trial, calling `on_progress` before and after each one.
///
/// The first failed transfer aborts the whole run.
pub async fn run_trials<F, H, C>(
    options: &BenchOptions,
    flight: &F,
    http: &H,
    mut on_progress: C,
) -> Result<Samples, BenchError>
where
    F: Transfer + ?Sized,
    H: Transfer + ?Sized,
    C: FnMut(Progress<'_>),
{
    info!("Running {} iterations", options.runs);
    let mut samples = Samples::default();
    for run in 0..options.runs {
        on_progress(Progress::Started { run });
        let flight_sample = timed(flight, run).await.map_err(BenchError::Flight)?;
        let http_sample = timed(http, run).await.map_err(BenchError::Http)?;

        if flight_sample.fetched.rows != http_sample.fetched.rows {
            warn!(
                "Row count mismatch in run {}: Flight {} vs HTTP {}",
                run, flight_sample.fetched.rows, http_sample.fetched.rows
            );
        }

        let trial = Trial {
            run,
            flight: flight_sample,
            http: http_sample,
        };
        on_progress(Progress::Finished(&trial));
        samples.trials.push(trial);
    }
    Ok(samples)
}

/// Run all trials, then build and persist the report.
pub async fn run_benchmark<F, H, C>(
    options: &BenchOptions,
    flight: &F,
    http: &H,
    on_progress: C,
) -> Result<(Report, PathBuf), BenchError>
where
    F: Transfer + ?Sized,
    H: Transfer + ?Sized,
    C: FnMut(Progress<'_>),
{
    let samples = run_trials(options, flight, http, on_progress).await?;
    let report = samples
        .report()
        .ok_or_else(|| BenchError::Config("no samples collected".to_string()))?;
    let path = report.persist(&options.results_dir, &Local::now())?;
    Ok((report, path))
}
