//! Text report of a benchmark run and its persisted form.

use std::{
    fmt::Write as _,
    fs::{self, OpenOptions},
    io::Write as _,
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};
use tracing::info;

use crate::stats::{Comparison, Summary};

const RULE_WIDTH: usize = 70;

/// Results of one harness invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub runs: usize,
    pub flight: Summary,
    pub http: Summary,
    pub comparison: Comparison,
}

impl Report {
    /// Returns `None` when either sample sequence is empty.
    pub fn from_samples(flight: &[f64], http: &[f64]) -> Option<Self> {
        let flight = Summary::from_samples(flight)?;
        let http = Summary::from_samples(http)?;
        let comparison = Comparison::between(flight.mean, http.mean);
        Some(Self {
            runs: flight.count.max(http.count),
            flight,
            http,
            comparison,
        })
    }

    /// The summary and verdict as printed on the console.
    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Results Summary");
        let _ = writeln!(out, "{rule}");
        write_summary(&mut out, "Arrow Flight", &self.flight);
        write_summary(&mut out, "Parquet over HTTP", &self.http);
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "Comparison");
        let _ = writeln!(out, "{rule}");
        let _ = write!(out, "{}", self.comparison.verdict());
        out
    }

    /// Environment metadata written ahead of the rendered text.
    pub fn environment(&self) -> String {
        format!(
            "Version: {} {}\nPlatform: {}\nRuns: {}\n",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            platform(),
            self.runs
        )
    }

    /// Write the report to a new timestamped file under `dir`, creating it
    /// if absent.
    ///
    /// An existing report with the same name is never overwritten: the call
    /// fails with [`std::io::ErrorKind::AlreadyExists`].
    pub fn persist<Tz>(&self, dir: &Path, now: &DateTime<Tz>) -> std::io::Result<PathBuf>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        fs::create_dir_all(dir)?;
        let path = dir.join(report_file_name(std::env::consts::OS, now));
        let content = format!("{}\n{}", self.environment(), self.render());
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(content.as_bytes())?;
        info!("Report written to {}", path.display());
        Ok(path)
    }
}

fn write_summary(out: &mut String, title: &str, summary: &Summary) {
    let _ = writeln!(out, "\n{title}:");
    let _ = writeln!(out, "  Mean time: {:.3}s", summary.mean);
    let _ = writeln!(out, "  Median time: {:.3}s", summary.median);
    let _ = writeln!(out, "  Min time: {:.3}s", summary.min);
    let _ = writeln!(out, "  Max time: {:.3}s", summary.max);
    if let Some(std_dev) = summary.std_dev {
        let _ = writeln!(out, "  Std dev: {:.3}s", std_dev);
    }
}

/// OS and architecture of the running binary, e.g. `linux x86_64`.
pub fn platform() -> String {
    format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
}

/// `benchmark-<platform>-<YYYYMMDD-HHMMSS>.txt`
pub fn report_file_name<Tz>(platform: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "benchmark-{}-{}.txt",
        platform.to_lowercase(),
        now.format("%Y%m%d-%H%M%S")
    )
}
