//! Audit orchestration.
//!
//! Takes a normalized [`PurlBatch`], submits the valid purls to a
//! [`VulnerabilityLookup`] in one batch, merges the results with the invalid
//! entries, applies exclusions and renders the report. The number of
//! vulnerabilities left standing decides the process outcome.

use std::io::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::assembler::AuditConfig;
use crate::checker::VulnerabilityLookup;
use crate::error::{exit_codes, AuditError};
use crate::manifest::PurlBatch;
use crate::model::Coordinate;
use crate::output::{self, Report};
use crate::router::{self, InputStream};

/// How a completed audit terminates the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    /// Number of unresolved vulnerability records.
    Findings(usize),
}

impl Outcome {
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Outcome::Clean
        } else {
            Outcome::Findings(count)
        }
    }

    /// Findings beyond what an exit status can carry are clamped.
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Clean => exit_codes::SUCCESS,
            Outcome::Findings(count) => {
                u8::try_from(*count).unwrap_or(exit_codes::MAX_FINDINGS)
            }
        }
    }
}

/// Result of one audit pass.
#[derive(Debug)]
pub struct AuditOutcome {
    /// Purls submitted for lookup.
    pub package_count: usize,
    /// Lookup results in submission order, then invalid entries.
    pub coordinates: Vec<Coordinate>,
    pub invalid_count: usize,
    pub unresolved: usize,
}

impl AuditOutcome {
    pub fn outcome(&self) -> Outcome {
        Outcome::from_count(self.unresolved)
    }

    pub fn invalid(&self) -> &[Coordinate] {
        &self.coordinates[self.coordinates.len() - self.invalid_count..]
    }
}

pub struct Auditor<'a, L: VulnerabilityLookup + ?Sized> {
    lookup: &'a L,
    show_progress: bool,
}

impl<'a, L: VulnerabilityLookup + ?Sized> Auditor<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            show_progress: false,
        }
    }

    /// Shows a spinner on stderr while the lookup is in flight.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn audit(
        &self,
        batch: PurlBatch,
        config: &AuditConfig,
        out: &mut dyn Write,
    ) -> Result<AuditOutcome, AuditError> {
        let package_count = batch.valid.len();
        tracing::info!(
            lookup = self.lookup.name(),
            packages = package_count,
            invalid = batch.invalid.len(),
            "auditing packages"
        );

        let progress = self.spinner(package_count);
        let looked_up = self.lookup.lookup(&batch.valid, config).await;
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        let mut coordinates = looked_up.map_err(|e| {
            tracing::error!(error = %e, "vulnerability lookup failed");
            AuditError::Lookup(e)
        })?;

        let invalid_count = batch.invalid.len();
        coordinates.extend(batch.invalid.into_iter().map(Coordinate::invalid));

        config.exclusions.apply(&mut coordinates);

        let report = Report {
            package_count,
            coordinates: &coordinates,
            invalid: &coordinates[coordinates.len() - invalid_count..],
            exclusions: &config.exclusions,
        };
        let unresolved = output::render(
            &report,
            &config.formatter,
            config.render_options(),
            out,
        )
        .map_err(AuditError::Report)?;

        tracing::debug!(unresolved, "audit complete");
        Ok(AuditOutcome {
            package_count,
            coordinates,
            invalid_count,
            unresolved,
        })
    }

    fn spinner(&self, package_count: usize) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Auditing {} package(s)...", package_count));
        Some(pb)
    }
}

/// Routes the configured input and audits it.
///
/// A `go.sum` path that does not exist is a clean run with no output.
pub async fn run<L: VulnerabilityLookup + ?Sized>(
    config: &AuditConfig,
    input: &mut dyn InputStream,
    lookup: &L,
    out: &mut dyn Write,
    show_progress: bool,
) -> Result<Outcome, AuditError> {
    let Some(batch) = router::route(config, input)? else {
        return Ok(Outcome::Clean);
    };

    let outcome = Auditor::new(lookup)
        .with_progress(show_progress)
        .audit(batch, config, out)
        .await?;
    Ok(outcome.outcome())
}
