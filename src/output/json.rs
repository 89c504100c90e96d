use super::Report;
use crate::model::{Coordinate, Vulnerability};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct JsonReport<'a> {
    audited: Vec<JsonCoordinate<'a>>,
    exclusions: &'a [String],
    invalid: Vec<JsonCoordinate<'a>>,
    num_audited: usize,
    num_vulnerable: usize,
    version: &'static str,
    vulnerable: Vec<JsonCoordinate<'a>>,
}

/// A coordinate with excluded vulnerabilities left out.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonCoordinate<'a> {
    coordinates: &'a str,
    reference: &'a str,
    vulnerabilities: Vec<&'a Vulnerability>,
    #[serde(rename = "invalidSemVer")]
    invalid_semver: bool,
}

impl<'a> From<&'a Coordinate> for JsonCoordinate<'a> {
    fn from(coordinate: &'a Coordinate) -> Self {
        Self {
            coordinates: &coordinate.coordinates,
            reference: &coordinate.reference,
            vulnerabilities: coordinate.unresolved().collect(),
            invalid_semver: coordinate.invalid_semver,
        }
    }
}

pub fn write_json(report: &Report<'_>, pretty: bool, out: &mut dyn Write) -> Result<()> {
    let vulnerable: Vec<JsonCoordinate> = report.vulnerable().map(Into::into).collect();
    let json_report = JsonReport {
        audited: report.audited().map(Into::into).collect(),
        exclusions: report.exclusions.ids(),
        invalid: report.invalid.iter().map(Into::into).collect(),
        num_audited: report.package_count,
        num_vulnerable: vulnerable.len(),
        version: env!("CARGO_PKG_VERSION"),
        vulnerable,
    };

    if pretty {
        serde_json::to_writer_pretty(&mut *out, &json_report)?;
    } else {
        serde_json::to_writer(&mut *out, &json_report)?;
    }
    writeln!(out)?;
    Ok(())
}
