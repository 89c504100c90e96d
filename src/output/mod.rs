mod csv;
mod json;
mod text;

pub use self::csv::write_csv;
pub use json::write_json;
pub use text::write_text;

use crate::exclusion::ExclusionSet;
use crate::model::Coordinate;
use anyhow::Result;
use std::io::Write;

/// Output format for audit results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact JSON for programmatic use
    Json,
    /// Indented JSON
    JsonPretty,
    /// Human-readable text with tables
    Text,
    /// Comma separated values
    Csv,
}

/// A selected output format plus the capabilities decided with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatter {
    pub format: OutputFormat,
    /// Whether a decorative banner is printed ahead of the report.
    pub supports_banner: bool,
}

impl Formatter {
    pub const fn new(format: OutputFormat) -> Self {
        Self {
            format,
            supports_banner: matches!(format, OutputFormat::Text),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputFormat::Text)
    }
}

/// Maps format names accepted on the command line to formatters.
#[derive(Debug, Clone)]
pub struct FormatterRegistry {
    entries: Vec<(&'static str, Formatter)>,
    default_name: &'static str,
}

impl FormatterRegistry {
    /// The json, json-pretty, text and csv formatters, defaulting to text.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                ("json", Formatter::new(OutputFormat::Json)),
                ("json-pretty", Formatter::new(OutputFormat::JsonPretty)),
                ("text", Formatter::new(OutputFormat::Text)),
                ("csv", Formatter::new(OutputFormat::Csv)),
            ],
            default_name: "text",
        }
    }

    pub fn get(&self, name: &str) -> Option<Formatter> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, formatter)| *formatter)
    }

    pub fn default_name(&self) -> &'static str {
        self.default_name
    }

    pub fn default_formatter(&self) -> Formatter {
        self.get(self.default_name).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Presentation switches shared by every formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub quiet: bool,
    pub no_color: bool,
}

/// Everything a formatter needs to render an audit.
pub struct Report<'a> {
    /// Number of purls submitted for lookup.
    pub package_count: usize,
    /// Looked-up coordinates followed by the invalid ones.
    pub coordinates: &'a [Coordinate],
    pub invalid: &'a [Coordinate],
    pub exclusions: &'a ExclusionSet,
}

impl Report<'_> {
    pub fn audited(&self) -> impl Iterator<Item = &Coordinate> {
        self.coordinates.iter().filter(|c| !c.invalid_semver)
    }

    pub fn vulnerable(&self) -> impl Iterator<Item = &Coordinate> {
        self.audited().filter(|c| c.is_vulnerable())
    }

    /// Vulnerability records that survived exclusion.
    pub fn unresolved_count(&self) -> usize {
        self.audited().map(|c| c.unresolved().count()).sum()
    }

    pub fn excluded_count(&self) -> usize {
        self.audited().map(|c| c.excluded().count()).sum()
    }
}

/// Writes the report in the selected format and returns the number of
/// vulnerabilities left after exclusion.
pub fn render(
    report: &Report<'_>,
    formatter: &Formatter,
    options: RenderOptions,
    out: &mut dyn Write,
) -> Result<usize> {
    match formatter.format {
        OutputFormat::Json => write_json(report, false, out)?,
        OutputFormat::JsonPretty => write_json(report, true, out)?,
        OutputFormat::Text => write_text(report, formatter.supports_banner, options, out)?,
        OutputFormat::Csv => write_csv(report, options, out)?,
    }
    out.flush()?;
    Ok(report.unresolved_count())
}
