use super::{RenderOptions, Report};
use crate::model::{Coordinate, Severity};
use anyhow::Result;
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct VulnRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Reference")]
    reference: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Summary")]
    label: &'static str,
    #[tabled(rename = "Count")]
    count: usize,
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.enabled {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        self.paint(text, "31")
    }

    fn green(&self, text: &str) -> String {
        self.paint(text, "32")
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(text, "33")
    }

    fn severity(&self, severity: Severity) -> String {
        match severity {
            Severity::Critical => self.paint("CRITICAL", "31"),
            Severity::High => self.paint("HIGH", "91"),
            Severity::Medium => self.paint("MEDIUM", "33"),
            Severity::Low => self.paint("LOW", "32"),
            Severity::Unknown => "UNKNOWN".to_string(),
        }
    }
}

pub fn write_text(
    report: &Report<'_>,
    banner: bool,
    options: RenderOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let palette = Palette {
        enabled: !options.no_color,
    };

    if banner && !options.quiet {
        write_banner(out)?;
    }

    let total = report.package_count;
    for (index, coordinate) in report.audited().enumerate() {
        let position = format!("[{}/{}]", index + 1, total);

        if coordinate.is_vulnerable() {
            write_vulnerable(out, &palette, &position, coordinate)?;
        } else if !options.quiet {
            writeln!(
                out,
                "{} {}   {}",
                position,
                coordinate.coordinates,
                palette.green("No known vulnerabilities against package/version")
            )?;
        }
    }

    if !report.invalid.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            palette.yellow("!!!!! WARNING !!!!!\nScanning cannot be completed on the following package(s) since they do not use semver.")
        )?;
        for (index, coordinate) in report.invalid.iter().enumerate() {
            writeln!(
                out,
                "[{}/{}] {}",
                index + 1,
                report.invalid.len(),
                coordinate.coordinates
            )?;
        }
    }

    writeln!(out)?;
    write_summary(out, report)?;

    Ok(())
}

fn write_banner(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "depaudit")?;
    writeln!(out, "Audits Go dependencies with Sonatype OSS Index")?;
    writeln!(out, "depaudit version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out)?;
    Ok(())
}

fn write_vulnerable(
    out: &mut dyn Write,
    palette: &Palette,
    position: &str,
    coordinate: &Coordinate,
) -> Result<()> {
    let mut vulns: Vec<_> = coordinate.unresolved().collect();
    vulns.sort_by_key(|v| v.severity());

    writeln!(
        out,
        "{} {}   {}",
        position,
        palette.red(&coordinate.coordinates),
        palette.red(&format!(
            "[{} known {} affecting installed version]",
            vulns.len(),
            if vulns.len() == 1 { "vulnerability" } else { "vulnerabilities" }
        ))
    )?;

    let rows: Vec<VulnRow> = vulns
        .iter()
        .map(|v| VulnRow {
            severity: palette.severity(v.severity()),
            id: v.display_id().to_string(),
            score: v
                .cvss_score
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "-".to_string()),
            title: truncate(&v.title, 60),
            reference: if v.reference.is_empty() {
                "-".to_string()
            } else {
                v.reference.clone()
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    writeln!(out, "{}", table)?;
    Ok(())
}

fn write_summary(out: &mut dyn Write, report: &Report<'_>) -> Result<()> {
    let rows = vec![
        SummaryRow {
            label: "Audited Dependencies",
            count: report.package_count,
        },
        SummaryRow {
            label: "Vulnerable Dependencies",
            count: report.vulnerable().count(),
        },
        SummaryRow {
            label: "Unresolved Vulnerabilities",
            count: report.unresolved_count(),
        },
        SummaryRow {
            label: "Excluded Vulnerabilities",
            count: report.excluded_count(),
        },
        SummaryRow {
            label: "Invalid Dependencies",
            count: report.invalid.len(),
        },
    ];

    let table = Table::new(rows).with(Style::rounded()).to_string();
    writeln!(out, "{}", table)?;
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}
