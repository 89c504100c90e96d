use super::{RenderOptions, Report};
use anyhow::Result;
use std::io::Write;

/// Quotes a field when it contains a delimiter, quote, or line break.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_row(out: &mut dyn Write, fields: &[String]) -> Result<()> {
    let line: Vec<String> = fields.iter().map(|f| field(f)).collect();
    writeln!(out, "{}", line.join(","))?;
    Ok(())
}

pub fn write_csv(report: &Report<'_>, options: RenderOptions, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Summary")?;
    writeln!(
        out,
        "Audited Count,Vulnerable Count,Unresolved Vulnerabilities,Excluded Vulnerabilities,Build Version"
    )?;
    write_row(
        out,
        &[
            report.package_count.to_string(),
            report.vulnerable().count().to_string(),
            report.unresolved_count().to_string(),
            report.excluded_count().to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        ],
    )?;

    if !report.invalid.is_empty() {
        writeln!(out)?;
        writeln!(out, "Invalid Package(s)")?;
        writeln!(out, "Count,Package,Reason")?;
        for (index, coordinate) in report.invalid.iter().enumerate() {
            write_row(
                out,
                &[
                    format!("[{}/{}]", index + 1, report.invalid.len()),
                    coordinate.coordinates.clone(),
                    "Does not use SemVer".to_string(),
                ],
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Audited Package(s)")?;
    writeln!(out, "Count,Package,Is Vulnerable,Num Vulns,Vulns")?;
    for (index, coordinate) in report.audited().enumerate() {
        let vulnerable = coordinate.is_vulnerable();
        if options.quiet && !vulnerable {
            continue;
        }
        let vulns: Vec<_> = coordinate.unresolved().collect();
        write_row(
            out,
            &[
                format!("[{}/{}]", index + 1, report.package_count),
                coordinate.coordinates.clone(),
                vulnerable.to_string(),
                vulns.len().to_string(),
                serde_json::to_string(&vulns)?,
            ],
        )?;
    }

    Ok(())
}
