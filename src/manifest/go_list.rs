use anyhow::Result;

use super::ManifestParser;
use crate::model::DependencyRecord;

/// Parses `go list -m all` output.
///
/// Each line is `module version`, optionally followed by a replacement
/// `=> module [version]`. The main module is printed without a version and
/// is skipped.
pub struct GoListParser;

impl ManifestParser for GoListParser {
    fn name(&self) -> &'static str {
        "go list"
    }

    fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>> {
        let mut records = Vec::new();

        for line in content.lines() {
            let (original, replacement) = match line.split_once("=>") {
                Some((original, replacement)) => (original, Some(replacement)),
                None => (line, None),
            };

            let mut fields = original.split_whitespace();
            let (Some(name), Some(version)) = (fields.next(), fields.next()) else {
                continue;
            };

            // A replacement with a version points at another module; a local
            // directory replacement has none and keeps the original.
            let record = replacement
                .and_then(|replacement| {
                    let mut fields = replacement.split_whitespace();
                    match (fields.next(), fields.next()) {
                        (Some(name), Some(version)) => Some(DependencyRecord::go(name, version)),
                        _ => None,
                    }
                })
                .unwrap_or_else(|| DependencyRecord::go(name, version));

            records.push(record);
        }

        Ok(records)
    }
}
