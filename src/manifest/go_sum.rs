use anyhow::Result;
use std::collections::HashSet;

use super::ManifestParser;
use crate::model::DependencyRecord;

/// Parses a `go.sum` checksum file.
///
/// Lines look like `module version[/go.mod] h1:hash`. A module usually shows
/// up twice (tree hash and `go.mod` hash); both collapse into one record.
pub struct GoSumParser;

impl ManifestParser for GoSumParser {
    fn name(&self) -> &'static str {
        "go.sum"
    }

    fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for line in content.lines() {
            let mut fields = line.split_whitespace();
            let (Some(name), Some(version)) = (fields.next(), fields.next()) else {
                continue;
            };
            let version = version.strip_suffix("/go.mod").unwrap_or(version);

            if seen.insert((name.to_string(), version.to_string())) {
                records.push(DependencyRecord::go(name, version));
            }
        }

        Ok(records)
    }
}
