//! Vulnerability exclusion list.
//!
//! The exclusion file holds one vulnerability identifier per line. Blank
//! lines and `#` comments are skipped. An entry may carry an expiry date:
//!
//! ```text
//! # accepted until the upstream fix lands
//! CVE-2020-27813 until=2030-01-31
//! sonatype-2019-0115
//! ```
//!
//! Expired entries are dropped. Anything else after the identifier makes
//! the file malformed.

use chrono::{Local, NaiveDate};
use std::fs;
use std::path::Path;

use crate::error::AuditError;
use crate::model::{Coordinate, Vulnerability};

/// Conventional location of the exclusion file.
pub const DEFAULT_EXCLUSION_FILE: &str = "./.depaudit-ignore";

/// Set of vulnerability identifiers suppressed from the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    ids: Vec<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        set.extend(ids);
        set
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() || self.contains(id) {
            return;
        }
        self.ids.push(id.to_string());
    }

    pub fn extend<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.insert(id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known.eq_ignore_ascii_case(id))
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// A vulnerability matches on its database id or its CVE.
    pub fn is_excluded(&self, vulnerability: &Vulnerability) -> bool {
        self.contains(&vulnerability.id)
            || vulnerability
                .cve
                .as_deref()
                .map(|cve| self.contains(cve))
                .unwrap_or(false)
    }

    /// Marks excluded vulnerabilities. Coordinates are never removed.
    pub fn apply(&self, coordinates: &mut [Coordinate]) {
        for coordinate in coordinates.iter_mut() {
            for vulnerability in coordinate.vulnerabilities.iter_mut() {
                vulnerability.excluded = self.is_excluded(vulnerability);
            }
        }
    }

    /// Loads identifiers from an exclusion file.
    ///
    /// A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        Self::load_at(path, Local::now().date_naive())
    }

    fn load_at(path: &Path, today: NaiveDate) -> Result<Self, AuditError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no exclusion file found");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(AuditError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut set = Self::new();
        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let malformed = |reason: String| AuditError::ExclusionFile {
                path: path.to_path_buf(),
                line: line_no,
                reason,
            };

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(id) = parts.next() else {
                continue;
            };

            let mut expired = false;
            for extra in parts {
                if extra.starts_with('#') {
                    break;
                }
                let Some(date) = extra.strip_prefix("until=") else {
                    return Err(malformed(format!("unexpected token '{}'", extra)));
                };
                let until = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|e| malformed(format!("invalid date '{}': {}", date, e)))?;
                if until < today {
                    expired = true;
                }
            }

            if expired {
                tracing::info!(id, "exclusion expired, ignoring");
                continue;
            }
            set.insert(id);
        }

        tracing::debug!(count = set.len(), path = %path.display(), "loaded exclusions");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn write(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".depaudit-ignore");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = ExclusionSet::load(&dir.path().join("absent")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_skips_comments_and_blanks() {
        let (_dir, path) = write("# header\n\nCVE-2018-1\n  CVE-2018-2  \nCVE-2018-1\n");
        let set = ExclusionSet::load_at(&path, today()).unwrap();
        assert_eq!(set.ids(), &["CVE-2018-1", "CVE-2018-2"]);
    }

    #[test]
    fn test_load_until_dates() {
        let (_dir, path) = write("CVE-1 until=2030-01-01\nCVE-2 until=2020-01-01\nCVE-3 # note\n");
        let set = ExclusionSet::load_at(&path, today()).unwrap();
        assert!(set.contains("CVE-1"));
        assert!(!set.contains("CVE-2"));
        assert!(set.contains("CVE-3"));
    }

    #[test]
    fn test_load_malformed_date() {
        let (_dir, path) = write("CVE-1\nCVE-2 until=tomorrow\n");
        let err = ExclusionSet::load_at(&path, today()).unwrap_err();
        match err {
            AuditError::ExclusionFile { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_unexpected_token() {
        let (_dir, path) = write("CVE-1 CVE-2\n");
        assert!(matches!(
            ExclusionSet::load_at(&path, today()),
            Err(AuditError::ExclusionFile { .. })
        ));
    }

    #[test]
    fn test_matches_id_or_cve() {
        let set = ExclusionSet::from_ids(["cve-2020-27813", "sonatype-1"]);
        assert!(set.is_excluded(&Vulnerability::new("uuid").with_cve("CVE-2020-27813")));
        assert!(set.is_excluded(&Vulnerability::new("sonatype-1")));
        assert!(!set.is_excluded(&Vulnerability::new("uuid").with_cve("CVE-2021-1")));
    }

    #[test]
    fn test_apply_keeps_coordinates() {
        let set = ExclusionSet::from_ids(["CVE-X"]);
        let mut coordinates = vec![Coordinate::new("pkg:golang/a@v1.0.0").with_vulnerabilities(vec![
            Vulnerability::new("1").with_cve("CVE-X"),
            Vulnerability::new("2").with_cve("CVE-Y"),
        ])];

        set.apply(&mut coordinates);

        assert_eq!(coordinates.len(), 1);
        assert_eq!(coordinates[0].vulnerabilities.len(), 2);
        assert_eq!(coordinates[0].unresolved().count(), 1);
        assert_eq!(coordinates[0].excluded().count(), 1);
    }
}
