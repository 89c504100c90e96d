//! Manifest parsers.
//!
//! Each parser turns raw manifest text into an ordered list of
//! [`DependencyRecord`]s. [`extract_purls`] then normalizes the records into
//! package identifiers, partitioning out the ones that cannot be normalized.
//!
//! # Supported Manifests
//!
//! | Manifest | Parser | Produced by |
//! |----------|--------|-------------|
//! | module list | [`GoListParser`] | `go list -m all` |
//! | `go.sum` | [`GoSumParser`] | Go modules |
//! | `Gopkg.lock` | [`GopkgLockParser`] | dep |

mod go_list;
mod go_sum;
mod gopkg_lock;

pub use go_list::GoListParser;
pub use go_sum::GoSumParser;
pub use gopkg_lock::GopkgLockParser;

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::model::DependencyRecord;

/// Parses the text of one manifest format.
pub trait ManifestParser {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>>;
}

/// The kind of manifest a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// dep's `Gopkg.lock`.
    GopkgLock,
    /// Go modules checksum file.
    GoSum,
}

impl ManifestKind {
    /// Matches on the file name patterns dep and Go modules use.
    pub fn detect(path: &Path) -> Option<Self> {
        let path = path.to_string_lossy();
        if path.contains("Gopkg.lock") {
            Some(ManifestKind::GopkgLock)
        } else if path.contains("go.sum") {
            Some(ManifestKind::GoSum)
        } else {
            None
        }
    }
}

/// Package identifiers ready for lookup, plus the entries that could not be
/// normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurlBatch {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

impl PurlBatch {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.invalid.is_empty()
    }
}

/// Splits records into purls and invalid entries.
///
/// Both lists are de-duplicated and keep first-seen order.
pub fn extract_purls(records: &[DependencyRecord]) -> PurlBatch {
    let mut batch = PurlBatch::default();
    let mut seen = HashSet::new();

    for record in records {
        let (entry, valid) = if record.has_valid_version() {
            (record.purl(), true)
        } else {
            (record.raw(), false)
        };

        if !seen.insert(entry.clone()) {
            continue;
        }

        if valid {
            batch.valid.push(entry);
        } else {
            tracing::debug!(entry = %entry, "version is not valid semver, flagging as invalid");
            batch.invalid.push(entry);
        }
    }

    batch
}
