use anyhow::{Context, Result};
use serde::Deserialize;

use super::ManifestParser;
use crate::model::DependencyRecord;

/// Parses dep's `Gopkg.lock`.
///
/// Projects pinned only by revision have no version and come back with an
/// empty one; purl extraction flags them as invalid.
pub struct GopkgLockParser;

#[derive(Deserialize)]
struct GopkgLock {
    projects: Option<Vec<LockedProject>>,
}

#[derive(Deserialize)]
struct LockedProject {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    revision: Option<String>,
}

impl GopkgLockParser {
    /// Returns `None` when the lock has no `projects` table at all.
    pub fn parse_lock(&self, content: &str) -> Result<Option<Vec<DependencyRecord>>> {
        let lock: GopkgLock = toml::from_str(content).context("invalid Gopkg.lock")?;

        Ok(lock.projects.map(|projects| {
            projects
                .into_iter()
                .map(|project| {
                    let version = project
                        .version
                        .filter(|v| !v.is_empty())
                        .or(project.revision)
                        .unwrap_or_default();
                    DependencyRecord::go(project.name, version)
                })
                .collect()
        }))
    }
}

impl ManifestParser for GopkgLockParser {
    fn name(&self) -> &'static str {
        "Gopkg.lock"
    }

    fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>> {
        Ok(self.parse_lock(content)?.unwrap_or_default())
    }
}
