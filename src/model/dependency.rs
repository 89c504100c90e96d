use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Golang,
}

impl Ecosystem {
    /// The package-url type for this ecosystem.
    pub fn purl_type(&self) -> &'static str {
        match self {
            Ecosystem::Golang => "golang",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.purl_type())
    }
}

/// One dependency entry as it appears in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub version: String,
    pub ecosystem: Ecosystem,
}

impl DependencyRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>, ecosystem: Ecosystem) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ecosystem,
        }
    }

    pub fn go(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(name, version, Ecosystem::Golang)
    }

    /// Version with any `+incompatible` marker removed.
    pub fn normalized_version(&self) -> &str {
        self.version
            .strip_suffix("+incompatible")
            .unwrap_or(&self.version)
    }

    /// Returns true if the version can be read as a semantic version.
    ///
    /// Go versions carry a leading `v`, which is ignored here.
    pub fn has_valid_version(&self) -> bool {
        let version = self.normalized_version();
        !version.is_empty() && semver::Version::parse(version.trim_start_matches('v')).is_ok()
    }

    /// Canonical package identifier, e.g. `pkg:golang/github.com/pkg/errors@v0.9.1`.
    pub fn purl(&self) -> String {
        format!(
            "pkg:{}/{}@{}",
            self.ecosystem.purl_type(),
            self.name,
            self.normalized_version()
        )
    }

    /// The raw form used when a record cannot be turned into a purl.
    pub fn raw(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}@{}", self.name, self.version)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purl_format() {
        let record = DependencyRecord::go("github.com/pkg/errors", "v0.9.1");
        assert_eq!(record.purl(), "pkg:golang/github.com/pkg/errors@v0.9.1");
    }

    #[test]
    fn test_purl_strips_incompatible() {
        let record = DependencyRecord::go("github.com/docker/docker", "v17.12.0-ce-rc1+incompatible");
        assert_eq!(
            record.purl(),
            "pkg:golang/github.com/docker/docker@v17.12.0-ce-rc1"
        );
    }

    #[test]
    fn test_valid_versions() {
        assert!(DependencyRecord::go("a", "v1.2.3").has_valid_version());
        assert!(DependencyRecord::go("a", "1.2.3").has_valid_version());
        assert!(DependencyRecord::go("a", "v0.0.0-20190308221718-c2843e01d9a2").has_valid_version());
        assert!(DependencyRecord::go("a", "v2.0.0+incompatible").has_valid_version());
    }

    #[test]
    fn test_invalid_versions() {
        assert!(!DependencyRecord::go("a", "").has_valid_version());
        assert!(!DependencyRecord::go("a", "master").has_valid_version());
        assert!(!DependencyRecord::go("a", "v1.2").has_valid_version());
    }

    #[test]
    fn test_raw_form() {
        assert_eq!(DependencyRecord::go("a/b", "").raw(), "a/b");
        assert_eq!(DependencyRecord::go("a/b", "master").raw(), "a/b@master");
    }
}
