use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    /// Maps a numeric CVSS base score onto a severity bucket.
    pub fn from_score(score: f32) -> Self {
        match score {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s > 0.0 => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    /// Parses CVSS score into a severity level.
    ///
    /// Supports both numeric scores and CVSS vector strings.
    pub fn from_cvss(score: &str) -> Self {
        if let Ok(cvss) = score.trim().parse::<f32>() {
            return Self::from_score(cvss);
        }

        if score.contains("CVSS:") {
            // Simplified check based on the impact metrics of the vector
            if score.contains("/C:H") || score.contains("/I:H") || score.contains("/A:H") {
                return Severity::High;
            }
            if score.contains("/C:L") || score.contains("/I:L") || score.contains("/A:L") {
                return Severity::Medium;
            }
            return Severity::Low;
        }

        Severity::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A vulnerability reported by the lookup service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vulnerability {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cvss_score: Option<f32>,
    pub cvss_vector: Option<String>,
    pub cve: Option<String>,
    pub reference: String,
    /// Set when the identifier is in the exclusion set.
    #[serde(skip)]
    pub excluded: bool,
}

impl Vulnerability {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_cve(mut self, cve: impl Into<String>) -> Self {
        self.cve = Some(cve.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.cvss_score = Some(score);
        self
    }

    /// Human facing identifier: the CVE when known, the database id otherwise.
    pub fn display_id(&self) -> &str {
        self.cve
            .as_deref()
            .filter(|cve| !cve.is_empty())
            .unwrap_or(&self.id)
    }

    pub fn severity(&self) -> Severity {
        if let Some(score) = self.cvss_score {
            let severity = Severity::from_score(score);
            if severity != Severity::Unknown {
                return severity;
            }
        }
        self.cvss_vector
            .as_deref()
            .map(Severity::from_cvss)
            .unwrap_or(Severity::Unknown)
    }
}

/// The per-package outcome of an audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Coordinate {
    pub coordinates: String,
    pub reference: String,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(rename = "invalidSemVer")]
    pub invalid_semver: bool,
}

impl Coordinate {
    pub fn new(coordinates: impl Into<String>) -> Self {
        Self {
            coordinates: coordinates.into(),
            ..Self::default()
        }
    }

    /// A locally built result for an entry that was never looked up.
    pub fn invalid(raw: impl Into<String>) -> Self {
        Self {
            coordinates: raw.into(),
            invalid_semver: true,
            ..Self::default()
        }
    }

    pub fn with_vulnerabilities(mut self, vulnerabilities: Vec<Vulnerability>) -> Self {
        self.vulnerabilities = vulnerabilities;
        self
    }

    /// Vulnerabilities that survived exclusion.
    pub fn unresolved(&self) -> impl Iterator<Item = &Vulnerability> {
        self.vulnerabilities.iter().filter(|v| !v.excluded)
    }

    pub fn excluded(&self) -> impl Iterator<Item = &Vulnerability> {
        self.vulnerabilities.iter().filter(|v| v.excluded)
    }

    pub fn is_vulnerable(&self) -> bool {
        self.unresolved().next().is_some()
    }
}
