//! Error taxonomy for an audit run.
//!
//! Every fatal condition the pipeline can hit maps onto one [`AuditError`]
//! variant. Each variant knows the process exit code it terminates with and
//! whether usage text should accompany the message.

use std::path::PathBuf;

/// Exit codes for CI integration
pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const INVALID_PATH: u8 = 3;
    /// Upper bound for a findings count reported through the exit status.
    pub const MAX_FINDINGS: u8 = u8::MAX;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("wrong number of manifest paths: [{}]", .0.join(", "))]
    WrongPathCount(Vec<String>),

    #[error("stdin is invalid, either empty or another reason")]
    InvalidStdin,

    #[error("invalid path arg: {0}")]
    UnroutablePath(String),

    #[error("no lock data found at {}, could not continue", .0.display())]
    MissingLock(PathBuf),

    #[error("could not read manifest at path {}: {reason}", .path.display())]
    ManifestParse { path: PathBuf, reason: String },

    #[error("malformed exclusion file {}: line {line}: {reason}", .path.display())]
    ExclusionFile {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("error auditing packages: {0:#}")]
    Lookup(#[source] anyhow::Error),

    #[error("cleaning cache: {0:#}")]
    CleanCache(#[source] anyhow::Error),

    #[error("error writing report: {0:#}")]
    Report(#[source] anyhow::Error),

    #[error("io error: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AuditError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AuditError::UnroutablePath(_) => exit_codes::INVALID_PATH,
            _ => exit_codes::ERROR,
        }
    }

    /// Usage errors and invalid stdin are followed by the usage text.
    pub fn prints_usage(&self) -> bool {
        matches!(
            self,
            AuditError::WrongPathCount(_)
                | AuditError::UnroutablePath(_)
                | AuditError::InvalidStdin
                | AuditError::MissingLock(_)
                | AuditError::ManifestParse { .. }
                | AuditError::Lookup(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let unroutable = AuditError::UnroutablePath("package-lock.json".into());
        assert_eq!(unroutable.exit_code(), 3);
        assert!(unroutable.prints_usage());
        assert_eq!(AuditError::InvalidStdin.exit_code(), 1);
        assert_eq!(
            AuditError::Lookup(anyhow::anyhow!("connection refused")).exit_code(),
            1
        );
        assert_eq!(
            AuditError::CleanCache(anyhow::anyhow!("permission denied")).exit_code(),
            1
        );
        assert!(!AuditError::CleanCache(anyhow::anyhow!("permission denied")).prints_usage());
    }

    #[test]
    fn test_wrong_path_count_names_values() {
        let err = AuditError::WrongPathCount(vec!["go.sum".into(), "Gopkg.lock".into()]);
        assert_eq!(
            err.to_string(),
            "wrong number of manifest paths: [go.sum, Gopkg.lock]"
        );
        assert!(err.prints_usage());
    }

    #[test]
    fn test_lookup_error_keeps_context() {
        let err = AuditError::Lookup(anyhow::anyhow!("boom").context("OSS Index request failed"));
        let message = err.to_string();
        assert!(message.contains("error auditing packages"));
        assert!(message.contains("OSS Index request failed"));
        assert!(message.contains("boom"));
    }
}
