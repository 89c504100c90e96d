//! Entry selection and dispatch for one run.

use std::io::Write;

use clap::CommandFactory;

use crate::assembler::AuditConfig;
use crate::audit;
use crate::cache::Cache;
use crate::checker::VulnerabilityLookup;
use crate::cli::Cli;
use crate::error::{exit_codes, AuditError};
use crate::router::InputStream;

/// What a run does, picked once from the assembled configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Help,
    Version,
    CleanCache,
    Audit,
}

impl Entry {
    /// Flags are checked in priority order; the first one set wins.
    pub fn select(config: &AuditConfig) -> Self {
        [
            (config.help, Entry::Help),
            (config.version, Entry::Version),
            (config.clean_cache, Entry::CleanCache),
        ]
        .into_iter()
        .find_map(|(set, entry)| set.then_some(entry))
        .unwrap_or(Entry::Audit)
    }
}

/// Runs the selected entry and returns the process exit code.
///
/// Only [`Entry::Audit`] reads `input` or calls `lookup`.
pub async fn execute<L: VulnerabilityLookup + ?Sized>(
    config: &AuditConfig,
    cache: &Cache,
    lookup: &L,
    input: &mut dyn InputStream,
    out: &mut dyn Write,
    show_progress: bool,
) -> Result<u8, AuditError> {
    let entry = Entry::select(config);
    tracing::debug!(?entry, "selected entry");

    match entry {
        Entry::Help => {
            writeln!(out, "{}", Cli::command().render_help())
                .map_err(|e| AuditError::Report(e.into()))?;
            Ok(exit_codes::SUCCESS)
        }
        Entry::Version => {
            write_version(out).map_err(|e| AuditError::Report(e.into()))?;
            Ok(exit_codes::SUCCESS)
        }
        Entry::CleanCache => {
            cache.remove_all().map_err(|e| {
                tracing::error!(dir = %cache.dir().display(), error = %e, "failed to clean cache");
                AuditError::CleanCache(e)
            })?;
            writeln!(out, "Cache cleaned: {}", cache.dir().display())
                .map_err(|e| AuditError::Report(e.into()))?;
            Ok(exit_codes::SUCCESS)
        }
        Entry::Audit => {
            let outcome = audit::run(config, input, lookup, out, show_progress).await?;
            Ok(outcome.exit_code())
        }
    }
}

fn write_version(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "depaudit version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        out,
        "build time: {}",
        option_env!("DEPAUDIT_BUILD_TIME").unwrap_or("unknown")
    )?;
    writeln!(
        out,
        "build commit: {}",
        option_env!("DEPAUDIT_BUILD_COMMIT").unwrap_or("unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;
    use crate::router::BufferedInput;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VulnerabilityLookup for CountingLookup {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn lookup(
            &self,
            purls: &[String],
            _config: &AuditConfig,
        ) -> anyhow::Result<Vec<Coordinate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(purls.iter().map(|p| Coordinate::new(p.clone())).collect())
        }
    }

    struct Run {
        result: Result<u8, AuditError>,
        out: String,
        lookups: usize,
    }

    async fn execute_with(config: &AuditConfig, cache: &Cache) -> Run {
        let lookup = CountingLookup::default();
        let mut input = BufferedInput::piped("github.com/pkg/errors v0.9.1\n");
        let mut out = Vec::new();
        let result = execute(config, cache, &lookup, &mut input, &mut out, false).await;
        Run {
            result,
            out: String::from_utf8(out).unwrap(),
            lookups: lookup.calls.load(Ordering::SeqCst),
        }
    }

    fn temp_cache() -> (tempfile::TempDir, Cache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::in_dir(dir.path().join("cache"), Duration::from_secs(3600));
        (dir, cache)
    }

    #[test]
    fn test_entry_priority() {
        let mut config = AuditConfig::default();
        assert_eq!(Entry::select(&config), Entry::Audit);

        config.clean_cache = true;
        assert_eq!(Entry::select(&config), Entry::CleanCache);

        config.version = true;
        assert_eq!(Entry::select(&config), Entry::Version);

        config.help = true;
        assert_eq!(Entry::select(&config), Entry::Help);
    }

    #[tokio::test]
    async fn test_help_wins_and_never_audits() {
        let (_dir, cache) = temp_cache();
        let config = AuditConfig {
            help: true,
            version: true,
            clean_cache: true,
            ..AuditConfig::default()
        };
        cache.set("key", &1u8).unwrap();

        let run = execute_with(&config, &cache).await;

        assert_eq!(run.result.unwrap(), 0);
        assert!(run.out.contains("Usage:"));
        assert_eq!(run.lookups, 0);
        assert!(cache.dir().exists());
    }

    #[tokio::test]
    async fn test_version() {
        let (_dir, cache) = temp_cache();
        let config = AuditConfig {
            version: true,
            clean_cache: true,
            ..AuditConfig::default()
        };

        let run = execute_with(&config, &cache).await;

        assert_eq!(run.result.unwrap(), 0);
        assert!(run
            .out
            .contains(&format!("depaudit version: {}", env!("CARGO_PKG_VERSION"))));
        assert!(run.out.contains("build commit:"));
        assert_eq!(run.lookups, 0);
    }

    #[tokio::test]
    async fn test_clean_cache_removes_dir_without_auditing() {
        let (_dir, cache) = temp_cache();
        cache.set("key", &1u8).unwrap();
        let config = AuditConfig {
            clean_cache: true,
            ..AuditConfig::default()
        };

        let run = execute_with(&config, &cache).await;

        assert_eq!(run.result.unwrap(), 0);
        assert!(!cache.dir().exists());
        assert!(run.out.starts_with("Cache cleaned:"));
        assert_eq!(run.lookups, 0);
    }

    #[tokio::test]
    async fn test_clean_cache_failure_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where the cache directory should be cannot be removed
        // as a directory.
        let not_a_dir = dir.path().join("cache");
        fs::write(&not_a_dir, "").unwrap();
        let cache = Cache::in_dir(&not_a_dir, Duration::from_secs(3600));
        let config = AuditConfig {
            clean_cache: true,
            ..AuditConfig::default()
        };

        let run = execute_with(&config, &cache).await;

        let err = run.result.unwrap_err();
        assert!(matches!(err, AuditError::CleanCache(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("cleaning cache:"));
        assert!(run.out.is_empty());
        assert_eq!(run.lookups, 0);
    }

    #[tokio::test]
    async fn test_audit_entry_runs_pipeline() {
        let (_dir, cache) = temp_cache();
        let config = AuditConfig {
            no_color: true,
            ..AuditConfig::default()
        };

        let run = execute_with(&config, &cache).await;

        assert_eq!(run.result.unwrap(), 0);
        assert_eq!(run.lookups, 1);
        assert!(run.out.contains("[1/1] pkg:golang/github.com/pkg/errors@v0.9.1"));
    }
}
