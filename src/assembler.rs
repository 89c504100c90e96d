//! Assembles the immutable [`AuditConfig`] for one run.
//!
//! Command line flags, the persisted [`Config`] file, the exclusion file and
//! the formatter registry are merged here, once. Everything downstream reads
//! the resulting value by reference.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::{Config, DEFAULT_CACHE_TTL_HOURS};
use crate::error::AuditError;
use crate::exclusion::ExclusionSet;
use crate::output::{Formatter, FormatterRegistry, RenderOptions};

/// Where dependency data is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// `go list -m all` output piped into the process.
    Stdin,
    /// A manifest file named on the command line.
    Path(PathBuf),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Configuration for a single audit run.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub input: InputSource,
    pub formatter: Formatter,
    pub quiet: bool,
    pub no_color: bool,
    pub verbosity: u8,
    pub credentials: Option<Credentials>,
    pub exclusions: ExclusionSet,
    pub help: bool,
    pub version: bool,
    pub clean_cache: bool,
    pub cache_ttl_hours: u64,
}

impl AuditConfig {
    /// Log filter used when `RUST_LOG` is unset: warn, then one level more
    /// per `-v`.
    pub fn log_directive(&self) -> String {
        let level = match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        format!("depaudit={}", level)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            quiet: self.quiet,
            no_color: self.no_color,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            input: InputSource::Stdin,
            formatter: Formatter::default(),
            quiet: false,
            no_color: false,
            verbosity: 0,
            credentials: None,
            exclusions: ExclusionSet::new(),
            help: false,
            version: false,
            clean_cache: false,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
        }
    }
}

/// The assembled configuration plus what was noticed while assembling it.
///
/// Assembly runs before logging is set up, so messages are collected here
/// and emitted by the caller.
#[derive(Debug)]
pub struct Assembly {
    pub config: AuditConfig,
    /// Shown to the user on stderr.
    pub warnings: Vec<String>,
    /// Logged at info level.
    pub notices: Vec<String>,
}

/// Builds the run configuration.
///
/// `persisted` is the result of loading the config file; a failure there is
/// noted and defaults are used. A malformed exclusion file is fatal.
pub fn assemble(
    cli: &Cli,
    persisted: anyhow::Result<Config>,
    registry: &FormatterRegistry,
) -> Result<Assembly, AuditError> {
    let mut warnings = Vec::new();
    let mut notices = Vec::new();

    let persisted = persisted.unwrap_or_else(|e| {
        notices.push(format!(
            "unable to load config from file, using defaults: {:#}",
            e
        ));
        Config::default()
    });

    let input = select_input(&cli.paths)?;

    let requested = cli
        .output
        .as_deref()
        .or(persisted.default_output.as_deref())
        .unwrap_or(registry.default_name());
    let formatter = match registry.get(requested) {
        Some(formatter) => formatter,
        None => {
            let warning = format!(
                "Output format of {} is not valid. Defaulting to {} output",
                requested.trim(),
                registry.default_name()
            );
            warnings.push(warning);
            registry.default_formatter()
        }
    };

    let mut exclusions = ExclusionSet::load(&cli.exclude_vulnerability_file)?;
    exclusions.extend(cli.exclude_vulnerability.iter().cloned());

    let username = cli.user.clone().or(persisted.username);
    let token = cli.token.clone().or(persisted.token);
    let credentials = match (username, token) {
        (Some(username), Some(token)) if !username.is_empty() && !token.is_empty() => {
            Some(Credentials { username, token })
        }
        _ => None,
    };

    let config = AuditConfig {
        input,
        formatter,
        quiet: cli.quiet,
        no_color: cli.no_color,
        verbosity: cli.verbose,
        credentials,
        exclusions,
        help: cli.help,
        version: cli.version,
        clean_cache: cli.clean_cache,
        cache_ttl_hours: persisted.cache_ttl_hours,
    };

    Ok(Assembly {
        config,
        warnings,
        notices,
    })
}

/// At most one manifest path; none means stdin.
fn select_input(paths: &[String]) -> Result<InputSource, AuditError> {
    match paths {
        [] => Ok(InputSource::Stdin),
        [path] => Ok(InputSource::Path(PathBuf::from(path))),
        _ => Err(AuditError::WrongPathCount(paths.to_vec())),
    }
}
