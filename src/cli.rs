//! Command line surface.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::exclusion::DEFAULT_EXCLUSION_FILE;

#[derive(Debug, Parser)]
#[command(name = "depaudit")]
#[command(
    about = "Check for vulnerabilities in your Go dependencies",
    long_about = "depaudit checks the modules listed by `go list -m all`, a go.sum \
                  file or a dep Gopkg.lock against Sonatype OSS Index.",
    override_usage = "go list -m all | depaudit [OPTIONS]\n       \
                      depaudit [OPTIONS] </path/to/Gopkg.lock>\n       \
                      depaudit [OPTIONS] </path/to/go.sum>\n       \
                      depaudit config [--init] [--path]",
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Set log level, multiple v's is more verbose
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Only show packages with vulnerabilities
    #[arg(short, long)]
    pub quiet: bool,

    /// Print help
    #[arg(short, long)]
    pub help: bool,

    /// Print version and build information
    #[arg(long)]
    pub version: bool,

    /// Do not colorize output
    #[arg(short, long)]
    pub no_color: bool,

    /// Delete the local cache directory
    #[arg(short, long)]
    pub clean_cache: bool,

    /// Comma separated list of vulnerability ids to exclude
    #[arg(short = 'e', long, value_delimiter = ',')]
    pub exclude_vulnerability: Vec<String>,

    /// OSS Index username
    #[arg(short, long, env = "DEPAUDIT_USER")]
    pub user: Option<String>,

    /// OSS Index API token
    #[arg(short, long, env = "DEPAUDIT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File of newline separated vulnerability ids to exclude
    #[arg(short = 'x', long, default_value = DEFAULT_EXCLUSION_FILE)]
    pub exclude_vulnerability_file: PathBuf,

    /// Output format (json, json-pretty, text, csv)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to a Gopkg.lock or go.sum; read `go list -m all` output from stdin when omitted
    #[arg(value_name = "MANIFEST")]
    pub paths: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show or create the config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "depaudit",
            "-vv",
            "--quiet",
            "--no-color",
            "--exclude-vulnerability=CVE-1,CVE-2",
            "--output",
            "csv",
            "go.sum",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
        assert!(cli.no_color);
        assert_eq!(cli.exclude_vulnerability, vec!["CVE-1", "CVE-2"]);
        assert_eq!(cli.output.as_deref(), Some("csv"));
        assert_eq!(cli.paths, vec!["go.sum"]);
        assert_eq!(
            cli.exclude_vulnerability_file,
            PathBuf::from(DEFAULT_EXCLUSION_FILE)
        );
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_help_and_version_are_plain_flags() {
        let cli = Cli::try_parse_from(["depaudit", "--help", "--version"]).unwrap();
        assert!(cli.help);
        assert!(cli.version);
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::try_parse_from(["depaudit", "config", "--init"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                init: true,
                path: false
            })
        ));
    }
}
