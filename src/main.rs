use clap::{CommandFactory, Parser};
use depaudit::{
    assembler::assemble,
    cache::Cache,
    checker::OssIndexClient,
    cli::{Cli, Commands},
    config::Config,
    entry,
    error::{exit_codes, AuditError},
    output::FormatterRegistry,
    router::StdinInput,
};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(exit_codes::ERROR);
        }
    };

    if let Some(Commands::Config { init, path }) = &cli.command {
        init_logging("depaudit=warn");
        return match handle_config(*init, *path) {
            Ok(()) => ExitCode::from(exit_codes::SUCCESS),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(exit_codes::ERROR)
            }
        };
    }

    match run(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.prints_usage() {
                eprintln!();
                eprintln!("{}", Cli::command().render_usage());
            }
            ExitCode::from(e.exit_code())
        }
    }
}

/// `RUST_LOG` wins over the directive derived from `-v`.
fn init_logging(directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<u8, AuditError> {
    let registry = FormatterRegistry::standard();
    let assembly = match assemble(cli, Config::load(), &registry) {
        Ok(assembly) => assembly,
        Err(e) => {
            init_logging("depaudit=warn");
            return Err(e);
        }
    };
    let config = assembly.config;

    init_logging(&config.log_directive());
    for notice in &assembly.notices {
        tracing::info!("{}", notice);
    }
    for warning in &assembly.warnings {
        tracing::warn!("{}", warning);
        eprintln!("!!!!! {} !!!!!", warning);
    }
    tracing::debug!(?config, "assembled configuration");

    let cache = Cache::with_ttl_hours(config.cache_ttl_hours);
    let client = OssIndexClient::with_cache(Cache::with_ttl_hours(config.cache_ttl_hours));
    let show_progress =
        config.formatter.supports_banner && !config.quiet && io::stderr().is_terminal();

    let mut input = StdinInput::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    entry::execute(&config, &cache, &client, &mut input, &mut out, show_progress).await
}

fn handle_config(init: bool, show_path: bool) -> anyhow::Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        Config::default().save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'depaudit config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
