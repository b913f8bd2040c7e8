use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use myapp::Cli;
use myapp::core::config::{self, AppConfig};

fn init_tracing(verbose: bool, config: &AppConfig) -> anyhow::Result<()> {
    let fallback = if verbose {
        "debug".to_string()
    } else {
        config.log.filter.clone().unwrap_or_else(|| "warn".to_string())
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("MYAPP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("{} {:#}", "error:".bright_red().bold(), e);
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config = config::load_config(&cwd, cli.config.as_deref()).context("failed to load config")?;
    init_tracing(cli.verbose, &config)?;
    myapp::run(cli, config)?;
    Ok(())
}
