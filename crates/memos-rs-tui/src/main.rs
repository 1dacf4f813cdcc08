//! `memos-dash`: terminal dashboard and headless commands for MemOS.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Target;
use log::info;
use memos_rs_config::{DashboardConfig, LayeredConfigOptions};
use memos_rs_tui::cli::{self, Cli, Command};
use memos_rs_tui::{Backend, TuiConfig, open_session};
use std::fs::OpenOptions;
use std::io;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut config = load_config(&cli)?;
    cli.apply_overrides(&mut config)?;

    let backend = Backend::connect(&config)?;
    let mut session = open_session(&config)?;
    cli::apply_namespace(&mut session, cli.namespace.as_deref())?;

    match cli.command() {
        Command::Tui { .. } => {
            memos_rs_tui::run(backend, session, TuiConfig::from_config(&config)).await
        }
        command => {
            let mut stdout = io::stdout().lock();
            cli::execute(command, &backend, session, &config, &mut stdout).await
        }
    }
}

/// Logs go to `--log-file` when given; stderr output would tear the TUI.
fn init_logging(cli: &Cli) -> Result<()> {
    let mut builder = env_logger::builder();
    builder.format_timestamp_millis().parse_default_env();
    if let Some(path) = &cli.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    let _ = builder.try_init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = &cli.config {
        options = options.with_runtime_path(path);
    }
    let layered =
        DashboardConfig::load_layered_with_options(options).context("failed to load config")?;
    for layer in &layered.layers {
        info!(
            "config layer applied (source={:?}, path={:?})",
            layer.source, layer.path
        );
    }
    Ok(layered.config)
}
