use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod style;
#[cfg(feature = "tui")]
mod tui;
mod util;

use cli::{Cli, Commands};
use commands::{
    ReadArgs, WatchArgs, cmd_check, cmd_config, cmd_export, cmd_read, cmd_sleep, cmd_voice,
    cmd_watch,
};
use config::{Config, config_path};
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "sensordash", &mut io::stdout());
        return Ok(());
    }

    init_tracing(&cli);

    let path = config_path(cli.config.as_ref());
    let config = Config::load_from(&path).with_store_args(&cli.store);
    let opts = FormatOptions::new(cli.no_color);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Read {
            last,
            format,
            output,
            compact,
        } => {
            let opts = opts.with_compact(compact);
            cmd_read(ReadArgs {
                last,
                format,
                output: output.as_ref(),
                quiet,
                opts: &opts,
                config: &config,
            })
            .await?;
        }
        Commands::Check { dispatch, json } => {
            cmd_check(dispatch, json, quiet, &opts, &config).await?;
        }
        Commands::Export { month, output } => {
            cmd_export(month, output.as_deref(), quiet, &config).await?;
        }
        Commands::Sleep { action } => {
            cmd_sleep(action, quiet, &opts, &config).await?;
        }
        Commands::Voice { phrase } => {
            cmd_voice(phrase, quiet, &opts, &config).await?;
        }
        Commands::Watch(watch) => {
            cmd_watch(WatchArgs {
                interval: watch.interval,
                json: watch.json,
                no_dispatch: watch.no_dispatch,
                quiet,
                opts: &opts,
                config: &config,
            })
            .await?;
        }
        #[cfg(feature = "tui")]
        Commands::Dashboard => {
            tui::run(&config).await?;
        }
        Commands::Config { action } => {
            cmd_config(action, &path, &config)?;
        }
        // Handled before tracing init
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Log to stderr, or to a file while the dashboard owns the terminal.
fn init_tracing(cli: &Cli) {
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    #[cfg(feature = "tui")]
    if matches!(cli.command, Commands::Dashboard) {
        init_file_tracing(filter);
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Without a log file the dashboard runs unlogged; stderr would corrupt the screen.
#[cfg(feature = "tui")]
fn init_file_tracing(filter: EnvFilter) {
    use std::fs;
    use std::sync::Arc;

    let dir = config::data_dir();
    let file = fs::create_dir_all(&dir).and_then(|()| fs::File::create(dir.join("sensordash.log")));
    if let Ok(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .init();
    }
}
