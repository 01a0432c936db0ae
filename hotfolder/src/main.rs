use anyhow::Context;
use clap::Parser;
use hotfolder::cli::list_printers_command;
use hotfolder::{Cli, WatchConfig, Watcher, init_logger, print_banner, shutdown_signal};
use hotfolder_printer::{PrintDispatcher, PrintMethod, locate_viewer, log_available_printers, resolve};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    print_banner();

    // Flushes the log file when dropped
    let _log_guard = match init_logger(&cli.log_level, &cli.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.list_printers {
        return list_printers_command().await;
    }

    match run(&cli).await {
        Ok(()) => {
            tracing::info!("Stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = WatchConfig::load(&cli.config)?;
    config.log_summary();

    if config.print_method == PrintMethod::Acrobat
        && let Err(e) = locate_viewer(config.viewer_options().executable.as_deref())
    {
        tracing::warn!(
            error = %e,
            "Set \"acrobat_path\" in the config or use \"print_method\": \"shellexecute\""
        );
    }

    let printer = match resolve(config.printer()).await {
        Ok(printer) => printer,
        Err(e) => {
            log_available_printers().await;
            return Err(e).context("No usable printer");
        }
    };

    let dispatcher = PrintDispatcher::new(config.print_method, printer, config.viewer_options());

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    tracing::info!("Press Ctrl+C to stop...");
    Watcher::new(config, dispatcher).run(shutdown).await;
    Ok(())
}
