// Agora CLI entry point - dispatches the serve/render/bundle/config
// subcommands and wires up tracing for the process

use agora::app::App;
use agora::cli::{self, Cli, Commands};
use agora::config::{Config, LogRotation};
use agora::fetch::{FsFetcher, HttpFetcher, ResourceFetcher};
use agora::logging::{ComponentLogLayer, LogStore};
use agora::{bundle, server};
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config subcommand runs before anything else initializes
    if let Some(Commands::Config { show, reset, path }) = &cli.command {
        if cli::handle_config(*show, *reset, *path) {
            return Ok(());
        }
        eprintln!("Nothing to do; try --show, --reset or --path");
        return Ok(());
    }

    // Ensure a config template exists (helps users discover options)
    Config::ensure_config_exists();
    let config = Config::from_env();

    // Initialize tracing: stdout output plus the in-memory component
    // histories; optionally a rotating JSON file log
    //
    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("agora={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let logs = LogStore::new();

    // The guard must be kept alive for the duration of the program to
    // ensure file logs flush
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> = if config
        .logging
        .file_enabled
    {
        match std::fs::create_dir_all(&config.logging.file_dir) {
            Err(error) => {
                eprintln!(
                    "Warning: Could not create log directory {:?}: {}",
                    config.logging.file_dir, error
                );
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .with(ComponentLogLayer::new(logs.clone()))
                    .init();
                None
            }
            Ok(()) => {
                let file_appender = match config.logging.file_rotation {
                    LogRotation::Hourly => tracing_appender::rolling::hourly(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                    LogRotation::Daily => tracing_appender::rolling::daily(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                    LogRotation::Never => tracing_appender::rolling::never(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                };
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .with(ComponentLogLayer::new(logs.clone()))
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(non_blocking)
                            .with_ansi(false),
                    )
                    .init();
                Some(guard)
            }
        }
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(ComponentLogLayer::new(logs.clone()))
            .init();
        None
    };

    // Bare invocation serves the site
    let command = cli.command.unwrap_or(Commands::Serve {
        port: None,
        dir: None,
    });

    match command {
        Commands::Serve { port, dir } => {
            let mut addr = config.bind_addr;
            if let Some(port) = port {
                addr.set_port(port);
            }
            let root = dir.unwrap_or_else(|| config.site_dir.clone());

            // Graceful shutdown on Ctrl+C
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                let _ = shutdown_tx.send(());
            });

            server::start_server(root, addr, shutdown_rx).await?;
        }

        Commands::Render { dir, url } => {
            let fetcher: Arc<dyn ResourceFetcher> = match url {
                Some(base) => {
                    tracing::info!("Rendering site from {base}");
                    Arc::new(HttpFetcher::new(base)?)
                }
                None => {
                    let root = dir.unwrap_or_else(|| config.site_dir.clone());
                    tracing::info!("Rendering site from {:?}", root);
                    Arc::new(FsFetcher::new(root))
                }
            };

            let app = App::new(&config, fetcher);
            app.init().await;
            print_render_report(&app, &logs);
        }

        Commands::Bundle { mode } => {
            let report = bundle::run_bundle(&config.site_dir, mode.into())?;
            println!(
                "Build complete ({}): {} components, {} files, {} bytes of CSS",
                report.mode,
                report.components.len(),
                report.files_copied,
                report.css_bundle_bytes
            );
        }

        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Print the loading report for the render command
fn print_render_report(app: &App, logs: &LogStore) {
    let stats = app.loader.loading_stats();
    println!(
        "Components: {}/{} loaded, {} failed, {} pending ({:.1}% success)",
        stats.loaded,
        stats.total,
        stats.failed,
        stats.pending,
        stats.success_rate()
    );

    for name in app.loader.failed_components() {
        let detail = app
            .loader
            .component_record(&name)
            .and_then(|r| r.error)
            .unwrap_or_else(|| "unknown error".to_string());
        println!("  FAILED {name}: {detail}");
        for entry in logs.component_history("ComponentLoader") {
            if entry.message.contains(&name) {
                println!("    [{}] {}", entry.level.as_str(), entry.message);
            }
        }
    }

    let feedback = app.page.feedback();
    if !feedback.is_empty() {
        println!("User feedback:");
        for message in feedback {
            println!("  - {}", message.message);
        }
    }
}
