//! Watch command implementation

use crate::cli::mode::preferences_path;
use crate::cli::output;
use crate::cli::WatchArgs;
use crate::client::TelemetryClient;
use crate::config::{LogFormat, ObservatoryConfig};
use crate::preferences::{DataSource, FilePreferences};
use crate::stream::origin_host;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load a config file if it exists, otherwise defaults.
pub fn load_config_file(path: &Path) -> Result<ObservatoryConfig, Box<dyn std::error::Error>> {
    if path.exists() {
        Ok(ObservatoryConfig::load(Some(path))?)
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        Ok(ObservatoryConfig::default())
    }
}

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &WatchArgs,
) -> Result<ObservatoryConfig, Box<dyn std::error::Error>> {
    let mut config = load_config_file(&args.config)?;

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(ref url) = args.url {
        config.stream.url = Some(url.clone());
    }
    if let Some(ref host) = args.host {
        config.stream.host = host.clone();
    }
    if let Some(ref origin) = args.origin {
        let (host, secure) = origin_host(origin)?;
        config.stream.host = host;
        config.stream.secure = secure;
    }
    if args.secure {
        config.stream.secure = true;
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Source requested on the command line, if any.
pub fn explicit_source(args: &WatchArgs) -> Option<DataSource> {
    if args.synthetic {
        Some(DataSource::Synthetic)
    } else if args.live {
        Some(DataSource::Live)
    } else {
        None
    }
}

/// Initialize tracing based on configuration
///
/// Logs go to stderr so stdout stays clean for `--json` output.
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main watch command handler
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let config = load_config_with_overrides(&args)?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;
    tracing::debug!(?config, "Loaded configuration");

    // 3. Pick the data source; the endpoint only matters for live data
    let store = FilePreferences::new(preferences_path(args.prefs.as_deref(), &config));
    let source = DataSource::resolve(explicit_source(&args), &store, &config);
    config.validate_for(source)?;
    tracing::info!(source = %source, "Starting observatory");

    // 4. Start the client
    let (client, handle) = TelemetryClient::from_config(&config, source)?;
    let client_task = client.spawn();

    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let synthetic = source.is_synthetic();
    let mut status = handle.status();
    let mut view = handle.view();
    let mut printed: u64 = 0;

    if !args.json {
        eprintln!(
            "{}",
            output::format_status_line(&status.borrow(), synthetic, handle.endpoint())
        );
    }

    // 5. Print until interrupted or the requested count is reached
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                if !args.json {
                    eprintln!("{}", output::format_status_line(&current, synthetic, handle.endpoint()));
                }
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = view.borrow_and_update().clone();
                if args.json {
                    println!("{}", output::format_view_json(&current, &handle.current_status()));
                } else if args.table {
                    if let Some(snapshot) = current.latest.as_deref() {
                        println!("{}", output::format_fleet_table(snapshot));
                        if let Some(processes) = output::format_process_table(snapshot) {
                            println!("{}", processes);
                        }
                    }
                    println!("{}", output::format_summary(&current));
                } else {
                    println!("{}", output::format_summary(&current));
                }

                printed += 1;
                if args.count.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
        }
    }

    // 6. Graceful shutdown
    handle.shutdown();
    client_task.await?;

    tracing::info!(snapshots = printed, "Observatory stopped");
    Ok(())
}
