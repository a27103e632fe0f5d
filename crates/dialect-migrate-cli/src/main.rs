//! dialect-migrate CLI - translate and apply canonical SQL migration scripts.

use clap::{Parser, Subcommand};
use dialect_migrate::{script, Config, Converter, MigrateError, Orchestrator, RuleTable, Vendor};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "dialect-migrate")]
#[command(about = "Translate canonical SQL migration scripts to other vendors and apply them")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Print progress updates as JSON lines to stderr
    #[arg(long)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a canonical script to a target dialect
    Convert {
        /// Script written in the canonical (Oracle) dialect
        #[arg(short, long)]
        script: PathBuf,

        /// Target vendor (default: target.type from the config file)
        #[arg(short, long)]
        target: Option<Vendor>,

        /// Write the translated script here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a script into statements without translating it
    Split {
        /// Script to split
        #[arg(short, long)]
        script: PathBuf,
    },

    /// Show the translation rules for a vendor
    Rules {
        /// Vendor to show rules for
        #[arg(short, long)]
        target: Vendor,
    },

    /// Translate a script and apply it to the configured target
    Run {
        /// Script to apply (default: migration.script from the config file)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Keep going after a rejected statement
        #[arg(long)]
        continue_on_error: bool,

        /// Dry run: translate and split without connecting
        #[arg(long)]
        dry_run: bool,
    },

    /// Test the target database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    match cli.command {
        Commands::Convert {
            script,
            target,
            output,
        } => {
            let source = std::fs::read_to_string(&script)?;

            // An explicit target needs no config file
            let (vendor, translated) = match target {
                Some(vendor) => (vendor, Converter::default().convert_script(&source, vendor)?),
                None => {
                    let orchestrator = Orchestrator::new(load_config(&cli.config)?)?;
                    let vendor = orchestrator.config().target.r#type;
                    (vendor, orchestrator.convert(&source)?)
                }
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, &translated)?;
                    info!("Wrote {} script to {:?}", vendor, path);
                }
                None if cli.output_json => {
                    let json = serde_json::json!({
                        "target": vendor,
                        "script": translated,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                None => println!("{}", translated),
            }
        }

        Commands::Split { script: path } => {
            let source = std::fs::read_to_string(&path)?;
            let statements = script::split(&source);

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&statements)?);
            } else {
                for (i, statement) in statements.iter().enumerate() {
                    println!("-- [{}]\n{};\n", i + 1, statement);
                }
            }
        }

        Commands::Rules { target } => {
            let rules = RuleTable::builtin().rules_for(target);

            if cli.output_json {
                let json: Vec<_> = rules
                    .iter()
                    .map(|(kind, rule)| {
                        serde_json::json!({
                            "construct": kind.label(),
                            "rule": rule.to_string(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else if target.is_canonical() {
                println!("{} is the canonical dialect; scripts pass through unchanged", target);
            } else {
                println!("Translation rules for {}:", target);
                for (kind, rule) in rules {
                    println!("  {:<32} {}", kind.label(), rule);
                }
            }
        }

        Commands::Run {
            script,
            continue_on_error,
            dry_run,
        } => {
            let mut config = load_config(&cli.config)?;

            // Apply overrides
            if continue_on_error {
                config.migration.stop_on_error = false;
            }

            // Setup signal handling for graceful shutdown (SIGINT and SIGTERM)
            let cancel_token = setup_signal_handler().await?;

            let orchestrator = Orchestrator::new(config)?.with_progress(cli.progress);
            let source = orchestrator.load_script(script.as_deref())?;

            let result = orchestrator.run(&source, cancel_token, dry_run).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                let status_msg = match result.status.as_str() {
                    "dry_run" => "Dry run completed!",
                    "completed" => "Migration completed!",
                    "cancelled" => "Migration cancelled.",
                    _ => "Migration finished with errors.",
                };
                println!("\n{}", status_msg);
                println!("  Run ID: {}", result.run_id);
                println!("  Target: {}", result.vendor);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!(
                    "  Statements: {}/{} applied, {} failed, {} not attempted",
                    result.statements_succeeded,
                    result.statements_total,
                    result.statements_failed,
                    result.statements_not_attempted
                );
                for failure in &result.failures {
                    println!("  Failed statement {}: {}", failure.position, failure.error);
                }
            }

            if let Some(err) = result.error() {
                return Err(err);
            }
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(load_config(&cli.config)?)?;
            let result = orchestrator.health_check().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Target ({}): {} ({}ms)",
                    result.target,
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::connection(
                    result.error.unwrap_or_default(),
                    "health check",
                ));
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<Config, MigrateError> {
    let config = Config::load(path)?;
    info!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Logs go to stderr so stdout stays clean for scripts and JSON.
fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}': use text or json", other)),
    }

    Ok(())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM (Kubernetes/Airflow shutdown).
/// The running statement finishes; nothing after it starts.
#[cfg(unix)]
async fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = cancel_token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        eprintln!("\nReceived {}. Stopping after the current statement...", name);
        token.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only SIGINT/Ctrl-C)
#[cfg(not(unix))]
async fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Stopping after the current statement...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
