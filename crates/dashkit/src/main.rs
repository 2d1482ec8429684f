// # dashkit - record reconciliation CLI
//
// A thin integration layer over dashkit-core. It:
// 1. Reads configuration from environment variables
// 2. Initializes tracing and the runtime
// 3. Creates the record provider through the registry
// 4. Prints the current/target pairing of every record and, when asked,
//    applies the resulting changes
//
// Matching, planning and retry logic all live in dashkit-core.
//
// ## Configuration
//
// - `DASHKIT_CONFIG`: Path to a JSON `ReconcileConfig` (required)
// - `DASHKIT_APPLY`: Set to `1` or `true` to apply the plans
// - `DASHKIT_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
//
// ## Example
//
// ```bash
// export DASHKIT_CONFIG=./records.json
// dashkit                  # show what would change
// DASHKIT_APPLY=1 dashkit  # change it
// ```

use anyhow::{Context, Result};
use dashkit_core::{ProviderRegistry, ReconcileConfig, ReconcileEvent, Reconciler};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration or startup error
/// - 2: Runtime error, including changes that failed to apply
#[derive(Debug, Clone, Copy)]
enum DashkitExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DashkitExitCode> for ExitCode {
    fn from(code: DashkitExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Settings read from the environment
struct Settings {
    config_path: PathBuf,
    apply: bool,
    log_level: String,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        let config_path = env::var("DASHKIT_CONFIG")
            .context("DASHKIT_CONFIG is required. Set it via: export DASHKIT_CONFIG=./records.json")?;

        Ok(Self {
            config_path: PathBuf::from(config_path),
            apply: env::var("DASHKIT_APPLY")
                .map(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_level: env::var("DASHKIT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("DASHKIT_CONFIG cannot be empty");
        }

        if !self.config_path.is_file() {
            anyhow::bail!(
                "DASHKIT_CONFIG does not point to a file: {}",
                self.config_path.display()
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DASHKIT_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DashkitExitCode::ConfigError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DashkitExitCode::ConfigError.into();
    }

    let level = settings.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DashkitExitCode::ConfigError.into();
    }

    let mut config = match ReconcileConfig::from_file(&settings.config_path)
        .and_then(|config| config.validate().map(|()| config))
    {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid config {}: {}", settings.config_path.display(), e);
            return DashkitExitCode::ConfigError.into();
        }
    };
    config.engine.dry_run = config.engine.dry_run || !settings.apply;

    info!(
        "Loaded {} record(s) from {}",
        config.records.len(),
        settings.config_path.display()
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DashkitExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(true) => DashkitExitCode::Success,
            Ok(false) => DashkitExitCode::RuntimeError,
            Err(e) => {
                error!("Reconciliation error: {:#}", e);
                DashkitExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Print every plan and reconcile; returns whether all changes succeeded
async fn run(config: ReconcileConfig) -> Result<bool> {
    let registry = ProviderRegistry::with_builtin();
    let provider = registry
        .create_provider(&config.provider)
        .with_context(|| format!("creating provider '{}'", config.provider.type_name()))?;

    let dry_run = config.engine.dry_run;
    let (reconciler, mut events) = Reconciler::new(provider, config)?;

    for record in reconciler.records() {
        if let Some(reason) = reconciler.skip_reason(record) {
            println!("{}  (skipped: {})", record.key(), reason);
            println!();
            continue;
        }

        let plan = reconciler.plan(record).await?;
        println!("{}  ({})", plan.record, plan.summary());
        println!("  {:<40} {}", "CURRENT", "UPDATE TO");
        for pairing in plan.pairings() {
            let [current, update_to] = pairing.as_row();
            println!("  {:<40} {}", current, update_to);
        }
        println!();
    }

    if dry_run {
        info!("Dry run, set DASHKIT_APPLY=1 to apply these changes");
        return Ok(true);
    }

    let report = reconciler.reconcile_all().await;
    drop(reconciler);

    while let Some(event) = events.recv().await {
        if let ReconcileEvent::ChangeFailed {
            record,
            change,
            error,
            retry_count,
        } = event
        {
            warn!(
                "Gave up on {} for {} after {} retries: {}",
                change, record, retry_count, error
            );
        }
    }

    println!(
        "Applied {} change(s), {} failure(s)",
        report.applied(),
        report.failed()
    );
    Ok(report.is_success())
}
