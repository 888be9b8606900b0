//! nopd - The NopResource provider daemon
//!
//! This is the main entry point for the nopd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Reconciler with the simulated NopResource connector
//! - Poll loop and signal handling

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use nop_config::{load_config, Policy};
use nop_core::{CoreEvent, NopConnector, Reconciler};
use nop_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use nop_util::{default_config_path, parse_duration_text};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// nopd - Simulated managed resources whose conditions follow their age
#[derive(Parser, Debug)]
#[command(name = "nopd")]
#[command(about = "Simulated managed resources whose conditions follow their age", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/nopd/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set NOPD_DATA_DIR env var)
    #[arg(short, long, env = "NOPD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Poll interval override, e.g. "500ms" or "2s"
    #[arg(short, long, value_parser = parse_poll_interval)]
    poll_interval: Option<Duration>,

    /// Reconcile once, print resource status as JSON and exit
    #[arg(long)]
    once: bool,
}

fn parse_poll_interval(s: &str) -> std::result::Result<Duration, String> {
    match parse_duration_text(s) {
        Ok(d) if d.is_zero() => Err("poll interval must be greater than zero".into()),
        Ok(d) => Ok(d),
        Err(e) => Err(e.to_string()),
    }
}

/// Main service state
struct Service {
    reconciler: Reconciler,
    store: Arc<dyn Store>,
    config_path: PathBuf,
    poll_interval: Duration,
    poll_override: Option<Duration>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let policy = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            resource_count = policy.resources.len(),
            "Configuration loaded"
        );

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| policy.daemon.data_dir.clone());

        // Create data directory
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join("nopd.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        // Log service start
        store.append_audit(AuditEvent::new(AuditEventType::ProviderStarted))?;

        // Initialize reconciler and register declared resources
        let mut reconciler = Reconciler::new(Arc::new(NopConnector), store.clone());
        for event in reconciler.reload(&policy, nop_util::now()) {
            handle_core_event(&event);
        }

        let poll_interval = args.poll_interval.unwrap_or(policy.daemon.poll_interval);

        Ok(Self {
            reconciler,
            store,
            config_path: args.config.clone(),
            poll_interval,
            poll_override: args.poll_interval,
        })
    }

    /// Run a single reconcile pass and print the resulting status
    fn run_once(mut self) -> Result<()> {
        let now = nop_util::now();
        for event in self.reconciler.tick(now) {
            handle_core_event(&event);
        }

        let snapshot = self.reconciler.snapshot(now);
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize status")?
        );

        self.record_stop();
        Ok(())
    }

    async fn run(self) -> Result<()> {
        let reconciler = Arc::new(Mutex::new(self.reconciler));
        let store = self.store.clone();
        let config_path = self.config_path.clone();
        let poll_override = self.poll_override;
        let mut poll_interval = self.poll_interval;

        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        let mut poll_timer = make_timer(poll_interval);

        info!(poll_interval = ?poll_interval, "Service running");

        loop {
            tokio::select! {
                // Signal: SIGTERM or SIGINT - graceful shutdown
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // Signal: SIGHUP - reload configuration
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    let Some(policy) = reload_policy(&config_path) else {
                        continue;
                    };

                    let events = {
                        let mut reconciler = reconciler.lock().await;
                        reconciler.reload(&policy, nop_util::now())
                    };
                    for event in &events {
                        handle_core_event(event);
                    }

                    let wanted = poll_override.unwrap_or(policy.daemon.poll_interval);
                    if wanted != poll_interval {
                        info!(old = ?poll_interval, new = ?wanted, "Poll interval changed");
                        poll_interval = wanted;
                        poll_timer = make_timer(poll_interval);
                    }
                }

                // Poll timer - reconcile every resource
                _ = poll_timer.tick() => {
                    let now = nop_util::now();

                    let events = {
                        let mut reconciler = reconciler.lock().await;
                        reconciler.tick(now)
                    };

                    for event in &events {
                        handle_core_event(event);
                    }
                    log_tick(&reconciler, now).await;
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down nopd");

        if let Err(e) = store.append_audit(AuditEvent::new(AuditEventType::ProviderStopped)) {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }

    fn record_stop(&self) {
        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ProviderStopped))
        {
            warn!(error = %e, "Failed to log service shutdown");
        }
    }
}

fn make_timer(period: Duration) -> tokio::time::Interval {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

/// Load the config for a reload; a broken file keeps the current policy
fn reload_policy(path: &Path) -> Option<Policy> {
    match load_config(path) {
        Ok(policy) => Some(policy),
        Err(e) => {
            warn!(
                config_path = %path.display(),
                error = %e,
                "Failed to reload config, keeping current policy"
            );
            None
        }
    }
}

async fn log_tick(reconciler: &Arc<Mutex<Reconciler>>, now: DateTime<Utc>) {
    let reconciler = reconciler.lock().await;
    for view in reconciler.snapshot(now) {
        debug!(
            resource = %view.name,
            lifecycle = ?view.lifecycle,
            age = %nop_util::format_duration(view.age),
            next_transition = ?view.next_transition,
            conditions = ?view.status.conditions.summary(),
            "Resource polled"
        );
    }
}

fn handle_core_event(event: &CoreEvent) {
    match event {
        CoreEvent::ReconcileFailed { name, error } => {
            warn!(resource = %name, error = %error, "Resource will be retried on next poll");
        }
        CoreEvent::PolicyReloaded { resource_count } => {
            info!(resource_count, "Policy reloaded");
        }
        other => {
            debug!(event = ?other, "Core event");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "nopd starting"
    );

    if nop_util::is_mock_time_active() {
        warn!(
            now = %nop_util::format_datetime_full(&nop_util::now()),
            "Mock time is active, resource ages follow {}",
            nop_util::MOCK_TIME_ENV_VAR
        );
    }

    // Create and run the service
    let service = Service::new(&args)?;
    if args.once {
        return service.run_once();
    }
    service.run().await
}
