//! Fatigue Monitor
//!
//! Runs a tracking session against a synthetic landmark source and writes
//! each published snapshot as a JSON line.

use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use landmarks::{SourceConfig, SyntheticSource};
use oculometrics::EngineConfig;
use serde::{Deserialize, Serialize};
use session::{FatigueMonitor, SessionSummary};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Config file looked up when no path is given (extension inferred)
pub const DEFAULT_CONFIG_FILE: &str = "fatigue-monitor";

/// Environment variable prefix, e.g. `FATIGUE_ENGINE__WINDOW_SIZE=900`
pub const ENV_PREFIX: &str = "FATIGUE";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// trace, debug, info, warn, error
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    pub engine: EngineConfig,
    pub demo: DemoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            engine: EngineConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

/// Synthetic eye behaviour for the demo source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub fps: u32,
    /// Session length (seconds)
    pub duration_secs: u64,
    /// Frames between blink onsets
    pub blink_period_frames: u64,
    /// Frames each blink stays closed
    pub blink_frames: u64,
    /// After this many seconds closures last six times longer
    pub drowsy_after_secs: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            duration_secs: 30,
            blink_period_frames: 120,
            blink_frames: 5,
            drowsy_after_secs: Some(15),
        }
    }
}

impl DemoConfig {
    /// EAR script: open eyes with periodic closures
    pub fn ear_script(&self) -> impl Fn(u64) -> (f32, f32) + Send + Sync + 'static {
        let period = self.blink_period_frames.max(1);
        let closed = self.blink_frames;
        let drowsy_from = self
            .drowsy_after_secs
            .map(|secs| secs * self.fps as u64)
            .unwrap_or(u64::MAX);

        move |frame| {
            let closed_for = if frame >= drowsy_from { closed * 6 } else { closed };
            let ear = if frame % period < closed_for { 0.12 } else { 0.31 };
            (ear, ear + 0.01)
        }
    }
}

/// `FATIGUE_*` variables; nested keys split on `__`
fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration: defaults < optional file < `FATIGUE_*` environment
pub fn load_config(path: Option<&str>) -> anyhow::Result<AppConfig> {
    load_config_with(path, env_source())
}

fn load_config_with(path: Option<&str>, env: config::Environment) -> anyhow::Result<AppConfig> {
    let file = path.unwrap_or(DEFAULT_CONFIG_FILE);
    let settings = config::Config::builder()
        .add_source(config::File::with_name(file).required(path.is_some()))
        .add_source(env)
        .build()
        .with_context(|| format!("reading configuration from {}", file))?;

    let app: AppConfig = settings
        .try_deserialize()
        .context("parsing configuration")?;
    app.engine.validate().context("validating engine configuration")?;

    Ok(app)
}

/// Initialize logging
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let level = Level::from_str(level).with_context(|| format!("invalid log level '{}'", level))?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Run one demo session, writing each snapshot as a JSON line to `out`
pub async fn run_demo<W: Write>(app: &AppConfig, out: &mut W) -> anyhow::Result<SessionSummary> {
    let source = SyntheticSource::new(
        SourceConfig {
            fps: app.demo.fps,
            max_frames: None,
        },
        app.demo.ear_script(),
    );

    let mut monitor = FatigueMonitor::new(app.engine.clone(), source)?;
    monitor.start()?;
    let mut snapshots = monitor.subscribe();

    let deadline = tokio::time::sleep(Duration::from_secs(app.demo.duration_secs));
    tokio::pin!(deadline);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut interrupted => {
                info!("Interrupted, stopping session");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.is_fatigued() {
                    warn!(
                        "Fatigue {} (PERCLOS {:.1}%)",
                        snapshot.fatigue_level, snapshot.drowsiness_index
                    );
                }
                writeln!(out, "{}", serde_json::to_string(&snapshot)?)?;
            }
        }
    }

    monitor
        .stop()
        .context("session ended without a running tracker")
}
