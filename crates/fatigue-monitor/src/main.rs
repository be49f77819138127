//! Fatigue Monitor - Main Entry Point

use fatigue_monitor::{init_logging, load_config, run_demo};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let app = load_config(config_path.as_deref())?;
    init_logging(&app.log_level, app.log_json)?;

    info!("=== Fatigue Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Tracking for {}s at {} fps (close={}, open={}, window={} frames)",
        app.demo.duration_secs,
        app.demo.fps,
        app.engine.ear_threshold,
        app.engine.ear_open_threshold,
        app.engine.window_size
    );

    let mut stdout = std::io::stdout().lock();
    let summary = run_demo(&app, &mut stdout).await?;
    info!(
        "Session summary: {}",
        serde_json::to_string(&summary)?
    );

    Ok(())
}
