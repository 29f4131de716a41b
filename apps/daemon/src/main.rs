mod cli;

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use quakelight_detector::{
    new_callback, CancellationToken, DetectionController, DetectorConfig, DetectorEvent,
    DetectorService,
};
use quakelight_replay::{ConsoleDisplay, ReplayRig, ReplayTrace};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn print_event(event: DetectorEvent) {
    match serde_json::to_string(&event) {
        Ok(json) => {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{json}");
            let _ = stdout.flush();
        }
        Err(e) => tracing::warn!(error = %e, "Failed to serialize detector event"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,quakelight=debug")),
        )
        .init();

    let config = DetectorConfig::load_or_default(cli.config.as_deref())
        .context("failed to load detector config")?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let Some(trace_path) = cli.trace else {
        anyhow::bail!("--trace is required");
    };
    let trace = ReplayTrace::load(&trace_path)
        .with_context(|| format!("failed to load trace {}", trace_path.display()))?;

    tracing::info!(
        poll_interval_ms = config.poll_interval_ms,
        inactivity_timeout_ms = config.inactivity_timeout_ms,
        "Starting QuakeLight"
    );

    let cancel = CancellationToken::new();
    let mut controller = DetectionController::new(
        ReplayRig::new(trace),
        ConsoleDisplay::new(Duration::from_millis(cli.flash_ms)),
        config.settings(),
        cancel.clone(),
    );
    if cli.json_events {
        controller = controller.with_callback(new_callback(print_event));
    }

    let service = DetectorService::spawn(controller)?;
    let mut worker = tokio::task::spawn_blocking(move || service.join());

    let joined = tokio::select! {
        joined = &mut worker => joined,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            tracing::info!("Shutdown requested");
            cancel.cancel();
            worker.await
        }
    };

    let completed = joined.context("detector thread could not be joined")??;
    tracing::info!(completed_cycles = completed, "QuakeLight stopped");
    Ok(())
}
