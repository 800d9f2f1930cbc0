//! escapr - page responders when the camera sees an escaped ferret.
//!
//! This daemon:
//! 1. Starts a CLIP comparison pipeline on the inference server for the camera
//! 2. Consumes per-frame similarity results at the configured frame rate
//! 3. Pages PagerDuty once enough frames in a row look like the prompt
//! 4. Terminates the server pipeline on Ctrl-C

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use escapr::{
    AlertDispatcher, EscaprConfig, InferencePipeline, LogDispatcher, Monitor,
    PagerDutyDispatcher,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Watch an RTSP camera through an inference server and page on escapes"
)]
struct Args {
    /// Path to a JSON (or .toml) config file.
    #[arg(long, env = "ESCAPR_CONFIG")]
    config: Option<PathBuf>,

    /// Override the pipeline frame rate for this run.
    #[arg(long)]
    max_fps: Option<u32>,

    /// Log alerts instead of sending them to PagerDuty.
    #[arg(long, env = "ESCAPR_DRY_RUN")]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = EscaprConfig::load_from(args.config.as_deref())?;
    let dispatcher = build_dispatcher(&cfg, args.dry_run)?;

    let source = cfg.frame_source()?;
    let mut pipeline = InferencePipeline::connect(
        source,
        cfg.workflow(),
        &cfg.inference.api_url,
        cfg.inference.timeout,
    )?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("error setting Ctrl-C handler")?;

    log::info!("initializing {} detection...", cfg.detection.prompt);
    let pipeline_id = pipeline
        .start(args.max_fps)
        .context("failed to start inference pipeline")?
        .clone();
    log::info!(
        "starting {} detection on {}",
        cfg.detection.prompt,
        pipeline.source().redacted_url()
    );
    log::info!(
        "processing at {} fps with threshold {} ({} hits within {}s to page)",
        pipeline.running_fps(),
        cfg.detection.threshold,
        cfg.detection.required_hits,
        cfg.detection.window.as_secs()
    );
    log::info!("pipeline id: {}", pipeline_id);
    log::info!("press Ctrl-C to stop...");

    let mut monitor = Monitor::new(pipeline, dispatcher, cfg.monitor_settings())?;
    let outcome = monitor.run(&shutdown);

    log::info!("stopping {} detection...", cfg.detection.prompt);
    let stopped = monitor.pipeline_mut().stop();
    let stats = outcome?;
    stopped.context("failed to stop inference pipeline")?;
    log::info!(
        "shutdown complete: {} frames, {} hits, {} alerts",
        stats.frames,
        stats.hits,
        stats.alerts
    );
    Ok(())
}

fn build_dispatcher(cfg: &EscaprConfig, dry_run: bool) -> Result<Box<dyn AlertDispatcher>> {
    if dry_run {
        log::info!("dry run: alerts will be logged, not paged");
        return Ok(Box::new(LogDispatcher::new()));
    }
    match cfg.pagerduty.routing_key.as_deref() {
        Some(routing_key) => Ok(Box::new(PagerDutyDispatcher::new(
            routing_key,
            &cfg.pagerduty.events_url,
            cfg.inference.timeout,
        )?)),
        None => {
            log::warn!(
                "no PagerDuty routing key configured (PAGERDUTY_ROUTING_KEY); alerts will only be logged"
            );
            Ok(Box::new(LogDispatcher::new()))
        }
    }
}
