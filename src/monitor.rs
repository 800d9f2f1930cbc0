//! Poll loop: frame -> inference -> evaluate -> maybe alert.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::alert::{AlertDispatcher, DispatchReceipt};
use crate::error::Result;
use crate::evaluate::{evaluate, ConfidenceWindow, DEFAULT_REQUIRED_HITS, DEFAULT_WINDOW};
use crate::inference::InferencePipeline;
use crate::model::{AlertTemplate, DetectionResult};
use crate::source::frame_interval;

const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct MonitorSettings {
    pub threshold: f64,
    pub required_hits: u32,
    pub window: Duration,
    pub alert: AlertTemplate,
    pub stats_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            threshold: crate::inference::WorkflowSettings::default().threshold,
            required_hits: DEFAULT_REQUIRED_HITS,
            window: DEFAULT_WINDOW,
            alert: AlertTemplate::default(),
            stats_interval: DEFAULT_STATS_INTERVAL,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub polls: u64,
    pub frames: u64,
    pub hits: u64,
    pub alerts: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// The server had no result ready.
    Idle,
    /// `window_hits` is the hit count of the current window after this frame.
    Observed {
        result: DetectionResult,
        hit: bool,
        window_hits: u32,
    },
    Alerted {
        result: DetectionResult,
        receipt: DispatchReceipt,
    },
}

pub struct Monitor {
    pipeline: InferencePipeline,
    dispatcher: Box<dyn AlertDispatcher>,
    settings: MonitorSettings,
    window: ConfidenceWindow,
    frame_interval: Duration,
    stats: MonitorStats,
}

impl Monitor {
    /// The pipeline should already be started; its frame rate paces the loop
    /// and the confidence window.
    pub fn new(
        pipeline: InferencePipeline,
        dispatcher: Box<dyn AlertDispatcher>,
        settings: MonitorSettings,
    ) -> Result<Self> {
        let frame_interval = frame_interval(pipeline.running_fps());
        let window =
            ConfidenceWindow::new(settings.required_hits, settings.window, frame_interval)?;
        Ok(Self {
            pipeline,
            dispatcher,
            settings,
            window,
            frame_interval,
            stats: MonitorStats::default(),
        })
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn pipeline(&self) -> &InferencePipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut InferencePipeline {
        &mut self.pipeline
    }

    /// Consumes one result and acts on it.
    pub fn poll_once(&mut self) -> Result<PollOutcome> {
        self.stats.polls += 1;
        let Some(result) = self.pipeline.next_result()? else {
            return Ok(PollOutcome::Idle);
        };
        self.stats.frames += 1;

        let hit = evaluate(result.similarity(), self.settings.threshold);
        if hit != result.is_match() {
            log::debug!(
                "server match flag {} disagrees with local threshold {:.3} at similarity {:.3}",
                result.is_match(),
                self.settings.threshold,
                result.similarity()
            );
        }
        let fired = self.window.observe(hit);
        let window_hits = if fired {
            self.window.required_hits()
        } else {
            self.window.hits()
        };
        if hit {
            self.stats.hits += 1;
            log::warn!(
                "{} detected - similarity: {}% ({}/{})",
                self.pipeline.workflow().prompt,
                result.similarity_percent(),
                window_hits,
                self.window.required_hits()
            );
        } else {
            log::info!(
                "no {} detected - similarity: {}%",
                self.pipeline.workflow().prompt,
                result.similarity_percent()
            );
        }

        if !fired {
            return Ok(PollOutcome::Observed {
                result,
                hit,
                window_hits,
            });
        }

        let event = self.settings.alert.event(
            Utc::now(),
            result.similarity(),
            self.settings.threshold,
            &self.pipeline.workflow().prompt,
        );
        log::warn!("paging responders via {}..", self.dispatcher.name());
        let receipt = self.dispatcher.dispatch(&event)?;
        self.stats.alerts += 1;
        log::info!(
            "alert accepted: status={} dedup_key={}",
            receipt.status,
            receipt.dedup_key.as_deref().unwrap_or("-")
        );
        Ok(PollOutcome::Alerted { result, receipt })
    }

    /// Polls at the pipeline's frame rate until `shutdown` is set.
    ///
    /// Inference and delivery errors end the loop and are returned.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<MonitorStats> {
        let mut last_stats_log = Instant::now();
        while !shutdown.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            if let Err(e) = self.poll_once() {
                self.log_stats();
                return Err(e);
            }

            if last_stats_log.elapsed() >= self.settings.stats_interval {
                self.log_stats();
                last_stats_log = Instant::now();
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.frame_interval {
                std::thread::sleep(self.frame_interval - elapsed);
            }
        }
        self.log_stats();
        Ok(self.stats)
    }

    fn log_stats(&self) {
        log::info!(
            "monitor polls={} frames={} hits={} alerts={} pipeline={}",
            self.stats.polls,
            self.stats.frames,
            self.stats.hits,
            self.stats.alerts,
            self.pipeline
                .pipeline_id()
                .map(|id| id.as_str())
                .unwrap_or("-")
        );
    }
}
