//! In-process pipeline for `stub://` sources.
//!
//! Produces a deterministic similarity sequence so the monitor loop can be
//! exercised end to end without an inference server. The scenario is picked
//! by the URL host:
//! - `stub://quiet`: an empty yard, similarity stays low
//! - `stub://escape`: empty for the first frames, then the animal appears
//! - anything else: the scene flips between empty and occupied every 50 frames

use super::client::{InferenceClient, PipelineId, PipelineRequest};
use crate::error::{EscaprError, Result};
use crate::evaluate::evaluate;
use crate::model::DetectionResult;

const EMPTY_SIMILARITY: f64 = 0.08;
const OCCUPIED_SIMILARITY: f64 = 0.24;
const ESCAPE_AFTER_FRAMES: u64 = 20;
const SCENE_PERIOD_FRAMES: u64 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scenario {
    Quiet,
    Escape,
    Patrol,
}

impl Scenario {
    fn from_host(host: &str) -> Self {
        match host {
            "quiet" => Scenario::Quiet,
            "escape" => Scenario::Escape,
            _ => Scenario::Patrol,
        }
    }

    fn occupied(&self, frame: u64) -> bool {
        match self {
            Scenario::Quiet => false,
            Scenario::Escape => frame > ESCAPE_AFTER_FRAMES,
            Scenario::Patrol => (frame / SCENE_PERIOD_FRAMES) % 2 == 1,
        }
    }
}

struct SyntheticPipeline {
    id: PipelineId,
    scenario: Scenario,
    threshold: f64,
    polls: u64,
    frames: u64,
}

#[derive(Default)]
pub struct SyntheticClient {
    started: u64,
    pipeline: Option<SyntheticPipeline>,
}

impl SyntheticClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames produced by the current pipeline.
    pub fn frames_served(&self) -> u64 {
        self.pipeline.as_ref().map(|p| p.frames).unwrap_or(0)
    }

    fn pipeline_mut(&mut self, id: &PipelineId) -> Result<&mut SyntheticPipeline> {
        match self.pipeline.as_mut() {
            Some(pipeline) if &pipeline.id == id => Ok(pipeline),
            _ => Err(EscaprError::Service(format!("unknown pipeline {}", id))),
        }
    }
}

impl InferenceClient for SyntheticClient {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn start(&mut self, request: PipelineRequest<'_>) -> Result<PipelineId> {
        if !request.source.is_stub() {
            return Err(EscaprError::Config(format!(
                "synthetic pipeline only serves stub:// sources, got {}",
                request.source.redacted_url()
            )));
        }
        self.started += 1;
        let id = PipelineId::new(format!("stub-{}", self.started));
        self.pipeline = Some(SyntheticPipeline {
            id: id.clone(),
            scenario: Scenario::from_host(request.source.host()),
            threshold: request.workflow.threshold,
            polls: 0,
            frames: 0,
        });
        log::info!(
            "synthetic pipeline {} started for {}",
            id,
            request.source.redacted_url()
        );
        Ok(id)
    }

    fn consume(&mut self, pipeline: &PipelineId) -> Result<Option<DetectionResult>> {
        let pipeline = self.pipeline_mut(pipeline)?;
        pipeline.polls += 1;
        // The first poll after start finds nothing, like a server still
        // opening the stream.
        if pipeline.polls == 1 {
            return Ok(None);
        }
        pipeline.frames += 1;

        let base = if pipeline.scenario.occupied(pipeline.frames) {
            OCCUPIED_SIMILARITY
        } else {
            EMPTY_SIMILARITY
        };
        let wobble = (pipeline.frames % 5) as f64 * 0.01;
        let similarity = base + wobble;
        DetectionResult::new(evaluate(similarity, pipeline.threshold), similarity).map(Some)
    }

    fn terminate(&mut self, pipeline: &PipelineId) -> Result<()> {
        self.pipeline_mut(pipeline)?;
        log::info!("synthetic pipeline {} terminated", pipeline);
        self.pipeline = None;
        Ok(())
    }
}
