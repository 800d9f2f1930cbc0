use std::time::Duration;

use super::client::{InferenceClient, PipelineId, PipelineRequest, WorkflowSettings};
use super::roboflow::RoboflowClient;
use super::synthetic::SyntheticClient;
use crate::error::{EscaprError, Result};
use crate::model::DetectionResult;
use crate::source::{validate_fps, FrameSource};

/// One camera bound to one workflow on the inference server.
///
/// Holds the server-side pipeline id while running. Dropping a running
/// pipeline terminates it.
pub struct InferencePipeline {
    client: Box<dyn InferenceClient>,
    source: FrameSource,
    workflow: WorkflowSettings,
    pipeline_id: Option<PipelineId>,
    running_fps: u32,
}

impl InferencePipeline {
    pub fn new(
        client: Box<dyn InferenceClient>,
        source: FrameSource,
        workflow: WorkflowSettings,
    ) -> Self {
        let running_fps = source.max_fps();
        Self {
            client,
            source,
            workflow,
            pipeline_id: None,
            running_fps,
        }
    }

    /// Picks the synthetic client for `stub://` sources and the HTTP client
    /// for everything else.
    pub fn connect(
        source: FrameSource,
        workflow: WorkflowSettings,
        api_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client: Box<dyn InferenceClient> = if source.is_stub() {
            Box::new(SyntheticClient::new())
        } else {
            Box::new(RoboflowClient::new(api_url, &workflow.api_key, timeout)?)
        };
        Ok(Self::new(client, source, workflow))
    }

    /// Starts the server pipeline, optionally at a different frame rate than
    /// the source's default.
    pub fn start(&mut self, max_fps: Option<u32>) -> Result<&PipelineId> {
        if self.pipeline_id.is_some() {
            return Err(EscaprError::PipelineAlreadyRunning);
        }
        let fps = max_fps.unwrap_or(self.source.max_fps());
        validate_fps(fps)?;

        let id = self.client.start(PipelineRequest {
            source: &self.source,
            max_fps: fps,
            workflow: &self.workflow,
        })?;
        log::info!(
            "{} pipeline {} started: source={} fps={} workflow={}/{}",
            self.client.name(),
            id,
            self.source.redacted_url(),
            fps,
            self.workflow.workspace_name,
            self.workflow.workflow_id
        );
        self.running_fps = fps;
        Ok(self.pipeline_id.insert(id))
    }

    pub fn pipeline_id(&self) -> Option<&PipelineId> {
        self.pipeline_id.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.pipeline_id.is_some()
    }

    /// Frame rate the pipeline was started with (the source default before
    /// the first start).
    pub fn running_fps(&self) -> u32 {
        self.running_fps
    }

    pub fn source(&self) -> &FrameSource {
        &self.source
    }

    pub fn workflow(&self) -> &WorkflowSettings {
        &self.workflow
    }

    pub fn next_result(&mut self) -> Result<Option<DetectionResult>> {
        let id = self
            .pipeline_id
            .as_ref()
            .ok_or(EscaprError::PipelineNotRunning)?;
        self.client.consume(id)
    }

    /// Terminates the server pipeline. Does nothing when not running.
    pub fn stop(&mut self) -> Result<()> {
        let Some(id) = self.pipeline_id.take() else {
            return Ok(());
        };
        self.client.terminate(&id)?;
        log::info!("{} pipeline {} stopped", self.client.name(), id);
        Ok(())
    }
}

impl Drop for InferencePipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("failed to stop inference pipeline: {}", e);
        }
    }
}
