use std::fmt;

use crate::error::Result;
use crate::model::DetectionResult;
use crate::source::FrameSource;

pub const DEFAULT_WORKSPACE_NAME: &str = "local";
pub const DEFAULT_WORKFLOW_ID: &str = "clip-frames";
pub const DEFAULT_PROMPT: &str = "ferret";
pub const DEFAULT_THRESHOLD: f64 = 0.16;

/// Server-side pipeline identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineId(String);

impl PipelineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which workflow the server runs and the parameters it receives.
#[derive(Clone, PartialEq)]
pub struct WorkflowSettings {
    pub workspace_name: String,
    pub workflow_id: String,
    pub prompt: String,
    pub threshold: f64,
    pub api_key: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            workspace_name: DEFAULT_WORKSPACE_NAME.to_string(),
            workflow_id: DEFAULT_WORKFLOW_ID.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            threshold: DEFAULT_THRESHOLD,
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for WorkflowSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowSettings")
            .field("workspace_name", &self.workspace_name)
            .field("workflow_id", &self.workflow_id)
            .field("prompt", &self.prompt)
            .field("threshold", &self.threshold)
            .field("api_key_set", &!self.api_key.is_empty())
            .finish()
    }
}

/// Everything a client needs to start one pipeline.
#[derive(Clone, Copy, Debug)]
pub struct PipelineRequest<'a> {
    pub source: &'a FrameSource,
    pub max_fps: u32,
    pub workflow: &'a WorkflowSettings,
}

/// Inference server seam.
///
/// Implementations report transport failures as `EscaprError::Network` and
/// bad statuses or malformed payloads as `EscaprError::Service`. They do not
/// retry.
pub trait InferenceClient: Send {
    /// Client identifier for logs.
    fn name(&self) -> &'static str;

    /// Starts a pipeline on the server and returns its id.
    fn start(&mut self, request: PipelineRequest<'_>) -> Result<PipelineId>;

    /// Pulls the next result. `None` means the server had nothing ready.
    fn consume(&mut self, pipeline: &PipelineId) -> Result<Option<DetectionResult>>;

    /// Tears the pipeline down on the server.
    fn terminate(&mut self, pipeline: &PipelineId) -> Result<()>;
}
