//! JSON bodies of the inference server's pipeline API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::{PipelineId, PipelineRequest};
use crate::error::{EscaprError, Result};
use crate::model::DetectionResult;

const RESULTS_BUFFER_SIZE: usize = 64;
const IMAGE_INPUT_NAME: &str = "image";

#[derive(Debug, Serialize)]
pub(crate) struct InitialisePipelineRequest<'a> {
    pub api_key: &'a str,
    pub video_configuration: VideoConfiguration<'a>,
    pub processing_configuration: WorkflowConfiguration<'a>,
    pub sink_configuration: MemorySinkConfiguration,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoConfiguration<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub video_reference: Vec<&'a str>,
    pub max_fps: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct WorkflowConfiguration<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub workspace_name: &'a str,
    pub workflow_id: &'a str,
    pub image_input_name: &'static str,
    pub workflows_parameters: WorkflowParameters<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WorkflowParameters<'a> {
    pub prompt: &'a str,
    pub threshold: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct MemorySinkConfiguration {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub results_buffer_size: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiKeyRequest<'a> {
    pub api_key: &'a str,
}

impl<'a> InitialisePipelineRequest<'a> {
    pub fn from_request(request: &PipelineRequest<'a>) -> Self {
        Self {
            api_key: &request.workflow.api_key,
            video_configuration: VideoConfiguration {
                kind: "VideoConfiguration",
                video_reference: vec![request.source.video_reference()],
                max_fps: request.max_fps,
            },
            processing_configuration: WorkflowConfiguration {
                kind: "WorkflowConfiguration",
                workspace_name: &request.workflow.workspace_name,
                workflow_id: &request.workflow.workflow_id,
                image_input_name: IMAGE_INPUT_NAME,
                workflows_parameters: WorkflowParameters {
                    prompt: &request.workflow.prompt,
                    threshold: request.workflow.threshold,
                },
            },
            sink_configuration: MemorySinkConfiguration {
                kind: "MemorySinkConfiguration",
                results_buffer_size: RESULTS_BUFFER_SIZE,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    #[serde(default)]
    context: Option<PipelineContext>,
}

#[derive(Debug, Deserialize)]
struct PipelineContext {
    #[serde(default)]
    pipeline_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConsumeResponse {
    #[serde(default)]
    outputs: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct WorkflowOutput {
    #[serde(default)]
    is_match: Option<bool>,
    similarity: Option<f64>,
}

/// Extracts `context.pipeline_id` from an initialise response body.
pub(crate) fn parse_pipeline_id(body: &str) -> Result<PipelineId> {
    let response: PipelineResponse = serde_json::from_str(body)
        .map_err(|e| EscaprError::Service(format!("malformed initialise response: {}", e)))?;
    response
        .context
        .and_then(|context| context.pipeline_id)
        .filter(|id| !id.trim().is_empty())
        .map(PipelineId::new)
        .ok_or_else(|| {
            EscaprError::Service("initialise response carries no pipeline_id".to_string())
        })
}

/// Reads the first workflow output of a consume response body.
///
/// A missing, null or empty `outputs` list, or a null/empty first output,
/// means the server had no frame ready.
pub(crate) fn parse_consume_body(body: &str) -> Result<Option<DetectionResult>> {
    let response: ConsumeResponse = serde_json::from_str(body)
        .map_err(|e| EscaprError::Service(format!("malformed consume response: {}", e)))?;
    let Some(first) = response.outputs.unwrap_or_default().into_iter().next() else {
        return Ok(None);
    };
    match &first {
        Value::Null => return Ok(None),
        Value::Object(map) if map.is_empty() => return Ok(None),
        Value::Object(_) => {}
        other => {
            return Err(EscaprError::Service(format!(
                "workflow output is not an object: {}",
                other
            )))
        }
    }
    let output: WorkflowOutput = serde_json::from_value(first)
        .map_err(|e| EscaprError::Service(format!("malformed workflow output: {}", e)))?;
    let similarity = output
        .similarity
        .ok_or_else(|| EscaprError::Service("workflow output has no similarity".to_string()))?;
    DetectionResult::new(output.is_match.unwrap_or(false), similarity).map(Some)
}
