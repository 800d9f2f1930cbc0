//! HTTP client for the inference server's pipeline API.

use std::time::Duration;

use super::client::{InferenceClient, PipelineId, PipelineRequest};
use super::wire::{self, ApiKeyRequest, InitialisePipelineRequest};
use crate::error::{EscaprError, Result};
use crate::model::DetectionResult;

pub const DEFAULT_API_URL: &str = "http://localhost:9001";

pub struct RoboflowClient {
    agent: ureq::Agent,
    api_url: String,
    api_key: String,
}

impl RoboflowClient {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let api_url = api_url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&api_url)
            .map_err(|e| EscaprError::Config(format!("invalid inference api url: {}", e)))?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            agent,
            api_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn pipeline_url(&self, pipeline: &PipelineId, action: &str) -> String {
        format!(
            "{}/inference_pipelines/{}/{}",
            self.api_url,
            pipeline.as_str(),
            action
        )
    }
}

impl InferenceClient for RoboflowClient {
    fn name(&self) -> &'static str {
        "roboflow"
    }

    fn start(&mut self, request: PipelineRequest<'_>) -> Result<PipelineId> {
        let url = format!("{}/inference_pipelines/initialise", self.api_url);
        let body = InitialisePipelineRequest::from_request(&request);
        let response = self
            .agent
            .post(&url)
            .send_json(&body)
            .map_err(|e| map_ureq_error("start pipeline", e))?;
        let body = read_body("start pipeline", response)?;
        wire::parse_pipeline_id(&body)
    }

    fn consume(&mut self, pipeline: &PipelineId) -> Result<Option<DetectionResult>> {
        let response = self
            .agent
            .get(&self.pipeline_url(pipeline, "consume"))
            .send_json(ApiKeyRequest {
                api_key: &self.api_key,
            })
            .map_err(|e| map_ureq_error("consume pipeline result", e))?;
        let body = read_body("consume pipeline result", response)?;
        wire::parse_consume_body(&body)
    }

    fn terminate(&mut self, pipeline: &PipelineId) -> Result<()> {
        self.agent
            .post(&self.pipeline_url(pipeline, "terminate"))
            .send_json(ApiKeyRequest {
                api_key: &self.api_key,
            })
            .map_err(|e| map_ureq_error("terminate pipeline", e))?;
        Ok(())
    }
}

fn read_body(action: &str, response: ureq::Response) -> Result<String> {
    response
        .into_string()
        .map_err(|e| EscaprError::Network(format!("{}: read response body: {}", action, e)))
}

fn map_ureq_error(action: &str, err: ureq::Error) -> EscaprError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            EscaprError::Service(format!(
                "{}: server returned {}: {}",
                action,
                code,
                body.trim()
            ))
        }
        ureq::Error::Transport(transport) => {
            EscaprError::Network(format!("{}: {}", action, transport))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_base_url() {
        let client =
            RoboflowClient::new("http://localhost:9001/", "", Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_url(), "http://localhost:9001");
        assert_eq!(
            client.pipeline_url(&PipelineId::new("p-7"), "consume"),
            "http://localhost:9001/inference_pipelines/p-7/consume"
        );
    }

    #[test]
    fn rejects_garbage_base_url() {
        assert!(matches!(
            RoboflowClient::new("localhost 9001", "", Duration::from_secs(1)),
            Err(EscaprError::Config(_))
        ));
    }
}
