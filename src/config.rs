use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::alert::DEFAULT_EVENTS_URL;
use crate::evaluate::{DEFAULT_REQUIRED_HITS, DEFAULT_WINDOW};
use crate::inference::{WorkflowSettings, DEFAULT_API_URL};
use crate::model::{AlertTemplate, Severity};
use crate::monitor::MonitorSettings;
use crate::source::FrameSource;

const DEFAULT_MAX_FPS: u32 = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Default)]
struct EscaprConfigFile {
    rtsp: Option<RtspConfigFile>,
    inference: Option<InferenceConfigFile>,
    detection: Option<DetectionConfigFile>,
    pagerduty: Option<PagerDutyConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct RtspConfigFile {
    url: Option<String>,
    max_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct InferenceConfigFile {
    api_url: Option<String>,
    workspace_name: Option<String>,
    workflow_id: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    prompt: Option<String>,
    threshold: Option<f64>,
    required_hits: Option<u32>,
    window_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct PagerDutyConfigFile {
    routing_key: Option<String>,
    events_url: Option<String>,
    summary: Option<String>,
    source: Option<String>,
    severity: Option<Severity>,
}

#[derive(Debug, Clone)]
pub struct EscaprConfig {
    pub rtsp: RtspSettings,
    pub inference: InferenceSettings,
    pub detection: DetectionSettings,
    pub pagerduty: PagerDutySettings,
}

#[derive(Clone)]
pub struct RtspSettings {
    pub url: String,
    pub max_fps: u32,
}

#[derive(Clone)]
pub struct InferenceSettings {
    pub api_url: String,
    pub workspace_name: String,
    pub workflow_id: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub prompt: String,
    pub threshold: f64,
    pub required_hits: u32,
    pub window: Duration,
}

#[derive(Clone)]
pub struct PagerDutySettings {
    pub routing_key: Option<String>,
    pub events_url: String,
    pub alert: AlertTemplate,
}

impl std::fmt::Debug for RtspSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let url = FrameSource::new(&self.url, self.max_fps)
            .map(|source| source.redacted_url())
            .unwrap_or_else(|_| "<invalid>".to_string());
        f.debug_struct("RtspSettings")
            .field("url", &url)
            .field("max_fps", &self.max_fps)
            .finish()
    }
}

impl std::fmt::Debug for InferenceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceSettings")
            .field("api_url", &self.api_url)
            .field("workspace_name", &self.workspace_name)
            .field("workflow_id", &self.workflow_id)
            .field("api_key_set", &!self.api_key.is_empty())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl std::fmt::Debug for PagerDutySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagerDutySettings")
            .field("routing_key_set", &self.routing_key.is_some())
            .field("events_url", &self.events_url)
            .field("alert", &self.alert)
            .finish()
    }
}

impl EscaprConfig {
    /// Loads `ESCAPR_CONFIG` (if set), then applies environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ESCAPR_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: EscaprConfigFile) -> Self {
        let rtsp = file.rtsp.unwrap_or_default();
        let inference = file.inference.unwrap_or_default();
        let detection = file.detection.unwrap_or_default();
        let pagerduty = file.pagerduty.unwrap_or_default();
        let alert_defaults = AlertTemplate::default();
        let workflow_defaults = WorkflowSettings::default();

        Self {
            rtsp: RtspSettings {
                url: rtsp.url.unwrap_or_default(),
                max_fps: rtsp.max_fps.unwrap_or(DEFAULT_MAX_FPS),
            },
            inference: InferenceSettings {
                api_url: inference
                    .api_url
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                workspace_name: inference
                    .workspace_name
                    .unwrap_or(workflow_defaults.workspace_name),
                workflow_id: inference
                    .workflow_id
                    .unwrap_or(workflow_defaults.workflow_id),
                api_key: inference.api_key.unwrap_or_default(),
                timeout: Duration::from_secs(
                    inference.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                ),
            },
            detection: DetectionSettings {
                prompt: detection.prompt.unwrap_or(workflow_defaults.prompt),
                threshold: detection.threshold.unwrap_or(workflow_defaults.threshold),
                required_hits: detection.required_hits.unwrap_or(DEFAULT_REQUIRED_HITS),
                window: detection
                    .window_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_WINDOW),
            },
            pagerduty: PagerDutySettings {
                routing_key: pagerduty.routing_key.filter(|key| !key.trim().is_empty()),
                events_url: pagerduty
                    .events_url
                    .unwrap_or_else(|| DEFAULT_EVENTS_URL.to_string()),
                alert: AlertTemplate {
                    summary: pagerduty.summary.unwrap_or(alert_defaults.summary),
                    source: pagerduty.source.unwrap_or(alert_defaults.source),
                    severity: pagerduty.severity.unwrap_or(alert_defaults.severity),
                },
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = non_empty_env("ESCAPR_RTSP_URL") {
            self.rtsp.url = url;
        }
        if let Some(api_url) = non_empty_env("ESCAPR_API_URL") {
            self.inference.api_url = api_url;
        }
        if let Some(api_key) = non_empty_env("ESCAPR_API_KEY") {
            self.inference.api_key = api_key;
        }
        if let Some(prompt) = non_empty_env("ESCAPR_PROMPT") {
            self.detection.prompt = prompt;
        }
        if let Some(fps) = non_empty_env("ESCAPR_MAX_FPS") {
            self.rtsp.max_fps = fps
                .trim()
                .parse()
                .map_err(|_| anyhow!("ESCAPR_MAX_FPS must be a whole number of frames"))?;
        }
        if let Some(threshold) = non_empty_env("ESCAPR_THRESHOLD") {
            self.detection.threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("ESCAPR_THRESHOLD must be a number between 0.0 and 1.0"))?;
        }
        if let Some(key) = non_empty_env("PAGERDUTY_ROUTING_KEY") {
            self.pagerduty.routing_key = Some(key);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.rtsp.url.trim().is_empty() {
            return Err(anyhow!(
                "RTSP URL cannot be empty; set rtsp.url or ESCAPR_RTSP_URL"
            ));
        }
        self.frame_source().context("invalid rtsp settings")?;

        let threshold = self.detection.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!("threshold must be between 0.0 and 1.0"));
        }
        if self.detection.prompt.trim().is_empty() {
            return Err(anyhow!("prompt cannot be empty"));
        }
        if self.detection.required_hits == 0 {
            return Err(anyhow!("required_hits must be at least 1"));
        }
        if self.detection.window.is_zero() {
            return Err(anyhow!("confidence window must be greater than zero"));
        }
        if self.inference.timeout.is_zero() {
            return Err(anyhow!("inference timeout must be greater than zero"));
        }
        Ok(())
    }

    pub fn frame_source(&self) -> crate::Result<FrameSource> {
        FrameSource::new(&self.rtsp.url, self.rtsp.max_fps)
    }

    pub fn workflow(&self) -> WorkflowSettings {
        WorkflowSettings {
            workspace_name: self.inference.workspace_name.clone(),
            workflow_id: self.inference.workflow_id.clone(),
            prompt: self.detection.prompt.clone(),
            threshold: self.detection.threshold,
            api_key: self.inference.api_key.clone(),
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            threshold: self.detection.threshold,
            required_hits: self.detection.required_hits,
            window: self.detection.window,
            alert: self.pagerduty.alert.clone(),
            ..MonitorSettings::default()
        }
    }
}

fn read_config_file(path: &Path) -> Result<EscaprConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
