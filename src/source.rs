//! Frame source.
//!
//! Escapr never decodes video itself. The inference server opens the camera;
//! this module owns the video reference handed to it and how often frames
//! should be pulled.
//!
//! A `FrameSource` MUST NOT appear in logs with its raw URL. Camera URLs
//! routinely carry credentials; use `redacted_url()`.

use std::time::Duration;
use url::Url;

use crate::error::{EscaprError, Result};

pub const MAX_FPS_LIMIT: u32 = 60;

const SUPPORTED_SCHEMES: &[&str] = &["rtsp", "rtsps", "http", "https", "stub"];

/// Video reference plus frame rate for one camera.
#[derive(Clone)]
pub struct FrameSource {
    url: Url,
    max_fps: u32,
}

impl FrameSource {
    pub fn new(url: &str, max_fps: u32) -> Result<Self> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(EscaprError::Config("RTSP URL cannot be empty".to_string()));
        }
        let parsed = Url::parse(trimmed)
            .map_err(|e| EscaprError::Config(format!("invalid camera URL: {}", e)))?;
        if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
            return Err(EscaprError::Config(format!(
                "unsupported camera scheme '{}'; expected rtsp, rtsps, http(s) or stub",
                parsed.scheme()
            )));
        }
        validate_fps(max_fps)?;
        Ok(Self {
            url: parsed,
            max_fps,
        })
    }

    /// The reference sent to the inference server. Contains credentials.
    pub fn video_reference(&self) -> &str {
        self.url.as_str()
    }

    pub fn max_fps(&self) -> u32 {
        self.max_fps
    }

    pub fn frame_interval(&self) -> Duration {
        frame_interval(self.max_fps)
    }

    /// `stub://` sources run against the in-process synthetic pipeline.
    pub fn is_stub(&self) -> bool {
        self.url.scheme() == "stub"
    }

    /// Host part of the URL; for `stub://` sources this names the scenario.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("url", &self.redacted_url())
            .field("max_fps", &self.max_fps)
            .finish()
    }
}

pub fn validate_fps(max_fps: u32) -> Result<()> {
    if max_fps == 0 || max_fps > MAX_FPS_LIMIT {
        return Err(EscaprError::Config(format!(
            "max_fps must be between 1 and {}, got {}",
            MAX_FPS_LIMIT, max_fps
        )));
    }
    Ok(())
}

pub fn frame_interval(max_fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(max_fps.max(1)))
}
