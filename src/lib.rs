//! Escapr
//!
//! Watches a camera for an escaped animal and pages responders.
//!
//! # Architecture
//!
//! Escapr does not decode video or run models. An external inference server
//! opens the RTSP feed, embeds each frame with CLIP and compares it against a
//! text prompt. Escapr drives that server and reacts to what it reports:
//!
//! 1. **Frame source** (`source`): the camera reference handed to the server.
//! 2. **Inference client** (`inference`): starts a server-side pipeline and
//!    consumes one `DetectionResult` per frame.
//! 3. **Threshold evaluator** (`evaluate`): per-frame threshold test plus a
//!    confidence window so one noisy frame never pages anyone.
//! 4. **Alert dispatcher** (`alert`): PagerDuty Events API v2, or the log
//!    for dry runs.
//!
//! `monitor` ties them into a single-threaded poll loop.

pub mod alert;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod inference;
pub mod model;
pub mod monitor;
pub mod source;

pub use alert::{AlertDispatcher, DispatchReceipt, LogDispatcher, PagerDutyDispatcher};
pub use config::EscaprConfig;
pub use error::{EscaprError, Result};
pub use evaluate::{evaluate, ConfidenceWindow};
pub use inference::{
    InferenceClient, InferencePipeline, PipelineId, RoboflowClient, SyntheticClient,
    WorkflowSettings,
};
pub use model::{AlertEvent, AlertTemplate, DetectionResult, Severity};
pub use monitor::{Monitor, MonitorSettings, MonitorStats, PollOutcome};
pub use source::FrameSource;
