//! Inference client.
//!
//! The inference server hosts the CLIP model, opens the camera and runs a
//! workflow that compares each frame against a text prompt. Escapr drives the
//! server-side pipeline lifecycle (start, consume, terminate) and reads back
//! one `DetectionResult` per frame.
//!
//! - `RoboflowClient` speaks the inference server's HTTP pipeline API.
//! - `SyntheticClient` serves `stub://` sources without any network.
//! - `InferencePipeline` owns a client and the pipeline id, and stops the
//!   server pipeline when dropped.

mod client;
mod pipeline;
mod roboflow;
mod synthetic;
mod wire;

pub use client::{InferenceClient, PipelineId, PipelineRequest, WorkflowSettings};
pub use pipeline::InferencePipeline;
pub use roboflow::{RoboflowClient, DEFAULT_API_URL};
pub use synthetic::SyntheticClient;
