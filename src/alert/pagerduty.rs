//! PagerDuty Events API v2 dispatcher.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AlertDispatcher, DispatchReceipt};
use crate::error::{EscaprError, Result};
use crate::model::AlertEvent;

pub const DEFAULT_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

#[derive(Debug, Serialize)]
struct EnqueueRequest<'a> {
    routing_key: &'a str,
    event_action: &'static str,
    payload: EventPayload<'a>,
}

#[derive(Debug, Serialize)]
struct EventPayload<'a> {
    summary: &'a str,
    severity: &'static str,
    source: &'a str,
    timestamp: String,
    custom_details: CustomDetails<'a>,
}

#[derive(Debug, Serialize)]
struct CustomDetails<'a> {
    similarity: f64,
    threshold: f64,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EnqueueResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    dedup_key: Option<String>,
}

pub struct PagerDutyDispatcher {
    agent: ureq::Agent,
    events_url: String,
    routing_key: String,
}

impl PagerDutyDispatcher {
    pub fn new(routing_key: &str, events_url: &str, timeout: Duration) -> Result<Self> {
        if routing_key.trim().is_empty() {
            return Err(EscaprError::Config(
                "PagerDuty routing key cannot be empty".to_string(),
            ));
        }
        url::Url::parse(events_url)
            .map_err(|e| EscaprError::Config(format!("invalid PagerDuty events url: {}", e)))?;
        Ok(Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            events_url: events_url.to_string(),
            routing_key: routing_key.trim().to_string(),
        })
    }

    fn request<'a>(&'a self, event: &'a AlertEvent) -> EnqueueRequest<'a> {
        EnqueueRequest {
            routing_key: &self.routing_key,
            event_action: "trigger",
            payload: EventPayload {
                summary: &event.summary,
                severity: event.severity.as_str(),
                source: &event.source,
                timestamp: event.timestamp_rfc3339(),
                custom_details: CustomDetails {
                    similarity: event.similarity,
                    threshold: event.threshold,
                    prompt: &event.prompt,
                },
            },
        }
    }
}

impl AlertDispatcher for PagerDutyDispatcher {
    fn name(&self) -> &'static str {
        "pagerduty"
    }

    fn dispatch(&mut self, event: &AlertEvent) -> Result<DispatchReceipt> {
        let response = self
            .agent
            .post(&self.events_url)
            .send_json(self.request(event))
            .map_err(|err| match err {
                ureq::Error::Status(code, response) => {
                    let body = response.into_string().unwrap_or_default();
                    EscaprError::Delivery(format!(
                        "PagerDuty returned {}: {}",
                        code,
                        body.trim()
                    ))
                }
                ureq::Error::Transport(transport) => {
                    EscaprError::Delivery(format!("PagerDuty unreachable: {}", transport))
                }
            })?;

        // The event was accepted once we get a 2xx; an odd body only costs
        // us the receipt details.
        let body = response.into_string().unwrap_or_default();
        let parsed: EnqueueResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("unreadable PagerDuty response ({}): {}", e, body.trim());
                EnqueueResponse {
                    status: None,
                    message: None,
                    dedup_key: None,
                }
            }
        };
        Ok(DispatchReceipt {
            status: parsed.status.unwrap_or_else(|| "success".to_string()),
            message: parsed.message,
            dedup_key: parsed.dedup_key,
        })
    }
}
