use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EscaprError, Result};

/// One consumed pipeline output: did the frame match the prompt, and how
/// similar was it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionResult {
    is_match: bool,
    similarity: f64,
}

impl DetectionResult {
    /// Builds a result, rejecting similarities outside `[0, 1]`.
    pub fn new(is_match: bool, similarity: f64) -> Result<Self> {
        if !similarity.is_finite() || !(0.0..=1.0).contains(&similarity) {
            return Err(EscaprError::Service(format!(
                "similarity {} outside [0, 1]",
                similarity
            )));
        }
        Ok(Self {
            is_match,
            similarity,
        })
    }

    pub fn is_match(&self) -> bool {
        self.is_match
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    /// Similarity in percent, rounded to one decimal place.
    pub fn similarity_percent(&self) -> f64 {
        (self.similarity * 1000.0).round() / 10.0
    }
}

/// PagerDuty event severities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Critical,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = EscaprError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(EscaprError::Config(format!(
                "unknown severity '{}'; expected critical, error, warning or info",
                other
            ))),
        }
    }
}

/// The fixed parts of every page: what it says, where it came from, how loud.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertTemplate {
    pub summary: String,
    pub source: String,
    pub severity: Severity,
}

impl Default for AlertTemplate {
    fn default() -> Self {
        Self {
            summary: "Ferret has escaped!!!".to_string(),
            source: "Front yard camera".to_string(),
            severity: Severity::Critical,
        }
    }
}

impl AlertTemplate {
    pub fn event(
        &self,
        timestamp: DateTime<Utc>,
        similarity: f64,
        threshold: f64,
        prompt: &str,
    ) -> AlertEvent {
        AlertEvent {
            timestamp,
            similarity,
            threshold,
            prompt: prompt.to_string(),
            summary: self.summary.clone(),
            source: self.source.clone(),
            severity: self.severity,
        }
    }
}

/// Created when the evaluator decides to page; sent once and dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertEvent {
    pub timestamp: DateTime<Utc>,
    pub similarity: f64,
    pub threshold: f64,
    pub prompt: String,
    pub summary: String,
    pub source: String,
    pub severity: Severity,
}

impl AlertEvent {
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn similarity_must_be_a_unit_fraction() {
        assert!(DetectionResult::new(true, 0.0).is_ok());
        assert!(DetectionResult::new(true, 1.0).is_ok());
        assert!(matches!(
            DetectionResult::new(true, 1.2),
            Err(EscaprError::Service(_))
        ));
        assert!(DetectionResult::new(false, -0.01).is_err());
        assert!(DetectionResult::new(false, f64::NAN).is_err());
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        let result = DetectionResult::new(false, 0.16349).unwrap();
        assert_eq!(result.similarity_percent(), 16.3);
        let result = DetectionResult::new(true, 0.8567).unwrap();
        assert_eq!(result.similarity_percent(), 85.7);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("Critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!(" warning ".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("page-everyone".parse::<Severity>().is_err());
    }

    #[test]
    fn template_fills_event() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let event = AlertTemplate::default().event(at, 0.21, 0.16, "ferret");
        assert_eq!(event.summary, "Ferret has escaped!!!");
        assert_eq!(event.source, "Front yard camera");
        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(event.timestamp_rfc3339(), "2024-05-01T12:30:00.000Z");
    }
}
