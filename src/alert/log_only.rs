use super::{AlertDispatcher, DispatchReceipt};
use crate::error::Result;
use crate::model::AlertEvent;

/// Writes alerts to the log instead of paging. Used for dry runs.
#[derive(Debug, Default)]
pub struct LogDispatcher {
    dispatched: u64,
}

impl LogDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

impl AlertDispatcher for LogDispatcher {
    fn name(&self) -> &'static str {
        "log"
    }

    fn dispatch(&mut self, event: &AlertEvent) -> Result<DispatchReceipt> {
        self.dispatched += 1;
        log::warn!(
            "[dry run] would page ({}): {} source={} similarity={:.3} threshold={:.3} at {}",
            event.severity,
            event.summary,
            event.source,
            event.similarity,
            event.threshold,
            event.timestamp_rfc3339()
        );
        Ok(DispatchReceipt {
            status: "logged".to_string(),
            message: None,
            dedup_key: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AlertTemplate;

    #[test]
    fn counts_and_never_fails() {
        let mut dispatcher = LogDispatcher::new();
        let event = AlertTemplate::default().event(chrono::Utc::now(), 0.3, 0.16, "ferret");
        let receipt = dispatcher.dispatch(&event).unwrap();
        assert_eq!(receipt.status, "logged");
        dispatcher.dispatch(&event).unwrap();
        assert_eq!(dispatcher.dispatched(), 2);
    }
}
