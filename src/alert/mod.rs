//! Alert dispatch.
//!
//! An `AlertDispatcher` delivers one `AlertEvent` to whoever gets paged.
//! Delivery failures are returned as `EscaprError::Delivery` and never
//! retried here.

mod log_only;
mod pagerduty;

pub use log_only::LogDispatcher;
pub use pagerduty::{PagerDutyDispatcher, DEFAULT_EVENTS_URL};

use crate::error::Result;
use crate::model::AlertEvent;

/// What the paging service said about an accepted event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub status: String,
    pub message: Option<String>,
    pub dedup_key: Option<String>,
}

pub trait AlertDispatcher: Send {
    /// Dispatcher identifier for logs.
    fn name(&self) -> &'static str;

    fn dispatch(&mut self, event: &AlertEvent) -> Result<DispatchReceipt>;
}
