use super::CalendarIntegration;
use crate::components::google_calendar::InsertedEvent;
use crate::error::{AppResult, Error};
use crate::subscription::Subscription;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// The user-facing "Add to Calendar" control
///
/// Disabled while a run is in flight: a second trigger returns
/// [`Error::Busy`] without starting the flow.
pub struct CalendarAction {
    integration: Arc<CalendarIntegration>,
    in_flight: AtomicBool,
}

/// Re-enables the control when the run ends, however it ends
struct Enabled<'a>(&'a AtomicBool);

impl Drop for Enabled<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CalendarAction {
    pub fn new(integration: Arc<CalendarIntegration>) -> Self {
        Self {
            integration,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn trigger(&self, subscription: &Subscription) -> AppResult<InsertedEvent> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Ignoring add to calendar for {} while busy", subscription.name);
            return Err(Error::Busy);
        }
        let _enabled = Enabled(&self.in_flight);

        self.integration.add_to_calendar(subscription).await
    }
}
