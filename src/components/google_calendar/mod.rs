mod backend;
pub mod models;
pub mod time;

pub use backend::{CalendarBackend, GoogleCalendarBackend};
pub use models::{CalendarApi, CalendarEventRequest, EventResource, InsertedEvent};

use crate::error::{load_error, AppResult};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Submits renewal events to the calendar service
///
/// The underlying API is loaded lazily, once. Only a successful load is
/// kept, so a load that failed or timed out is attempted again next time.
pub struct CalendarClient {
    backend: Arc<dyn CalendarBackend>,
    timezone: Tz,
    load_timeout: Duration,
    api: OnceCell<CalendarApi>,
}

impl CalendarClient {
    pub fn new(backend: Arc<dyn CalendarBackend>, timezone: Tz, load_timeout: Duration) -> Self {
        Self {
            backend,
            timezone,
            load_timeout,
            api: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.api.initialized()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Fail early on missing settings, before any other step runs
    pub fn check_config(&self) -> AppResult<()> {
        self.backend.check_config()
    }

    /// Load the calendar API unless already loaded
    pub async fn ensure_client_loaded(&self) -> AppResult<&CalendarApi> {
        self.api
            .get_or_try_init(|| async {
                info!("Loading calendar client");
                match tokio::time::timeout(self.load_timeout, self.backend.load()).await {
                    Ok(result) => result,
                    Err(_) => Err(load_error(&format!(
                        "Calendar client did not load within {} seconds",
                        self.load_timeout.as_secs()
                    ))),
                }
            })
            .await
    }

    /// Create the event for `request` using `access_token`; no retry
    pub async fn submit(
        &self,
        access_token: &str,
        request: &CalendarEventRequest,
    ) -> AppResult<InsertedEvent> {
        let api = self
            .api
            .get()
            .ok_or_else(|| load_error("Calendar client is not loaded"))?;

        let event = request.to_event(self.timezone);
        let inserted = self
            .backend
            .insert_event(api, access_token, &event)
            .await
            .inspect_err(|e| warn!("Calendar rejected event '{}': {}", event.summary, e))?;

        info!(
            "Created calendar event: {} (id: {:?}, link: {:?})",
            event.summary, inserted.id, inserted.html_link
        );
        Ok(inserted)
    }
}
