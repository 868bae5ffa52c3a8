mod action;

pub use action::CalendarAction;

use crate::components::authorization::AuthorizationClient;
use crate::components::google_calendar::{CalendarClient, CalendarEventRequest, InsertedEvent};
use crate::components::notifier::{Notification, Notifier};
use crate::error::AppResult;
use crate::subscription::Subscription;
use std::sync::Arc;
use tracing::{debug, error, info};

/// The "add renewal to calendar" use case
///
/// Every failure is caught here once: logged, shown to the user, and
/// returned to the caller.
pub struct CalendarIntegration {
    authorization: Arc<AuthorizationClient>,
    calendar: Arc<CalendarClient>,
    notifier: Arc<dyn Notifier>,
}

impl CalendarIntegration {
    pub fn new(
        authorization: Arc<AuthorizationClient>,
        calendar: Arc<CalendarClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            authorization,
            calendar,
            notifier,
        }
    }

    pub fn authorization(&self) -> &AuthorizationClient {
        &self.authorization
    }

    pub fn calendar(&self) -> &CalendarClient {
        &self.calendar
    }

    /// Push `subscription`'s renewal to the user's primary calendar
    pub async fn add_to_calendar(&self, subscription: &Subscription) -> AppResult<InsertedEvent> {
        match self.push_renewal(subscription).await {
            Ok(inserted) => {
                let name = &subscription.name;
                self.notifier
                    .notify(Notification::success(t!("calendar_event_added", name = name)));
                Ok(inserted)
            }
            Err(e) => {
                error!(
                    "Failed to add {} renewal to calendar: {:?}",
                    subscription.name, e
                );
                let error = e.to_string();
                self.notifier
                    .notify(Notification::failure(t!("calendar_event_failed", error = error)));
                Err(e)
            }
        }
    }

    async fn push_renewal(&self, subscription: &Subscription) -> AppResult<InsertedEvent> {
        let request = CalendarEventRequest::from_subscription(subscription)?;
        self.calendar.check_config()?;

        self.authorization.initialize().await?;

        let access_token = match self.authorization.cache().read().await? {
            Some(token) => {
                debug!("Using cached access token");
                token.access_token
            }
            None => {
                info!("No valid cached token, requesting authorization");
                self.authorization.request_token().await?.access_token
            }
        };

        self.calendar.ensure_client_loaded().await?;
        self.calendar.submit(&access_token, &request).await
    }
}
