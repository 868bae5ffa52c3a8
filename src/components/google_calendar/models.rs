use super::time::{format_in_timezone, parse_renewal_date};
use crate::error::AppResult;
use crate::subscription::Subscription;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use url::Url;

/// Appended to the subscription name to form the event title
pub const SUMMARY_SUFFIX: &str = " Subscription Renewal";

/// Fixed reminders: an email the day before, a popup half an hour before
pub const REMINDER_OVERRIDES: [(&str, i64); 2] = [("email", 24 * 60), ("popup", 30)];

/// One renewal notice to push to the calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventRequest {
    pub subject_name: String,
    /// Display price, never parsed
    pub price: String,
    pub renewal_instant: DateTime<Utc>,
}

impl CalendarEventRequest {
    pub fn new(
        subject_name: impl Into<String>,
        price: impl Into<String>,
        renewal_instant: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            price: price.into(),
            renewal_instant,
        }
    }

    pub fn from_subscription(subscription: &Subscription) -> AppResult<Self> {
        let renewal_instant = parse_renewal_date(&subscription.renewal_date)?;
        Ok(Self::new(
            subscription.name.clone(),
            subscription.price.clone(),
            renewal_instant,
        ))
    }

    pub fn summary(&self) -> String {
        format!("{}{}", self.subject_name, SUMMARY_SUFFIX)
    }

    pub fn description(&self) -> String {
        format!(
            "Your {} subscription renews. Price: {}",
            self.subject_name, self.price
        )
    }

    /// Calendar resource for this request; a zero-length event at the renewal instant
    pub fn to_event(&self, timezone: Tz) -> EventResource {
        let at = EventDateTime {
            date_time: format_in_timezone(self.renewal_instant, timezone),
            time_zone: timezone.name().to_string(),
        };

        EventResource {
            summary: self.summary(),
            description: self.description(),
            start: at.clone(),
            end: at,
            reminders: Reminders {
                use_default: false,
                overrides: REMINDER_OVERRIDES
                    .iter()
                    .map(|(method, minutes)| ReminderOverride {
                        method: method.to_string(),
                        minutes: *minutes,
                    })
                    .collect(),
            },
        }
    }
}

/// Event body sent to the calendar API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResource {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub reminders: Reminders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<ReminderOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: i64,
}

/// Subset of the created event returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedEvent {
    pub id: Option<String>,
    pub html_link: Option<String>,
}

/// A loaded calendar API: where requests go and which key they carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarApi {
    pub base_url: Url,
    pub api_key: String,
}

impl CalendarApi {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Insert endpoint of the authenticated user's primary calendar
    pub fn primary_events_url(&self) -> AppResult<Url> {
        self.base_url
            .join("calendars/primary/events")
            .map_err(|e| crate::error::load_error(&format!("Invalid calendar base URL: {}", e)))
    }
}
