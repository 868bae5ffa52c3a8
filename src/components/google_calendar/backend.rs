use super::models::{CalendarApi, EventResource, InsertedEvent};
use crate::config::Config;
use crate::error::{config_error, load_error, submission_error, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

/// Calendar service reachable only through this trait
#[async_trait]
pub trait CalendarBackend: Send + Sync + 'static {
    /// Check local settings; must not touch the network
    fn check_config(&self) -> AppResult<()> {
        Ok(())
    }

    /// Load and initialize the calendar API
    async fn load(&self) -> AppResult<CalendarApi>;

    /// Create `event` in the primary calendar of the token's owner
    async fn insert_event(
        &self,
        api: &CalendarApi,
        access_token: &str,
        event: &EventResource,
    ) -> AppResult<InsertedEvent>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveryDocument {
    root_url: String,
    service_path: String,
}

/// Google Calendar v3 over REST
pub struct GoogleCalendarBackend {
    client: Client,
    api_key: String,
    discovery_url: String,
}

impl GoogleCalendarBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.google_api_key.clone(),
            discovery_url: config.calendar_discovery_url.clone(),
        }
    }
}

#[async_trait]
impl CalendarBackend for GoogleCalendarBackend {
    fn check_config(&self) -> AppResult<()> {
        if self.api_key.is_empty() {
            return Err(config_error("Missing environment variable: GOOGLE_API_KEY"));
        }
        Ok(())
    }

    async fn load(&self) -> AppResult<CalendarApi> {
        self.check_config()?;

        let mut url = Url::parse(&self.discovery_url)
            .map_err(|e| config_error(&format!("Invalid CALENDAR_DISCOVERY_URL: {}", e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);

        info!("Loading calendar API from {}", self.discovery_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| load_error(&format!("Failed to fetch calendar discovery document: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(load_error(&format!(
                "Failed to fetch calendar discovery document: HTTP {} - {}",
                status,
                google_error_message(&error_body)
            )));
        }

        let document: DiscoveryDocument = response
            .json()
            .await
            .map_err(|e| load_error(&format!("Failed to parse discovery document: {}", e)))?;

        let base_url = Url::parse(&document.root_url)
            .and_then(|root| root.join(&document.service_path))
            .map_err(|e| load_error(&format!("Invalid calendar service URL: {}", e)))?;

        debug!("Calendar API base URL is {}", base_url);
        Ok(CalendarApi::new(base_url, self.api_key.clone()))
    }

    async fn insert_event(
        &self,
        api: &CalendarApi,
        access_token: &str,
        event: &EventResource,
    ) -> AppResult<InsertedEvent> {
        let mut url = api.primary_events_url()?;
        url.query_pairs_mut().append_pair("key", &api.api_key);

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| submission_error(&format!("Failed to create event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(submission_error(&format!(
                "HTTP {} - {}",
                status,
                google_error_message(&error_body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| submission_error(&format!("Failed to parse created event: {}", e)))
    }
}

/// Pull `error.message` out of a Google error body, or return the body as is
fn google_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| body.to_string())
}
