#![allow(dead_code)]

use async_trait::async_trait;
use chrono_tz::Tz;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subtrack::components::authorization::{IdentityProvider, Prompt, TokenGrant};
use subtrack::components::google_calendar::{
    CalendarApi, CalendarBackend, EventResource, InsertedEvent,
};
use subtrack::components::notifier::RecordingNotifier;
use subtrack::components::token_cache::InMemoryStore;
use subtrack::components::{
    AuthorizationClient, CalendarClient, CalendarIntegration, TokenCache,
};
use subtrack::error::{authorization_error, load_error, submission_error, AppResult};
use url::Url;

pub const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider double that answers the consent prompt itself
pub struct FakeIdentityProvider {
    grant: Result<TokenGrant, String>,
    load_failures: AtomicUsize,
    load_delay: Duration,
    loads: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl FakeIdentityProvider {
    pub fn granting(access_token: &str, expires_in: i64) -> Self {
        Self::with_grant(Ok(TokenGrant {
            access_token: access_token.to_string(),
            expires_in,
        }))
    }

    pub fn denying(error: &str) -> Self {
        Self::with_grant(Err(error.to_string()))
    }

    fn with_grant(grant: Result<TokenGrant, String>) -> Self {
        Self {
            grant,
            load_failures: AtomicUsize::new(0),
            load_delay: Duration::ZERO,
            loads: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail the first `n` loads
    pub fn failing_loads(self, n: usize) -> Self {
        self.load_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn slow_load(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn load(&self) -> AppResult<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }

        let failing = self
            .load_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(load_error("identity script failed to load"));
        }
        Ok(())
    }

    async fn request_access_token(&self, prompt: Prompt) -> AppResult<TokenGrant> {
        self.prompts.lock().unwrap().push(prompt);
        self.grant.clone().map_err(|e| authorization_error(&e))
    }
}

/// Calendar double that records inserted events
pub struct FakeCalendarBackend {
    rejection: Option<String>,
    load_delay: Mutex<Duration>,
    insert_delay: Duration,
    loads: AtomicUsize,
    inserted: Mutex<Vec<(String, EventResource)>>,
}

impl FakeCalendarBackend {
    pub fn accepting() -> Self {
        Self {
            rejection: None,
            load_delay: Mutex::new(Duration::ZERO),
            insert_delay: Duration::ZERO,
            loads: AtomicUsize::new(0),
            inserted: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            rejection: Some(message.to_string()),
            ..Self::accepting()
        }
    }

    pub fn slow_insert(mut self, delay: Duration) -> Self {
        self.insert_delay = delay;
        self
    }

    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = delay;
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// (access token, event) pairs in submission order
    pub fn inserted(&self) -> Vec<(String, EventResource)> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarBackend for FakeCalendarBackend {
    async fn load(&self) -> AppResult<CalendarApi> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.load_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(CalendarApi::new(
            Url::parse("https://calendar.test/calendar/v3/").unwrap(),
            "test-key",
        ))
    }

    async fn insert_event(
        &self,
        _api: &CalendarApi,
        access_token: &str,
        event: &EventResource,
    ) -> AppResult<InsertedEvent> {
        if !self.insert_delay.is_zero() {
            tokio::time::sleep(self.insert_delay).await;
        }
        if let Some(message) = &self.rejection {
            return Err(submission_error(message));
        }

        let mut inserted = self.inserted.lock().unwrap();
        inserted.push((access_token.to_string(), event.clone()));
        Ok(InsertedEvent {
            id: Some(format!("evt-{}", inserted.len())),
            html_link: None,
        })
    }
}

/// Everything wired together with doubles
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub cache: TokenCache,
    pub provider: Arc<FakeIdentityProvider>,
    pub backend: Arc<FakeCalendarBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub authorization: Arc<AuthorizationClient>,
    pub integration: Arc<CalendarIntegration>,
}

pub fn harness(provider: FakeIdentityProvider, backend: FakeCalendarBackend) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let cache = TokenCache::new(store.clone());
    let provider = Arc::new(provider);
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::new());

    let authorization = Arc::new(AuthorizationClient::new(provider.clone(), cache.clone()));
    let calendar = Arc::new(CalendarClient::new(backend.clone(), Tz::UTC, LOAD_TIMEOUT));
    let integration = Arc::new(CalendarIntegration::new(
        authorization.clone(),
        calendar,
        notifier.clone(),
    ));

    Harness {
        store,
        cache,
        provider,
        backend,
        notifier,
        authorization,
        integration,
    }
}
