use crate::components::authorization::{AuthorizationClient, GoogleIdentityProvider};
use crate::components::google_calendar::{CalendarClient, GoogleCalendarBackend};
use crate::components::notifier::Notifier;
use crate::components::{CalendarIntegration, TokenCache};
use crate::config::Config;
use crate::error::{AppResult, Error};
use chrono::DateTime;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Authorization client on top of the configured token store
pub fn build_authorization(config: &Config) -> AppResult<Arc<AuthorizationClient>> {
    let cache = TokenCache::from_kind(&config.token_store)?;
    let provider = Arc::new(GoogleIdentityProvider::new(config));
    Ok(Arc::new(AuthorizationClient::new(provider, cache)))
}

/// Wire the Google-backed clients into the integration
pub fn build_integration(
    config: &Config,
    notifier: Arc<dyn Notifier>,
) -> AppResult<CalendarIntegration> {
    info!("Using timezone {}", config.timezone);

    let authorization = build_authorization(config)?;
    let calendar = Arc::new(CalendarClient::new(
        Arc::new(GoogleCalendarBackend::new(config)),
        config.timezone,
        config.calendar_load_timeout,
    ));

    Ok(CalendarIntegration::new(authorization, calendar, notifier))
}

/// Human-readable state of the cached token
pub async fn token_status(config: &Config) -> AppResult<String> {
    let cache = TokenCache::from_kind(&config.token_store)?;

    Ok(match cache.read().await? {
        Some(token) => {
            let expires = DateTime::from_timestamp_millis(token.expires_at)
                .map(|dt| {
                    dt.with_timezone(&config.timezone)
                        .format("%Y-%m-%d %H:%M %Z")
                        .to_string()
                })
                .unwrap_or_else(|| token.expires_at.to_string());
            t!("token_cached", expires = expires).to_string()
        }
        None => t!("token_missing").to_string(),
    })
}
