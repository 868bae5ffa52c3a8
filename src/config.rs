use crate::error::{config_error, AppResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Optional overlay file for non-secret settings
pub const CONFIG_FILE: &str = "config/subtrack.toml";

pub const DEFAULT_OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";
pub const DEFAULT_IDENTITY_DISCOVERY_URL: &str =
    "https://accounts.google.com/.well-known/openid-configuration";
pub const DEFAULT_CALENDAR_DISCOVERY_URL: &str =
    "https://www.googleapis.com/discovery/v1/apis/calendar/v3/rest";
pub const DEFAULT_REDIRECT_PORT: u16 = 8080;
pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOKEN_CACHE_PATH: &str = ".subtrack/token_cache.json";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Where the access token is persisted between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStoreKind {
    /// JSON file on local disk
    File(PathBuf),
    /// Redis key on the given server
    Redis(String),
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Google API key used by the calendar client
    pub google_api_key: String,
    /// OAuth client identifier
    pub google_client_id: String,
    /// OAuth client secret, sent on code exchange when present
    pub google_client_secret: Option<String>,
    /// Scope requested on the consent prompt
    pub oauth_scope: String,
    /// Port of the loopback listener receiving the OAuth callback
    pub redirect_port: u16,
    pub identity_discovery_url: String,
    pub calendar_discovery_url: String,
    /// Upper bound for loading the calendar API
    pub calendar_load_timeout: Duration,
    /// Timezone the event times are written in
    pub timezone: Tz,
    pub token_store: TokenStoreKind,
}

/// Settings accepted from `config/subtrack.toml`
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    oauth_scope: Option<String>,
    redirect_port: Option<u16>,
    identity_discovery_url: Option<String>,
    calendar_discovery_url: Option<String>,
    calendar_load_timeout_secs: Option<u64>,
    timezone: Option<String>,
    token_store: Option<String>,
    token_cache_path: Option<String>,
    redis_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_api_key: String::new(),
            google_client_id: String::new(),
            google_client_secret: None,
            oauth_scope: DEFAULT_OAUTH_SCOPE.to_string(),
            redirect_port: DEFAULT_REDIRECT_PORT,
            identity_discovery_url: DEFAULT_IDENTITY_DISCOVERY_URL.to_string(),
            calendar_discovery_url: DEFAULT_CALENDAR_DISCOVERY_URL.to_string(),
            calendar_load_timeout: Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
            timezone: Tz::UTC,
            token_store: TokenStoreKind::File(PathBuf::from(DEFAULT_TOKEN_CACHE_PATH)),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    ///
    /// Credentials are not required here. Missing credentials are reported by
    /// the clients that need them, before any network activity.
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let file = read_file_config(Path::new(CONFIG_FILE))?;

        Self::from_sources(file, |name| env::var(name).ok())
    }

    /// Build configuration from a file overlay and an environment lookup.
    /// Environment values win over file values.
    fn from_sources(file: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let get = |name: &str, fallback: Option<String>| lookup(name).or(fallback);

        let google_api_key = lookup("GOOGLE_API_KEY").unwrap_or_default();
        let google_client_id = lookup("GOOGLE_CLIENT_ID").unwrap_or_default();
        let google_client_secret = lookup("GOOGLE_CLIENT_SECRET").filter(|s| !s.is_empty());

        let oauth_scope = get("GOOGLE_OAUTH_SCOPE", file.oauth_scope)
            .unwrap_or_else(|| DEFAULT_OAUTH_SCOPE.to_string());

        let redirect_port = match lookup("OAUTH_REDIRECT_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| config_error("Invalid OAUTH_REDIRECT_PORT format"))?,
            None => file.redirect_port.unwrap_or(DEFAULT_REDIRECT_PORT),
        };

        let identity_discovery_url = get("IDENTITY_DISCOVERY_URL", file.identity_discovery_url)
            .unwrap_or_else(|| DEFAULT_IDENTITY_DISCOVERY_URL.to_string());
        let calendar_discovery_url = get("CALENDAR_DISCOVERY_URL", file.calendar_discovery_url)
            .unwrap_or_else(|| DEFAULT_CALENDAR_DISCOVERY_URL.to_string());

        let load_timeout_secs = match lookup("CALENDAR_LOAD_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .map_err(|_| config_error("Invalid CALENDAR_LOAD_TIMEOUT_SECS format"))?,
            None => file
                .calendar_load_timeout_secs
                .unwrap_or(DEFAULT_LOAD_TIMEOUT_SECS),
        };

        let timezone_str = get("TIMEZONE", file.timezone).unwrap_or_else(|| String::from("UTC"));
        let timezone: Tz = timezone_str
            .parse()
            .map_err(|_| config_error(&format!("Invalid TIMEZONE: {}", timezone_str)))?;

        let store = get("TOKEN_STORE", file.token_store).unwrap_or_else(|| String::from("file"));
        let token_store = match store.as_str() {
            "file" => TokenStoreKind::File(PathBuf::from(
                get("TOKEN_CACHE_PATH", file.token_cache_path)
                    .unwrap_or_else(|| DEFAULT_TOKEN_CACHE_PATH.to_string()),
            )),
            "redis" => TokenStoreKind::Redis(
                get("REDIS_URL", file.redis_url).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            ),
            other => {
                return Err(config_error(&format!(
                    "Unknown TOKEN_STORE '{}', expected 'file' or 'redis'",
                    other
                )))
            }
        };

        Ok(Config {
            google_api_key,
            google_client_id,
            google_client_secret,
            oauth_scope,
            redirect_port,
            identity_discovery_url,
            calendar_discovery_url,
            calendar_load_timeout: Duration::from_secs(load_timeout_secs),
            timezone,
            token_store,
        })
    }
}

/// A missing overlay file means no overlay; any other read failure is reported
fn read_file_config(path: &Path) -> AppResult<FileConfig> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str::<FileConfig>(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(config_error(&format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}
