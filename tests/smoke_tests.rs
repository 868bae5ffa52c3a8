use std::sync::Arc;
use subtrack::components::notifier::{NotificationKind, RecordingNotifier};
use subtrack::components::token_cache::{FileStore, KeyValueStore, TOKEN_KEY};
use subtrack::components::TokenCache;
use subtrack::config::{Config, TokenStoreKind};
use subtrack::error::Error;
use subtrack::startup;
use subtrack::subscription::Subscription;

fn file_config(dir: &tempfile::TempDir) -> Config {
    Config {
        token_store: TokenStoreKind::File(dir.path().join("token_cache.json")),
        ..Default::default()
    }
}

/// Smoke test to verify that the default config is usable
#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert!(config.google_client_id.is_empty());
    assert_eq!(config.calendar_load_timeout.as_secs(), 10);
    assert_eq!(config.timezone.name(), "UTC");
}

/// Missing credentials fail before anything touches the network
#[tokio::test]
async fn test_missing_client_id_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        google_api_key: "api-key".to_string(),
        ..file_config(&dir)
    };
    let notifier = Arc::new(RecordingNotifier::new());

    let integration = startup::build_integration(&config, notifier.clone()).unwrap();
    let err = integration
        .add_to_calendar(&Subscription::new("Netflix", "$15.99", "2025-03-01"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(ref m) if m.contains("GOOGLE_CLIENT_ID")));
    assert!(!integration.authorization().is_initialized());
    assert_eq!(notifier.notifications()[0].kind, NotificationKind::Failure);
    assert!(!dir.path().join("token_cache.json").exists());
}

/// Token status reflects the file-backed cache
#[tokio::test]
async fn test_token_status() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);

    let status = startup::token_status(&config).await.unwrap();
    assert_eq!(status, "No valid access token cached");

    let cache = TokenCache::from_kind(&config.token_store).unwrap();
    cache.store("ya29.token", 3600).await.unwrap();

    let status = startup::token_status(&config).await.unwrap();
    assert!(status.starts_with("Cached access token valid until"));
}

/// The cached token survives a restart and expires in place
#[tokio::test]
async fn test_file_cache_persists_and_expires() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token_cache.json");

    let cache = TokenCache::new(Arc::new(FileStore::new(&path)));
    let stored = cache.store_at("ya29.token", 60, 1_000).await.unwrap();

    // Fresh instance, same file
    let reopened = TokenCache::new(Arc::new(FileStore::new(&path)));
    assert_eq!(reopened.read_at(2_000).await.unwrap(), Some(stored));

    let raw = FileStore::new(&path).get(TOKEN_KEY).await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["access_token"], "ya29.token");
    assert_eq!(json["expires_at"], 61_000);

    assert_eq!(reopened.read_at(61_000).await.unwrap(), None);
    assert!(FileStore::new(&path).get(TOKEN_KEY).await.unwrap().is_none());
}

/// A truncated cache file is dropped and replaced by the next token
#[tokio::test]
async fn test_truncated_cache_file_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token_cache.json");
    std::fs::write(&path, "{\"subtrack_calendar_token\": \"{\\\"access_tok").unwrap();

    let cache = TokenCache::new(Arc::new(FileStore::new(&path)));
    assert_eq!(cache.read().await.unwrap(), None);

    let stored = cache.store("ya29.token", 3600).await.unwrap();
    assert_eq!(cache.read().await.unwrap(), Some(stored));
}
