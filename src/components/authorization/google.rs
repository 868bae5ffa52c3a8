use super::callback::{CallbackListener, CallbackOutcome};
use super::provider::{IdentityProvider, Prompt, TokenGrant};
use crate::config::Config;
use crate::error::{authorization_error, config_error, load_error, other_error, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Endpoints published in the provider's OpenID discovery document
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Google identity provider using the browser consent screen and a loopback redirect
pub struct GoogleIdentityProvider {
    client: Client,
    client_id: String,
    client_secret: Option<String>,
    scope: String,
    redirect_port: u16,
    discovery_url: String,
    endpoints: OnceLock<ProviderEndpoints>,
}

impl GoogleIdentityProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            scope: config.oauth_scope.clone(),
            redirect_port: config.redirect_port,
            discovery_url: config.identity_discovery_url.clone(),
            endpoints: OnceLock::new(),
        }
    }

    fn endpoints(&self) -> AppResult<&ProviderEndpoints> {
        self.endpoints
            .get()
            .ok_or_else(|| load_error("Identity provider has not been loaded"))
    }

    /// Consent screen URL for one authorization attempt
    pub fn authorization_url(
        &self,
        endpoints: &ProviderEndpoints,
        redirect_uri: &str,
        state: &str,
        prompt: Prompt,
    ) -> AppResult<Url> {
        let mut url = Url::parse(&endpoints.authorization_endpoint)
            .map_err(|e| load_error(&format!("Invalid authorization endpoint: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.scope)
                .append_pair("state", state);
            if prompt != Prompt::Default {
                query.append_pair("prompt", prompt.as_str());
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn load(&self) -> AppResult<()> {
        if self.client_id.is_empty() {
            return Err(config_error("Missing environment variable: GOOGLE_CLIENT_ID"));
        }

        if self.endpoints.get().is_some() {
            return Ok(());
        }

        info!("Loading identity provider from {}", self.discovery_url);

        let response = self
            .client
            .get(&self.discovery_url)
            .send()
            .await
            .map_err(|e| load_error(&format!("Failed to fetch identity provider: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(load_error(&format!(
                "Failed to fetch identity provider: HTTP {}",
                status
            )));
        }

        let endpoints: ProviderEndpoints = response.json().await.map_err(|e| {
            load_error(&format!("Failed to parse identity provider metadata: {}", e))
        })?;

        // A concurrent load may have won; both documents are equivalent
        let _ = self.endpoints.set(endpoints);
        Ok(())
    }

    async fn request_access_token(&self, prompt: Prompt) -> AppResult<TokenGrant> {
        let endpoints = self.endpoints()?.clone();

        let listener = CallbackListener::bind(self.redirect_port)?;
        let redirect_uri = listener.redirect_uri();

        // Random state ties the callback to this attempt
        let state = Uuid::new_v4().to_string();
        let auth_url = self.authorization_url(&endpoints, &redirect_uri, &state, prompt)?;

        info!("Opening browser for Google Calendar authorization");
        if let Err(e) = webbrowser::open(auth_url.as_str()) {
            warn!("Could not open a browser: {}", e);
            println!("Open this URL to authorize calendar access:\n{}", auth_url);
        }

        let outcome = tokio::task::spawn_blocking(move || listener.wait(&state))
            .await
            .map_err(|e| other_error(&format!("Callback listener task failed: {}", e)))??;

        match outcome {
            CallbackOutcome::Error(message) => Err(authorization_error(&message)),
            CallbackOutcome::Code(code) => {
                exchange_code(
                    &self.client,
                    &endpoints.token_endpoint,
                    &self.client_id,
                    self.client_secret.as_deref(),
                    &code,
                    &redirect_uri,
                )
                .await
            }
        }
    }
}

/// Exchange an authorization code for an access token
pub(crate) async fn exchange_code(
    client: &Client,
    token_endpoint: &str,
    client_id: &str,
    client_secret: Option<&str>,
    code: &str,
    redirect_uri: &str,
) -> AppResult<TokenGrant> {
    let mut params = vec![
        ("client_id", client_id),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code"),
    ];
    if let Some(secret) = client_secret {
        params.push(("client_secret", secret));
    }

    let response = client
        .post(token_endpoint)
        .form(&params)
        .send()
        .await
        .map_err(|e| authorization_error(&format!("Failed to exchange code: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read token response".to_string());

    let parsed: Option<TokenEndpointResponse> = serde_json::from_str(&body).ok();

    if let Some(TokenEndpointResponse {
        error: Some(error),
        error_description,
        ..
    }) = &parsed
    {
        return Err(authorization_error(&match error_description {
            Some(description) => format!("{}: {}", error, description),
            None => error.clone(),
        }));
    }

    if !status.is_success() {
        return Err(authorization_error(&format!(
            "Failed to exchange code: HTTP {} - {}",
            status, body
        )));
    }

    let parsed = parsed.ok_or_else(|| authorization_error("Failed to parse token response"))?;
    let access_token = parsed
        .access_token
        .ok_or_else(|| authorization_error("Token response missing 'access_token' field"))?;

    Ok(TokenGrant {
        access_token,
        expires_in: parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
    })
}
