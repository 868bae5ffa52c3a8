use crate::error::AppResult;
use async_trait::async_trait;
use serde::Deserialize;

/// Token handed back by the identity provider after consent
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// How insistently the provider should ask the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Let the provider decide; usually silent after the first grant
    Default,
    Consent,
}

impl Prompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prompt::Default => "",
            Prompt::Consent => "consent",
        }
    }
}

/// Third-party identity provider reachable only through this trait
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Load the provider's client side (endpoints, metadata)
    async fn load(&self) -> AppResult<()>;

    /// Show the consent prompt and wait for the provider's answer
    async fn request_access_token(&self, prompt: Prompt) -> AppResult<TokenGrant>;
}
