pub mod callback;
mod google;
pub mod provider;

pub use google::{GoogleIdentityProvider, ProviderEndpoints};
pub use provider::{IdentityProvider, Prompt, TokenGrant};

use crate::components::token_cache::{StoredToken, TokenCache};
use crate::error::{load_error, AppResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Obtains access tokens from the identity provider and caches them
///
/// The provider is loaded at most once per client. Concurrent
/// `initialize` calls share the same in-flight load, and a failed load
/// leaves the client uninitialized so the next call tries again.
pub struct AuthorizationClient {
    provider: Arc<dyn IdentityProvider>,
    cache: TokenCache,
    initialized: OnceCell<()>,
    prompted: AtomicBool,
}

impl AuthorizationClient {
    pub fn new(provider: Arc<dyn IdentityProvider>, cache: TokenCache) -> Self {
        Self {
            provider,
            cache,
            initialized: OnceCell::new(),
            prompted: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Load the identity provider unless already done
    pub async fn initialize(&self) -> AppResult<()> {
        self.initialized
            .get_or_try_init(|| async {
                info!("Initializing authorization client");
                self.provider.load().await
            })
            .await?;
        Ok(())
    }

    /// Ask the user for consent and cache the resulting token
    pub async fn request_token(&self) -> AppResult<StoredToken> {
        if !self.is_initialized() {
            return Err(load_error("Authorization client is not initialized"));
        }

        // Full consent the first time in this process, provider default afterwards
        let prompt = if self.prompted.swap(true, Ordering::SeqCst) {
            Prompt::Default
        } else {
            Prompt::Consent
        };

        let grant = self
            .provider
            .request_access_token(prompt)
            .await
            .inspect_err(|e| warn!("Authorization request failed: {}", e))?;

        info!("Received access token valid for {} seconds", grant.expires_in);
        self.cache.store(&grant.access_token, grant.expires_in).await
    }
}
