//! Process-wide start and stop hooks.
//!
//! `on_start` builds everything the request handlers need from the snapshot
//! and is called once from the entry point; its errors are fatal. `on_stop`
//! drops the cached token.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::cache::token_cache::TokenCache;
use crate::config::snapshot::{ConfigurationSnapshot, DestinationProject};
use crate::error::{
    IntegrationError, MalformedEndpointError, StartupError, TokenUnavailableError,
    UnknownInstanceError,
};
use crate::helpers::time::{Clock, SystemClock};
use crate::routing::instance_key::SourceInstanceKey;
use crate::routing::resolver::InstanceResolver;
use crate::sources::oauth2::OAuth2Client;
use crate::sources::TokenSource;

/// Everything consumers of the core share: configuration, routing table and
/// the token cache.
pub struct Integration<S = OAuth2Client> {
    snapshot: Arc<ConfigurationSnapshot>,
    resolver: InstanceResolver,
    tokens: TokenCache<S>,
}

impl Integration<OAuth2Client> {
    pub async fn on_start(snapshot: Arc<ConfigurationSnapshot>) -> Result<Self, StartupError> {
        Self::on_start_with_clock(snapshot, Arc::new(SystemClock)).await
    }

    pub async fn on_start_with_clock(
        snapshot: Arc<ConfigurationSnapshot>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        let token_url = snapshot.token_endpoint_url()?;
        let authority = &snapshot.settings().authority;
        let client = OAuth2Client::new(
            token_url,
            snapshot.oauth_client_id(),
            snapshot.oauth_client_secret(),
            authority.scopes.clone(),
            Duration::from_millis(authority.request_timeout_ms),
        )?;
        info!(url = %client.token_url(), "OAuth2 client ready");

        Ok(Self::start_with_source(snapshot, client, clock).await)
    }
}

impl<S: TokenSource> Integration<S> {
    /// Build the resolver and the cache around `source`, then prime the cache
    /// if configured. A failed prime is only logged; later calls retry.
    pub async fn start_with_source(
        snapshot: Arc<ConfigurationSnapshot>,
        source: S,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = InstanceResolver::from_snapshot(&snapshot);
        let authority = &snapshot.settings().authority;
        let tokens = TokenCache::new(source, clock)
            .with_failure_cooldown(authority.failure_cooldown_seconds);

        info!(
            version = snapshot.version(),
            mappings = resolver.len(),
            "integration started"
        );

        if authority.prime_on_start {
            if let Err(e) = tokens.force_refresh().await {
                warn!("token cannot be generated: {}", e);
            }
        }

        Self {
            snapshot,
            resolver,
            tokens,
        }
    }

    pub async fn on_stop(&self) {
        self.tokens.invalidate().await;
        info!("token has been invalidated");
    }

    pub fn snapshot(&self) -> &ConfigurationSnapshot {
        &self.snapshot
    }

    pub fn resolver(&self) -> &InstanceResolver {
        &self.resolver
    }

    pub fn tokens(&self) -> &TokenCache<S> {
        &self.tokens
    }

    pub async fn get_valid_token(&self) -> Result<String, TokenUnavailableError> {
        self.tokens.get_valid_token().await
    }

    pub fn is_known_instance(&self, url: &str, project_id: u32) -> bool {
        self.resolver.is_known_instance(url, project_id)
    }

    pub fn resolve_destination(
        &self,
        url: &str,
        project_id: u32,
    ) -> Result<&DestinationProject, UnknownInstanceError> {
        self.resolver.resolve_destination(url, project_id)
    }

    pub fn resolve_source_info(
        &self,
        url: &str,
        project_id: u32,
    ) -> Result<&SourceInstanceKey, UnknownInstanceError> {
        self.resolver.resolve_source_info(url, project_id)
    }

    /// Management Portal project URL for a source instance.
    pub fn project_endpoint_for(&self, url: &str, project_id: u32) -> Result<Url, IntegrationError> {
        let destination = self.resolver.resolve_destination(url, project_id)?;
        Ok(self.snapshot.project_endpoint_url(destination)?)
    }

    pub fn subject_endpoint(&self) -> Result<Url, MalformedEndpointError> {
        self.snapshot.subject_endpoint_url()
    }
}
