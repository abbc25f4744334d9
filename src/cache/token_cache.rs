use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::token::AccessToken;
use crate::error::TokenUnavailableError;
use crate::helpers::time::{format_unix, get_instant, Clock};
use crate::observability::metrics::get_metrics;
use crate::sources::TokenSource;

static SUCCESS_MSG: &str = "success";
static ERROR_MSG: &str = "error";

/// Process-wide access token with single-flight refresh.
///
/// Readers load the installed token through `ArcSwap` and never take a lock.
/// Only refreshes go through `refresh_lock`, so at most one authority request
/// is in flight. Every refresh installs a new token with the next generation;
/// a waiter that finds a newer generation after acquiring the lock returns
/// that result instead of issuing its own request.
pub struct TokenCache<S> {
    source: S,
    clock: Arc<dyn Clock>,
    current: ArcSwap<AccessToken>,
    refresh_lock: Mutex<()>,
    failure_cooldown_seconds: u64,
}

impl<S: TokenSource> TokenCache<S> {
    pub fn new(source: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            current: ArcSwap::from_pointee(AccessToken::absent(0)),
            refresh_lock: Mutex::new(()),
            failure_cooldown_seconds: 0,
        }
    }

    /// Serve a failed attempt for `seconds` before trying again.
    pub fn with_failure_cooldown(mut self, seconds: u64) -> Self {
        self.failure_cooldown_seconds = seconds;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current time on the cache's clock.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Currently installed token.
    pub fn current(&self) -> Arc<AccessToken> {
        self.current.load_full()
    }

    /// Return a valid bearer token, refreshing first if the installed one is
    /// expired, absent or errored.
    pub async fn get_valid_token(&self) -> Result<String, TokenUnavailableError> {
        let observed = self.current.load_full();
        let token = if self.should_refresh(&observed) {
            self.refresh_after(&observed).await
        } else {
            observed
        };
        token.bearer()
    }

    /// Refresh even if the installed token is still valid. Concurrent callers
    /// still share a single request.
    pub async fn force_refresh(&self) -> Result<String, TokenUnavailableError> {
        let observed = self.current.load_full();
        self.refresh_after(&observed).await.bearer()
    }

    /// Drop the installed token; the next call requests a new one.
    pub async fn invalidate(&self) {
        let _guard = self.refresh_lock.lock().await;
        let generation = self.current.load().generation() + 1;
        self.current.store(Arc::new(AccessToken::absent(generation)));
        get_metrics().token_expiry_unix.set(0);
    }

    fn should_refresh(&self, token: &AccessToken) -> bool {
        let now = self.clock.now();
        if !token.is_expired(now) {
            return false;
        }
        match token.failed_for(now) {
            Some(elapsed) if elapsed < self.failure_cooldown_seconds => {
                debug!(elapsed, "last refresh failed recently, serving cached error");
                false
            }
            _ => true,
        }
    }

    /// Refresh unless another caller installed a newer attempt while this one
    /// was waiting for the lock.
    async fn refresh_after(&self, observed: &AccessToken) -> Arc<AccessToken> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.current.load_full();
        if current.generation() != observed.generation() && current.is_attempted() {
            debug!(
                generation = current.generation(),
                "token refreshed by a concurrent caller"
            );
            return current;
        }

        let refreshed = Arc::new(self.fetch(current.generation() + 1).await);
        self.current.store(refreshed.clone());
        refreshed
    }

    async fn fetch(&self, generation: u64) -> AccessToken {
        let metrics = get_metrics();
        let issued_at = self.clock.now();
        let start = get_instant();

        match self.source.request_token().await {
            Ok(grant) => {
                metrics
                    .token_refresh_duration
                    .with_label_values(&[SUCCESS_MSG])
                    .observe(start.elapsed().as_secs_f64());
                metrics.token_refreshes.with_label_values(&[SUCCESS_MSG]).inc();

                let token =
                    AccessToken::issued(generation, grant.access_token, issued_at, grant.expires_in);
                let expires_at = token.expires_at().unwrap_or(issued_at);
                metrics
                    .token_expiry_unix
                    .set(i64::try_from(expires_at).unwrap_or(i64::MAX));
                info!(
                    "Refreshed token at {} valid till {}",
                    format_unix(issued_at),
                    format_unix(expires_at)
                );
                token
            }
            Err(rejection) => {
                metrics
                    .token_refresh_duration
                    .with_label_values(&[ERROR_MSG])
                    .observe(start.elapsed().as_secs_f64());
                metrics.token_refreshes.with_label_values(&[ERROR_MSG]).inc();
                metrics.token_expiry_unix.set(0);

                warn!(code = %rejection.code, "token cannot be refreshed: {}", rejection);
                AccessToken::rejected(generation, rejection.code, rejection.description, issued_at)
            }
        }
    }
}
