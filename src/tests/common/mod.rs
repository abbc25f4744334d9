// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::snapshot::tests::document;
use crate::config::snapshot::ConfigurationSnapshot;
use crate::sources::{TokenGrant, TokenRejection, TokenSource};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Snapshot with the test mapping (https://redcap.example.org/, 10) -> radar
/// and no token request during startup.
pub fn snapshot(base_url: &str) -> Arc<ConfigurationSnapshot> {
    let mut doc = document(base_url);
    doc.settings.authority.prime_on_start = false;
    Arc::new(ConfigurationSnapshot::from_document(doc).expect("valid test config"))
}

/// Token source answering with `respond(n)` for the n-th call (1-based),
/// after an optional delay.
pub struct ScriptedSource<F> {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    respond: F,
}

impl<F> ScriptedSource<F>
where
    F: Fn(usize) -> Result<TokenGrant, TokenRejection> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            respond,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> TokenSource for ScriptedSource<F>
where
    F: Fn(usize) -> Result<TokenGrant, TokenRejection> + Send + Sync,
{
    async fn request_token(&self) -> Result<TokenGrant, TokenRejection> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(n)
    }
}

/// `tok1`, `tok2`, ... each valid for `expires_in` seconds.
pub fn numbered_tokens(
    expires_in: u64,
) -> impl Fn(usize) -> Result<TokenGrant, TokenRejection> + Send + Sync {
    move |n| {
        Ok(TokenGrant {
            access_token: format!("tok{}", n),
            expires_in,
        })
    }
}
