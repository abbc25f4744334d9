use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::sources::{TokenGrant, TokenRejection, TokenSource};

static GRANT_TYPE: &str = "client_credentials";
static REQUEST_TIMEOUT_CODE: &str = "request_timeout";
static CONNECTION_FAILED_CODE: &str = "connection_failed";
static TRANSPORT_ERROR_CODE: &str = "transport_error";
static INVALID_RESPONSE_CODE: &str = "invalid_response";

/// Token endpoint response, success or error shaped.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: Option<String>,
    #[allow(dead_code)]
    scope: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Client-credentials client for the Management Portal token endpoint.
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    client: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
}

impl OAuth2Client {
    pub fn new(
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes,
        })
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }
}

impl TokenSource for OAuth2Client {
    async fn request_token(&self) -> Result<TokenGrant, TokenRejection> {
        let scope = self.scopes.join(" ");
        let form = [("grant_type", GRANT_TYPE), ("scope", scope.as_str())];

        debug!(url = %self.token_url, client_id = %self.client_id, "requesting token");
        let response = self
            .client
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(transport_rejection)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_rejection)?;
        parse_token_response(status, &body)
    }
}

fn transport_rejection(err: reqwest::Error) -> TokenRejection {
    let code = if err.is_timeout() {
        REQUEST_TIMEOUT_CODE
    } else if err.is_connect() {
        CONNECTION_FAILED_CODE
    } else {
        TRANSPORT_ERROR_CODE
    };
    warn!(code, error = %err, "token request failed");
    TokenRejection::new(code, err.to_string())
}

/// Map a token endpoint answer to a grant or a rejection. An `error` field
/// wins over the status code.
fn parse_token_response(status: StatusCode, body: &str) -> Result<TokenGrant, TokenRejection> {
    let parsed: Option<TokenResponse> = serde_json::from_str(body)
        .inspect_err(|e| warn!(%status, "token response is not valid JSON: {}", e))
        .ok();

    if let Some(error) = parsed.as_ref().and_then(|r| r.error.clone()) {
        let description = parsed
            .as_ref()
            .and_then(|r| r.error_description.clone())
            .unwrap_or_default();
        return Err(TokenRejection::new(error, description));
    }

    if !status.is_success() {
        return Err(TokenRejection::new(
            format!("http_{}", status.as_u16()),
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_owned(),
        ));
    }

    match parsed {
        Some(TokenResponse {
            access_token: Some(access_token),
            expires_in,
            ..
        }) if !access_token.is_empty() => Ok(TokenGrant {
            access_token,
            expires_in: expires_in.unwrap_or(0),
        }),
        _ => Err(TokenRejection::new(
            INVALID_RESPONSE_CODE,
            "token response carries no access_token",
        )),
    }
}
