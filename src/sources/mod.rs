/// Sources module
///
/// A token source talks to the authority. The cache owns the single-flight
/// discipline; a source only performs one request per call.

pub mod oauth2;

use std::fmt;

/// A successful token response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: u64,
}

/// Why a token request did not yield a token. Authority errors keep the
/// authority's code and description; transport failures get a local code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRejection {
    pub code: String,
    pub description: String,
}

impl TokenRejection {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

pub trait TokenSource: Send + Sync {
    fn request_token(
        &self,
    ) -> impl std::future::Future<Output = Result<TokenGrant, TokenRejection>> + Send;
}
