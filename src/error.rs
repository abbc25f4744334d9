//! Typed failures surfaced by the integration core.
//!
//! Configuration and endpoint errors are fatal at startup. Unknown instances and
//! unavailable tokens are per-request failures returned to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// The configuration could not be located, read, parsed or validated.
#[derive(Debug, Error)]
pub enum ConfigurationLoadError {
    #[error("config file {file_name} cannot be found at {searched:?} or in the bundled defaults")]
    NotFound {
        file_name: String,
        searched: Vec<PathBuf>,
    },

    #[error("config file {path} cannot be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config from {origin} is malformed: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config is not valid: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// No mapping exists for the requested (source url, project id) pair.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no project {project_id} for instance {url}")]
pub struct UnknownInstanceError {
    pub url: String,
    pub project_id: u32,
}

/// The most recent refresh did not yield a usable token.
///
/// `code` and `description` are the authority's values, verbatim, when the
/// authority answered; transport failures use a local code such as
/// `request_timeout`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {description}")]
pub struct TokenUnavailableError {
    pub code: String,
    pub description: String,
}

impl TokenUnavailableError {
    pub const ABSENT_CODE: &'static str = "token_absent";

    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }

    pub fn absent() -> Self {
        Self::new(Self::ABSENT_CODE, "no token has been requested yet")
    }
}

/// An authority URL could not be composed from the base URL and a path template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot compose endpoint from base '{base}' and path '{path}': {reason}")]
pub struct MalformedEndpointError {
    pub base: String,
    pub path: String,
    pub reason: String,
}

/// Fatal errors raised while starting the integration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationLoadError),

    #[error(transparent)]
    MalformedEndpoint(#[from] MalformedEndpointError),

    #[error("http client cannot be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Per-request failures of operations that resolve an instance and then
/// compose a destination URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrationError {
    #[error(transparent)]
    UnknownInstance(#[from] UnknownInstanceError),

    #[error(transparent)]
    MalformedEndpoint(#[from] MalformedEndpointError),
}
