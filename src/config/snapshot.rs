use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::config::proc_validator;
use crate::config::settings::SettingsConfig;
use crate::error::{ConfigurationLoadError, MalformedEndpointError};
use crate::routing::instance_key::SourceInstanceKey;

const REDACTED: &str = "****";

/// ================================
/// Configuration document (radar.yml)
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigDocument {
    pub version: String,
    pub released: String,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    pub management_portal_url: String,
    pub token_endpoint: String,
    pub project_endpoint: String,
    pub subject_endpoint: String,
    #[serde(default)]
    pub projects: Vec<ProjectInfo>,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// One routing entry: a REDCap project and the Management Portal project it feeds.
#[derive(Debug, Deserialize, Clone)]
pub struct ProjectInfo {
    pub redcap_info: RedCapInfo,
    pub mp_info: ManagementPortalInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedCapInfo {
    pub url: String,
    pub project_id: u32,
    pub enrolment_event: Option<String>,
    pub integration_form: Option<String>,
    /// REDCap API token of the project
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ManagementPortalInfo {
    pub project_name: String,
    pub project_id: Option<u64>,
}

/// ================================
/// Immutable snapshot
/// ================================

/// Destination-side descriptor of a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationProject {
    project_name: String,
    project_id: Option<u64>,
}

impl DestinationProject {
    pub fn new(project_name: impl Into<String>, project_id: Option<u64>) -> Self {
        Self {
            project_name: project_name.into(),
            project_id,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_id(&self) -> Option<u64> {
        self.project_id
    }
}

/// Source-side record of a mapping, keyed by its normalized instance key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInstance {
    key: SourceInstanceKey,
    enrolment_event: Option<String>,
    integration_form: Option<String>,
    token: Option<String>,
}

impl SourceInstance {
    pub fn new(key: SourceInstanceKey) -> Self {
        Self {
            key,
            enrolment_event: None,
            integration_form: None,
            token: None,
        }
    }

    pub fn key(&self) -> &SourceInstanceKey {
        &self.key
    }

    pub fn enrolment_event(&self) -> Option<&str> {
        self.enrolment_event.as_deref()
    }

    pub fn integration_form(&self) -> Option<&str> {
        self.integration_form.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMapping {
    pub source: SourceInstance,
    pub destination: DestinationProject,
}

impl ProjectMapping {
    pub fn new(source: SourceInstance, destination: DestinationProject) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// Parsed, validated and normalized configuration. Built once at startup and
/// shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct ConfigurationSnapshot {
    version: String,
    released: String,
    oauth_client_id: String,
    oauth_client_secret: String,
    management_portal_url: String,
    token_endpoint: String,
    project_endpoint: String,
    subject_endpoint: String,
    mappings: Vec<ProjectMapping>,
    settings: SettingsConfig,
}

impl ConfigurationSnapshot {
    /// Validate the document and normalize every source URL.
    pub fn from_document(doc: ConfigDocument) -> Result<Self, ConfigurationLoadError> {
        proc_validator::validate_document(&doc).map_err(ConfigurationLoadError::Invalid)?;

        let mut mappings = Vec::with_capacity(doc.projects.len());
        for info in doc.projects {
            let key = SourceInstanceKey::new(&info.redcap_info.url, info.redcap_info.project_id)
                .map_err(|e| {
                    ConfigurationLoadError::Invalid(vec![format!(
                        "redcap_info.url '{}' is not a valid URL: {}",
                        info.redcap_info.url, e
                    )])
                })?;
            let source = SourceInstance {
                key,
                enrolment_event: info.redcap_info.enrolment_event,
                integration_form: info.redcap_info.integration_form,
                token: info.redcap_info.token,
            };
            let destination =
                DestinationProject::new(info.mp_info.project_name, info.mp_info.project_id);
            mappings.push(ProjectMapping::new(source, destination));
        }

        Ok(Self {
            version: doc.version,
            released: doc.released,
            oauth_client_id: doc.oauth_client_id,
            oauth_client_secret: doc.oauth_client_secret,
            management_portal_url: doc.management_portal_url,
            token_endpoint: doc.token_endpoint,
            project_endpoint: doc.project_endpoint,
            subject_endpoint: doc.subject_endpoint,
            mappings,
            settings: doc.settings,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn released(&self) -> &str {
        &self.released
    }

    pub fn oauth_client_id(&self) -> &str {
        &self.oauth_client_id
    }

    pub fn oauth_client_secret(&self) -> &str {
        &self.oauth_client_secret
    }

    pub fn management_portal_url(&self) -> &str {
        &self.management_portal_url
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    pub fn project_endpoint(&self) -> &str {
        &self.project_endpoint
    }

    pub fn subject_endpoint(&self) -> &str {
        &self.subject_endpoint
    }

    pub fn mappings(&self) -> &[ProjectMapping] {
        &self.mappings
    }

    pub fn settings(&self) -> &SettingsConfig {
        &self.settings
    }

    pub fn token_endpoint_url(&self) -> Result<Url, MalformedEndpointError> {
        self.compose(&self.token_endpoint)
    }

    pub fn subject_endpoint_url(&self) -> Result<Url, MalformedEndpointError> {
        self.compose(&self.subject_endpoint)
    }

    pub fn project_base_url(&self) -> Result<Url, MalformedEndpointError> {
        self.compose(&self.project_endpoint)
    }

    /// Project endpoint template with the destination project name appended.
    pub fn project_endpoint_url(
        &self,
        destination: &DestinationProject,
    ) -> Result<Url, MalformedEndpointError> {
        self.compose(&format!(
            "{}{}",
            self.project_endpoint,
            destination.project_name()
        ))
    }

    /// Join `path` onto the authority base URL. The base is treated as a
    /// directory and `path` is always resolved below it.
    fn compose(&self, path: &str) -> Result<Url, MalformedEndpointError> {
        let malformed = |reason: String| MalformedEndpointError {
            base: self.management_portal_url.clone(),
            path: path.to_owned(),
            reason,
        };

        let mut base =
            Url::parse(self.management_portal_url.trim()).map_err(|e| malformed(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(malformed("base URL cannot carry a path".to_owned()));
        }
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }

        base.join(path.trim_start_matches('/'))
            .map_err(|e| malformed(e.to_string()))
    }
}

impl fmt::Display for ConfigurationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration {{")?;
        writeln!(f, "  version = '{}'", self.version)?;
        writeln!(f, "  released = '{}'", self.released)?;
        writeln!(f, "  oauth_client_id = '{}'", self.oauth_client_id)?;
        writeln!(f, "  oauth_client_secret = '{}'", REDACTED)?;
        writeln!(f, "  management_portal_url = {}", self.management_portal_url)?;
        writeln!(f, "  token_endpoint = '{}'", self.token_endpoint)?;
        writeln!(f, "  project_endpoint = '{}'", self.project_endpoint)?;
        writeln!(f, "  subject_endpoint = '{}'", self.subject_endpoint)?;
        writeln!(f, "  projects = [")?;
        for mapping in &self.mappings {
            writeln!(
                f,
                "    {} -> {}{}",
                mapping.source.key(),
                mapping.destination.project_name(),
                mapping
                    .source
                    .token()
                    .map(|_| format!(" (redcap token {})", REDACTED))
                    .unwrap_or_default()
            )?;
        }
        writeln!(f, "  ]")?;
        write!(f, "}}")
    }
}
