//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks credentials, endpoint templates, project mappings and settings
//! - Mapping keys must be unique after URL normalization; duplicates are rejected
//! - Plain-HTTP instances are accepted but logged as warnings

use std::collections::HashMap;

use tracing::{error, info, warn};
use url::Url;

use crate::config::settings::SettingsConfig;
use crate::config::snapshot::{ConfigDocument, ProjectInfo};
use crate::routing::instance_key::SourceInstanceKey;
use crate::utils::constants::LOG_LEVELS;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_document(doc: &ConfigDocument) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_credentials(doc, &mut errors);
    validate_authority(doc, &mut errors);
    validate_projects(&doc.projects, &mut errors);
    validate_settings(&doc.settings, &mut errors);

    if errors.is_empty() {
        info!(projects = doc.projects.len(), "config is valid");
        Ok(())
    } else {
        for e in &errors {
            error!("config error: {}", e);
        }
        Err(errors)
    }
}

fn validate_credentials(doc: &ConfigDocument, errors: &mut Vec<String>) {
    if doc.oauth_client_id.trim().is_empty() {
        errors.push("config: 'oauth_client_id' must not be empty".to_string());
    }
    if doc.oauth_client_secret.trim().is_empty() {
        errors.push("config: 'oauth_client_secret' must not be empty".to_string());
    }
}

fn validate_authority(doc: &ConfigDocument, errors: &mut Vec<String>) {
    // a malformed base URL is reported when endpoints are composed at startup
    match Url::parse(doc.management_portal_url.trim()) {
        Ok(url) if url.scheme() != "https" => {
            warn!(
                url = %url,
                "the provided Management Portal instance is not using an encrypted connection"
            );
        }
        Ok(_) => {}
        Err(_) if doc.management_portal_url.trim().is_empty() => {
            errors.push("config: 'management_portal_url' must not be empty".to_string());
        }
        Err(_) => {}
    }

    for (name, value) in [
        ("token_endpoint", &doc.token_endpoint),
        ("project_endpoint", &doc.project_endpoint),
        ("subject_endpoint", &doc.subject_endpoint),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("config: '{}' must not be empty", name));
        }
    }
}

fn validate_projects(projects: &[ProjectInfo], errors: &mut Vec<String>) {
    if projects.is_empty() {
        errors.push("config: 'projects' is empty; at least one mapping required".to_string());
        return;
    }

    let mut seen: HashMap<SourceInstanceKey, usize> = HashMap::new();
    for (idx, project) in projects.iter().enumerate() {
        if project.mp_info.project_name.trim().is_empty() {
            errors.push(format!(
                "projects[{}].mp_info.project_name must not be empty",
                idx
            ));
        }

        let key = match SourceInstanceKey::new(
            &project.redcap_info.url,
            project.redcap_info.project_id,
        ) {
            Ok(key) => key,
            Err(e) => {
                errors.push(format!(
                    "projects[{}].redcap_info.url '{}' is not a valid URL: {}",
                    idx, project.redcap_info.url, e
                ));
                continue;
            }
        };

        if !key.is_secure() {
            warn!(instance = %key, "the provided REDCap instance is not using an encrypted connection");
        }

        if let Some(first) = seen.get(&key) {
            errors.push(format!(
                "projects[{}] duplicates projects[{}]: {}",
                idx, first, key
            ));
        } else {
            seen.insert(key, idx);
        }
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(logging) = &settings.logging {
        let level = logging.level.trim().to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' is invalid; allowed: {}",
                logging.level,
                LOG_LEVELS.join(", ")
            ));
        }
    }

    let authority = &settings.authority;
    if authority.scopes.is_empty() {
        errors.push("settings.authority.scopes must not be empty".to_string());
    }
    if authority.request_timeout_ms == 0 {
        errors.push("settings.authority.request_timeout_ms must be > 0".to_string());
    }

    if settings.metrics.is_enabled && !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::snapshot::tests::document;

    #[test]
    fn accepts_minimal_document() {
        assert!(validate_document(&document("https://mp.example.org/")).is_ok());
    }

    #[test]
    fn aggregates_all_issues() {
        let mut doc = document("https://mp.example.org/");
        doc.oauth_client_id = " ".to_owned();
        doc.subject_endpoint = String::new();
        doc.projects[0].mp_info.project_name = String::new();

        let errors = validate_document(&doc).unwrap_err();
        assert_eq!(errors.len(), 3, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("oauth_client_id")));
        assert!(errors.iter().any(|e| e.contains("subject_endpoint")));
        assert!(errors.iter().any(|e| e.contains("project_name")));
    }

    #[test]
    fn rejects_duplicates_after_normalization() {
        let mut doc = document("https://mp.example.org/");
        let mut duplicate = doc.projects[0].clone();
        duplicate.redcap_info.url = "HTTPS://REDCAP.example.org".to_owned();
        duplicate.mp_info.project_name = "other".to_owned();
        doc.projects.push(duplicate);

        let errors = validate_document(&doc).unwrap_err();
        assert_eq!(
            errors,
            vec!["projects[1] duplicates projects[0]: https://redcap.example.org (project 10)"]
        );
    }

    #[test]
    fn same_url_different_project_is_not_a_duplicate() {
        let mut doc = document("https://mp.example.org/");
        let mut other = doc.projects[0].clone();
        other.redcap_info.project_id = 11;
        doc.projects.push(other);
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn rejects_unparsable_source_url_and_empty_projects() {
        let mut doc = document("https://mp.example.org/");
        doc.projects[0].redcap_info.url = "redcap without scheme".to_owned();
        let errors = validate_document(&doc).unwrap_err();
        assert!(errors[0].contains("is not a valid URL"));

        doc.projects.clear();
        let errors = validate_document(&doc).unwrap_err();
        assert!(errors[0].contains("'projects' is empty"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut doc = document("https://mp.example.org/");
        doc.settings.logging = Some(crate::config::settings::LoggingConfig::new(
            "verbose".to_owned(),
            crate::config::settings::LogFormat::Json,
        ));
        let errors = validate_document(&doc).unwrap_err();
        assert!(errors[0].contains("settings.logging.level 'verbose'"));
    }
}
