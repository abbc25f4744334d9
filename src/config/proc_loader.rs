use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error, info};

use crate::config::snapshot::{ConfigDocument, ConfigurationSnapshot};
use crate::error::ConfigurationLoadError;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{CONFIG_FILE_NAME, CONFIG_FOLDER_ENV, DEFAULT_CONFIG_FOLDER};

/// Default document shipped inside the binary, used when no file is found.
pub const BUNDLED_CONFIG: &str = include_str!("../../config/radar.yml");

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("env var pattern is valid"));

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Bundled,
}

/// Ordered list of places to look for `radar.yml`. The first existing file
/// wins; the bundled document is the last resort.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    candidates: Vec<PathBuf>,
    bundled: Option<&'static str>,
}

impl ConfigLocator {
    pub fn new(
        override_dir: Option<PathBuf>,
        default_dir: PathBuf,
        bundled: Option<&'static str>,
    ) -> Self {
        let candidates = override_dir
            .into_iter()
            .chain(std::iter::once(default_dir))
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .collect();
        Self { candidates, bundled }
    }

    /// Override folder from `REDCAP_INTEGRATION_CONFIG_FOLDER`, then the fixed
    /// default folder, then the bundled document.
    pub fn from_env() -> Self {
        let override_dir = std::env::var(CONFIG_FOLDER_ENV)
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        Self::with_override(override_dir)
    }

    pub fn with_override(override_dir: Option<PathBuf>) -> Self {
        Self::new(
            override_dir,
            PathBuf::from(DEFAULT_CONFIG_FOLDER),
            Some(BUNDLED_CONFIG),
        )
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn locate(&self) -> Result<ConfigOrigin, ConfigurationLoadError> {
        if let Some(path) = self.candidates.iter().find(|path| path.is_file()) {
            return Ok(ConfigOrigin::File(path.to_owned()));
        }
        if self.bundled.is_some() {
            return Ok(ConfigOrigin::Bundled);
        }
        error!(
            "config file {} cannot be found at {:?} or in the bundled defaults",
            CONFIG_FILE_NAME, self.candidates
        );
        Err(ConfigurationLoadError::NotFound {
            file_name: CONFIG_FILE_NAME.to_owned(),
            searched: self.candidates.clone(),
        })
    }

    /// Locate, read, expand and parse the configuration.
    pub async fn load(&self) -> Result<ConfigurationSnapshot, ConfigurationLoadError> {
        match (self.locate()?, self.bundled) {
            (ConfigOrigin::File(path), _) => file_to_config(&path).await,
            (ConfigOrigin::Bundled, Some(content)) => {
                info!("loading bundled config");
                parse_config(content, "bundled defaults").await
            }
            (ConfigOrigin::Bundled, None) => Err(ConfigurationLoadError::NotFound {
                file_name: CONFIG_FILE_NAME.to_owned(),
                searched: self.candidates.clone(),
            }),
        }
    }
}

/// Load and validate config from a YAML file
pub async fn file_to_config(path: &Path) -> Result<ConfigurationSnapshot, ConfigurationLoadError> {
    info!("loading config file located at: {}", path.display());
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigurationLoadError::Read {
            path: path.to_owned(),
            source,
        })?;
    parse_config(&content, &path.display().to_string()).await
}

pub async fn parse_config(
    content: &str,
    origin: &str,
) -> Result<ConfigurationSnapshot, ConfigurationLoadError> {
    let metrics = get_metrics();
    let expanded = expand_env_vars(content);

    let document: ConfigDocument = serde_yaml::from_str(&expanded).map_err(|source| {
        error!("parse config error: {}", source);
        metrics.config_parse_failures.inc();
        ConfigurationLoadError::Parse {
            origin: origin.to_owned(),
            source,
        }
    })?;

    debug!("validating config ...");
    ConfigurationSnapshot::from_document(document).inspect_err(|e| {
        if let ConfigurationLoadError::Invalid(errors) = e {
            metrics.config_validation_errors.inc_by(errors.len() as u64);
        }
    })
}

/// Replace `${VAR}` and `${VAR:default}` with values from the environment.
fn expand_env_vars(input: &str) -> String {
    ENV_VAR
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn expands_env_vars_with_defaults() {
        std::env::set_var("REDCAP_INTEGRATION_TEST_SECRET", "s3cr3t");
        let out = expand_env_vars(
            "secret: ${REDCAP_INTEGRATION_TEST_SECRET}\nid: ${REDCAP_INTEGRATION_TEST_UNSET:fallback}",
        );
        assert_eq!(out, "secret: s3cr3t\nid: fallback");
        std::env::remove_var("REDCAP_INTEGRATION_TEST_SECRET");
    }

    #[test]
    fn candidate_order_is_override_then_default() {
        let locator = ConfigLocator::new(
            Some(PathBuf::from("/custom")),
            PathBuf::from("/default"),
            None,
        );
        assert_eq!(
            locator.candidates(),
            &[
                PathBuf::from("/custom/radar.yml"),
                PathBuf::from("/default/radar.yml")
            ]
        );
    }

    #[tokio::test]
    async fn bundled_config_is_valid() {
        let snapshot = parse_config(BUNDLED_CONFIG, "bundled defaults").await.unwrap();
        assert!(!snapshot.mappings().is_empty());
    }
}
