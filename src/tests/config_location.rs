// Config file lookup: override folder, fixed default folder, bundled defaults.

#[cfg(test)]
mod test {

    use std::fs;
    use std::path::Path;

    use serial_test::serial;
    use tempfile::TempDir;

    use crate::config::proc_loader::{ConfigLocator, ConfigOrigin, BUNDLED_CONFIG};
    use crate::error::ConfigurationLoadError;
    use crate::utils::constants::{CONFIG_FILE_NAME, CONFIG_FOLDER_ENV};

    fn write_config(dir: &Path, client_id: &str) {
        let content = format!(
            r#"
version: 1.0.0
released: 2017-11-01
oauth_client_id: {client_id}
oauth_client_secret: ${{REDCAP_INTEGRATION_TEST_MP_SECRET:fallback-secret}}
management_portal_url: https://mp.example.org/managementportal/
token_endpoint: oauth/token
project_endpoint: api/projects/
subject_endpoint: api/subjects
projects:
  - redcap_info:
      url: https://redcap.example.org
      project_id: 10
    mp_info:
      project_name: radar
settings:
  authority:
    scopes: [SUBJECT.CREATE, PROJECT.READ]
    failure_cooldown_seconds: 5
"#
        );
        fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
    }

    #[tokio::test]
    async fn override_folder_wins_over_default_folder() {
        let override_dir = TempDir::new().unwrap();
        let default_dir = TempDir::new().unwrap();
        write_config(override_dir.path(), "from-override");
        write_config(default_dir.path(), "from-default");

        let locator = ConfigLocator::new(
            Some(override_dir.path().to_owned()),
            default_dir.path().to_owned(),
            None,
        );
        assert_eq!(
            locator.locate().unwrap(),
            ConfigOrigin::File(override_dir.path().join(CONFIG_FILE_NAME))
        );

        let snapshot = locator.load().await.unwrap();
        assert_eq!(snapshot.oauth_client_id(), "from-override");
        assert_eq!(snapshot.settings().authority.scopes, vec!["SUBJECT.CREATE", "PROJECT.READ"]);
        assert_eq!(snapshot.settings().authority.failure_cooldown_seconds, 5);
    }

    #[tokio::test]
    async fn falls_back_to_default_folder() {
        let empty_override = TempDir::new().unwrap();
        let default_dir = TempDir::new().unwrap();
        write_config(default_dir.path(), "from-default");

        let locator = ConfigLocator::new(
            Some(empty_override.path().to_owned()),
            default_dir.path().to_owned(),
            None,
        );
        let snapshot = locator.load().await.unwrap();
        assert_eq!(snapshot.oauth_client_id(), "from-default");
    }

    #[tokio::test]
    async fn falls_back_to_bundled_defaults() {
        let empty = TempDir::new().unwrap();
        let locator = ConfigLocator::new(None, empty.path().to_owned(), Some(BUNDLED_CONFIG));
        assert_eq!(locator.locate().unwrap(), ConfigOrigin::Bundled);
        assert!(locator.load().await.is_ok());
    }

    #[tokio::test]
    async fn missing_everywhere_is_not_found() {
        let empty = TempDir::new().unwrap();
        let locator = ConfigLocator::new(None, empty.path().to_owned(), None);
        match locator.load().await {
            Err(ConfigurationLoadError::NotFound { file_name, searched }) => {
                assert_eq!(file_name, CONFIG_FILE_NAME);
                assert_eq!(searched, vec![empty.path().join(CONFIG_FILE_NAME)]);
            }
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn malformed_yaml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "version: [unterminated").unwrap();

        let locator = ConfigLocator::new(None, dir.path().to_owned(), Some(BUNDLED_CONFIG));
        assert!(matches!(
            locator.load().await,
            Err(ConfigurationLoadError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn schema_mismatch_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "version: 1.0.0\nprojects: []\n").unwrap();

        let locator = ConfigLocator::new(None, dir.path().to_owned(), None);
        assert!(matches!(
            locator.load().await,
            Err(ConfigurationLoadError::Parse { .. })
        ));
    }

    #[tokio::test]
    #[serial]
    async fn env_folder_and_secret_expansion() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), "from-env-folder");
        std::env::set_var(CONFIG_FOLDER_ENV, dir.path());
        std::env::set_var("REDCAP_INTEGRATION_TEST_MP_SECRET", "env-secret");

        let locator = ConfigLocator::from_env();
        let loaded = locator.load().await;

        std::env::remove_var(CONFIG_FOLDER_ENV);
        std::env::remove_var("REDCAP_INTEGRATION_TEST_MP_SECRET");

        let snapshot = loaded.unwrap();
        assert_eq!(locator.candidates()[0], dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(snapshot.oauth_client_id(), "from-env-folder");
        assert_eq!(snapshot.oauth_client_secret(), "env-secret");
    }

    #[tokio::test]
    #[serial]
    async fn unset_secret_uses_inline_default() {
        std::env::remove_var("REDCAP_INTEGRATION_TEST_MP_SECRET");
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), "id");

        let locator = ConfigLocator::new(None, dir.path().to_owned(), None);
        let snapshot = locator.load().await.unwrap();
        assert_eq!(snapshot.oauth_client_secret(), "fallback-secret");
    }
}
