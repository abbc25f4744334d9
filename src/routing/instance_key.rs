use std::fmt;

use url::Url;

/// Lookup key of a source instance: normalized base URL plus project id.
///
/// Two keys are equal iff both normalized URLs and project ids are equal, so
/// the normalization below is the whole matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceInstanceKey {
    url: String,
    project_id: u32,
}

impl SourceInstanceKey {
    pub fn new(url: &str, project_id: u32) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: normalize_url(url)?,
            project_id,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn project_id(&self) -> u32 {
        self.project_id
    }

    pub fn is_secure(&self) -> bool {
        self.url.starts_with("https://")
    }
}

impl fmt::Display for SourceInstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (project {})", self.url, self.project_id)
    }
}

/// Canonical form of a source instance URL.
///
/// Scheme and host are lower-cased and the default port dropped (by `Url`),
/// query and fragment are removed, trailing slashes are stripped. Path case is
/// preserved.
pub fn normalize_url(raw: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.as_str().trim_end_matches('/').to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_scheme_and_host_case_and_trailing_slash() {
        let a = SourceInstanceKey::new("HTTPS://Redcap.Example.org/", 10).unwrap();
        let b = SourceInstanceKey::new("https://redcap.example.org", 10).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.url(), "https://redcap.example.org");
    }

    #[test]
    fn normalization_drops_default_port_query_and_fragment() {
        assert_eq!(
            normalize_url("https://redcap.example.org:443/redcap/?pid=10#top").unwrap(),
            "https://redcap.example.org/redcap"
        );
    }

    #[test]
    fn path_case_and_project_id_are_significant() {
        let base = SourceInstanceKey::new("https://redcap.example.org/redcap", 10).unwrap();
        assert_ne!(
            base,
            SourceInstanceKey::new("https://redcap.example.org/REDCap", 10).unwrap()
        );
        assert_ne!(
            base,
            SourceInstanceKey::new("https://redcap.example.org/redcap", 11).unwrap()
        );
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(SourceInstanceKey::new("redcap.example.org", 1).is_err());
    }

    #[test]
    fn secure_only_for_https() {
        assert!(SourceInstanceKey::new("https://a.org", 1).unwrap().is_secure());
        assert!(!SourceInstanceKey::new("http://a.org", 1).unwrap().is_secure());
    }
}
