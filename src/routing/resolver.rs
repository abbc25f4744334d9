use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::snapshot::{
    ConfigurationSnapshot, DestinationProject, ProjectMapping, SourceInstance,
};
use crate::error::UnknownInstanceError;
use crate::observability::metrics::get_metrics;
use crate::routing::instance_key::SourceInstanceKey;

static HIT_MSG: &str = "hit";
static MISS_MSG: &str = "miss";

/// Static routing table from source instances to destination projects.
///
/// Keys are normalized when the snapshot is built, so a lookup is a plain
/// hash lookup on the normalized caller key.
#[derive(Debug, Clone, Default)]
pub struct InstanceResolver {
    mappings: HashMap<SourceInstanceKey, ProjectMapping>,
}

impl InstanceResolver {
    pub fn from_snapshot(snapshot: &ConfigurationSnapshot) -> Self {
        Self::from_mappings(snapshot.mappings().iter().cloned())
    }

    /// Build from arbitrary mappings. A validated snapshot never carries
    /// duplicate keys; for other inputs the first mapping of a key wins.
    pub fn from_mappings(mappings: impl IntoIterator<Item = ProjectMapping>) -> Self {
        let mut table = HashMap::new();
        for mapping in mappings {
            let key = mapping.source.key().clone();
            if table.contains_key(&key) {
                warn!(instance = %key, "duplicate mapping ignored");
                continue;
            }
            table.insert(key, mapping);
        }
        Self { mappings: table }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn is_known_instance(&self, url: &str, project_id: u32) -> bool {
        self.lookup(url, project_id).is_ok()
    }

    pub fn resolve_destination(
        &self,
        url: &str,
        project_id: u32,
    ) -> Result<&DestinationProject, UnknownInstanceError> {
        self.lookup(url, project_id).map(|m| &m.destination)
    }

    /// Canonical stored key for a caller-supplied URL.
    pub fn resolve_source_info(
        &self,
        url: &str,
        project_id: u32,
    ) -> Result<&SourceInstanceKey, UnknownInstanceError> {
        self.lookup(url, project_id).map(|m| m.source.key())
    }

    pub fn resolve_source_instance(
        &self,
        url: &str,
        project_id: u32,
    ) -> Result<&SourceInstance, UnknownInstanceError> {
        self.lookup(url, project_id).map(|m| &m.source)
    }

    fn lookup(&self, url: &str, project_id: u32) -> Result<&ProjectMapping, UnknownInstanceError> {
        let metrics = get_metrics();
        let found = SourceInstanceKey::new(url, project_id)
            .ok()
            .and_then(|key| self.mappings.get(&key));

        match found {
            Some(mapping) => {
                metrics.instance_lookups.with_label_values(&[HIT_MSG]).inc();
                debug!(instance = %mapping.source.key(), project = mapping.destination.project_name(), "instance resolved");
                Ok(mapping)
            }
            None => {
                metrics.instance_lookups.with_label_values(&[MISS_MSG]).inc();
                warn!(url, project_id, "no mapping for instance");
                Err(UnknownInstanceError {
                    url: url.to_owned(),
                    project_id,
                })
            }
        }
    }
}
