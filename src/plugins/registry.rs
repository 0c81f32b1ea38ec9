//! Plugin registry operations.

use std::path::PathBuf;
use std::sync::Arc;

use crate::audit::AuditSink;
use crate::plugins::{validate_allow_list, PluginRecord, PluginUpdate, PluginView};
use crate::store::YamlStore;
use crate::types::{Error, Result};

/// Owns the ordered plugin collection for the lifetime of one request
/// cycle. Durable storage is the source of truth; callers reload before
/// every read or write operation.
#[derive(Debug)]
pub struct PluginRegistry {
    store: YamlStore<Vec<PluginRecord>>,
    records: Vec<PluginRecord>,
    audit: Arc<dyn AuditSink>,
}

impl PluginRegistry {
    pub fn new(path: impl Into<PathBuf>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store: YamlStore::new(path),
            records: Vec::new(),
            audit,
        }
    }

    /// Reload the collection from durable storage.
    ///
    /// Entries that do not deserialize into a complete record (missing
    /// required fields, `allowed-ip` not a list) are dropped with a
    /// warning rather than failing the load. An empty document is an
    /// empty collection.
    pub fn load(&mut self) -> Result<()> {
        let raw: Option<Vec<serde_yaml::Value>> =
            YamlStore::new(self.store.path()).load()?;

        self.records = raw
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                let label = entry
                    .get("name")
                    .and_then(serde_yaml::Value::as_str)
                    .unwrap_or("?")
                    .to_string();

                match serde_yaml::from_value::<PluginRecord>(entry) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        tracing::warn!(
                            "Removing invalid plugin entry '{label}' at index {idx}: {err}"
                        );
                        None
                    }
                }
            })
            .collect();

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|record| record.name == name)
    }

    /// All records with derived callback routes, in stored order.
    pub fn list(&self) -> Vec<PluginView> {
        self.records.iter().map(PluginView::from).collect()
    }

    /// One record by name, with its derived callback route.
    pub fn get(&self, name: &str) -> Option<PluginView> {
        self.records
            .iter()
            .find(|record| record.name == name)
            .map(PluginView::from)
    }

    /// Register a new plugin.
    ///
    /// Fails on a duplicate name or an invalid allow-list; neither failure
    /// writes to durable storage.
    pub async fn register(&mut self, record: PluginRecord) -> Result<()> {
        tracing::info!("Attempting to register plugin '{}'", record.name);

        if self.contains(&record.name) {
            tracing::error!("Plugin '{}' already exists.", record.name);
            return Err(Error::validation(format!(
                "plugin '{}' already exists",
                record.name
            )));
        }

        validate_allow_list(&record.webhook.allowed_ip)?;

        let name = record.name.clone();
        self.records.push(record);
        self.store.persist(&self.records)?;

        self.audit
            .log(&format!("Plugin '{name}' registered successfully."))
            .await;
        Ok(())
    }

    /// Overwrite an existing plugin, matched by `plugin_name`.
    ///
    /// The allow-list is validated before any mutation: a failed update
    /// leaves both the in-memory collection and durable storage untouched.
    pub async fn update(&mut self, patch: PluginUpdate) -> Result<()> {
        tracing::info!("Attempting to update plugin '{}'", patch.plugin_name);

        let Some(idx) = self
            .records
            .iter()
            .position(|record| record.name == patch.plugin_name)
        else {
            tracing::error!("Cannot update plugin. Entry '{}' not found", patch.plugin_name);
            return Err(Error::not_found(format!(
                "plugin '{}' not found",
                patch.plugin_name
            )));
        };

        validate_allow_list(&patch.webhook.allowed_ip)?;

        let record = &mut self.records[idx];
        record.name = patch.name;
        record.description = patch.description;
        record.webhook = patch.webhook;
        let name = record.name.clone();

        self.store.persist(&self.records)?;

        self.audit
            .log(&format!("Plugin '{name}' updated successfully."))
            .await;
        Ok(())
    }

    /// Remove a plugin by name and persist the remainder.
    pub async fn delete(&mut self, name: &str) -> Result<()> {
        tracing::warn!("Attempting to delete plugin '{name}'");

        let Some(idx) = self.records.iter().position(|record| record.name == name) else {
            tracing::error!("Cannot delete plugin. Entry '{name}' not found");
            return Err(Error::not_found(format!("plugin '{name}' not found")));
        };

        self.records.remove(idx);
        self.store.persist(&self.records)?;

        self.audit
            .log(&format!("Plugin '{name}' deleted successfully."))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::RecordingSink;
    use crate::plugins::WebhookConfig;
    use pretty_assertions::assert_eq;

    fn sample_record(name: &str) -> PluginRecord {
        PluginRecord {
            name: name.to_string(),
            description: "Ticket sync integration".to_string(),
            webhook: WebhookConfig {
                url: "new ticket".to_string(),
                secret: "hunter2".to_string(),
                auth_type: "hmac".to_string(),
                allowed_ip: vec!["10.0.0.5".to_string(), "192.168.0.0/24".to_string()],
            },
        }
    }

    fn registry_in(dir: &tempfile::TempDir) -> (PluginRegistry, Arc<RecordingSink>) {
        let audit = Arc::new(RecordingSink::default());
        let path = dir.path().join("plugins.yaml");
        std::fs::write(&path, "[]\n").unwrap();
        (PluginRegistry::new(path, audit.clone()), audit)
    }

    #[tokio::test]
    async fn register_then_get_returns_record_with_safe_url() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, audit) = registry_in(&dir);
        registry.load().unwrap();

        registry.register(sample_record("tickets")).await.unwrap();

        let view = registry.get("tickets").unwrap();
        assert_eq!(view.record.name, "tickets");
        assert_eq!(view.safe_url, "/plugin/tickets/new_ticket");

        let lines = audit.lines.lock().await;
        assert_eq!(
            lines.as_slice(),
            ["Plugin 'tickets' registered successfully."]
        );
    }

    #[tokio::test]
    async fn register_duplicate_name_fails_and_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, _audit) = registry_in(&dir);
        registry.load().unwrap();

        registry.register(sample_record("tickets")).await.unwrap();
        let before = registry.list().len();

        let result = registry.register(sample_record("tickets")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(registry.len(), before);
    }

    #[tokio::test]
    async fn register_invalid_allow_list_fails_without_write() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, audit) = registry_in(&dir);
        registry.load().unwrap();

        let mut record = sample_record("tickets");
        record.webhook.allowed_ip = vec!["999.1.1.1".to_string()];

        let result = registry.register(record).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        // Nothing persisted, nothing audited.
        let on_disk = std::fs::read_to_string(dir.path().join("plugins.yaml")).unwrap();
        assert_eq!(on_disk, "[]\n");
        assert!(audit.lines.lock().await.is_empty());
    }

    #[tokio::test]
    async fn update_renames_record_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, _audit) = registry_in(&dir);
        registry.load().unwrap();
        registry.register(sample_record("tickets")).await.unwrap();

        let patch = PluginUpdate {
            plugin_name: "tickets".to_string(),
            name: "tickets-v2".to_string(),
            description: "Renamed".to_string(),
            webhook: sample_record("tickets").webhook,
        };
        registry.update(patch).await.unwrap();

        assert!(!registry.contains("tickets"));
        assert!(registry.contains("tickets-v2"));

        registry.load().unwrap();
        assert!(registry.contains("tickets-v2"));
    }

    #[tokio::test]
    async fn update_unknown_plugin_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, _audit) = registry_in(&dir);
        registry.load().unwrap();

        let patch = PluginUpdate {
            plugin_name: "ghost".to_string(),
            name: "ghost".to_string(),
            description: String::new(),
            webhook: sample_record("ghost").webhook,
        };
        assert!(matches!(registry.update(patch).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn update_with_invalid_allow_list_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, _audit) = registry_in(&dir);
        registry.load().unwrap();
        registry.register(sample_record("tickets")).await.unwrap();

        let mut webhook = sample_record("tickets").webhook;
        webhook.allowed_ip = vec!["not-an-ip".to_string()];
        let patch = PluginUpdate {
            plugin_name: "tickets".to_string(),
            name: "tickets-v2".to_string(),
            description: "Renamed".to_string(),
            webhook,
        };

        assert!(registry.update(patch).await.is_err());
        let view = registry.get("tickets").unwrap();
        assert_eq!(view.record.description, "Ticket sync integration");
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, audit) = registry_in(&dir);
        registry.load().unwrap();
        registry.register(sample_record("tickets")).await.unwrap();
        registry.register(sample_record("alerts")).await.unwrap();

        registry.delete("tickets").await.unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("alerts"));

        assert!(matches!(
            registry.delete("tickets").await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(registry.len(), 1);

        let lines = audit.lines.lock().await;
        assert!(lines.contains(&"Plugin 'tickets' deleted successfully.".to_string()));
    }

    #[tokio::test]
    async fn load_drops_incomplete_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugins.yaml");
        // First entry is missing webhook.secret; second is complete.
        std::fs::write(
            &path,
            r#"
- name: broken
  description: missing secret
  webhook:
    url: hook
    auth-type: none
    allowed-ip: []
- name: tickets
  description: ok
  webhook:
    url: hook
    secret: s
    auth-type: none
    allowed-ip:
      - 10.0.0.5
"#,
        )
        .unwrap();

        let mut registry =
            PluginRegistry::new(&path, Arc::new(RecordingSink::default()));
        registry.load().unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("tickets"));
    }

    #[tokio::test]
    async fn load_of_empty_document_is_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugins.yaml");
        std::fs::write(&path, "").unwrap();

        let mut registry =
            PluginRegistry::new(&path, Arc::new(RecordingSink::default()));
        registry.load().unwrap();
        assert!(registry.is_empty());
    }
}
