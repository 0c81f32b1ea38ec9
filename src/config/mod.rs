//! Global configuration management.
//!
//! The global document is a tree of named sections, each a flat mapping of
//! setting key to scalar value. Five sections are required; a missing section
//! is fatal at load, a missing key inside a present section is logged only.
//! Updates are section-scoped: the patch carries a `category` discriminator
//! and full replacement values for that section, and invalid shapes are
//! rejected at the deserialization boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::store::{Validate, Violation, YamlStore};
use crate::types::Result;

/// One flat configuration section.
pub type Section = BTreeMap<String, serde_yaml::Value>;

/// Required sections and the keys each must carry.
const SECTION_REQUIREMENTS: &[(&str, &[&str])] = &[
    ("identity-provider", &["tenant-id"]),
    (
        "authentication",
        &["app-id", "app-secret", "salt", "redirect-uri", "admin-group"],
    ),
    (
        "messaging",
        &["app-id", "app-secret", "salt", "user", "public-key", "private-key"],
    ),
    (
        "database",
        &["server", "port", "database", "username", "password", "salt"],
    ),
    ("web", &["logging-level"]),
];

/// Accepted `web.logging-level` values (case-insensitive).
const VALID_LOG_LEVELS: &[&str] = &["debug", "info", "warning", "error", "critical"];

/// The global configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct GlobalDocument {
    sections: BTreeMap<String, Section>,
}

impl GlobalDocument {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    fn set(&mut self, section: &str, key: &str, value: impl Into<serde_yaml::Value>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Apply a section-scoped patch, replacing every field of that section.
    fn apply(&mut self, patch: &ConfigPatch) {
        match patch {
            ConfigPatch::IdentityProvider { tenant_id } => {
                self.set("identity-provider", "tenant-id", tenant_id.clone());
            }
            ConfigPatch::Authentication {
                app_id,
                app_secret,
                salt,
                redirect_uri,
                admin_group,
            } => {
                self.set("authentication", "app-id", app_id.clone());
                self.set("authentication", "app-secret", app_secret.clone());
                self.set("authentication", "salt", salt.clone());
                self.set("authentication", "redirect-uri", redirect_uri.clone());
                self.set("authentication", "admin-group", admin_group.clone());
            }
            ConfigPatch::Messaging {
                app_id,
                app_secret,
                salt,
                user,
                public_key,
                private_key,
            } => {
                self.set("messaging", "app-id", app_id.clone());
                self.set("messaging", "app-secret", app_secret.clone());
                self.set("messaging", "salt", salt.clone());
                self.set("messaging", "user", user.clone());
                self.set("messaging", "public-key", public_key.clone());
                self.set("messaging", "private-key", private_key.clone());
            }
            ConfigPatch::Database {
                server,
                port,
                database,
                username,
                password,
                salt,
            } => {
                self.set("database", "server", server.clone());
                self.set("database", "port", i64::from(*port));
                self.set("database", "database", database.clone());
                self.set("database", "username", username.clone());
                self.set("database", "password", password.clone());
                self.set("database", "salt", salt.clone());
            }
            ConfigPatch::Web { logging_level } => {
                // Logging level is case-folded on write.
                self.set("web", "logging-level", logging_level.to_lowercase());
            }
        }
    }
}

impl Validate for GlobalDocument {
    fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (section, required_keys) in SECTION_REQUIREMENTS {
            let Some(present) = self.section(section) else {
                violations.push(Violation::fatal(
                    *section,
                    format!("Missing '{section}' in configuration."),
                ));
                continue;
            };

            for key in *required_keys {
                if !present.contains_key(*key) {
                    violations.push(Violation::warning(
                        format!("{section}.{key}"),
                        format!("Missing '{key}' in '{section}'"),
                    ));
                }
            }
        }

        let level = self
            .section("web")
            .and_then(|web| web.get("logging-level"))
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            violations.push(Violation::warning(
                "web.logging-level",
                format!("Invalid logging-level '{level}'"),
            ));
        }

        violations
    }
}

/// Section-scoped configuration patch.
///
/// The `category` tag selects the section; every field of that section must
/// be present. An unknown category fails deserialization before any write.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "category",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case"
)]
pub enum ConfigPatch {
    IdentityProvider {
        tenant_id: String,
    },
    Authentication {
        app_id: String,
        app_secret: String,
        salt: String,
        redirect_uri: String,
        admin_group: String,
    },
    Messaging {
        app_id: String,
        app_secret: String,
        salt: String,
        user: String,
        public_key: String,
        private_key: String,
    },
    Database {
        server: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        salt: String,
    },
    Web {
        logging_level: String,
    },
}

impl ConfigPatch {
    pub fn category(&self) -> &'static str {
        match self {
            Self::IdentityProvider { .. } => "identity-provider",
            Self::Authentication { .. } => "authentication",
            Self::Messaging { .. } => "messaging",
            Self::Database { .. } => "database",
            Self::Web { .. } => "web",
        }
    }
}

/// Owns the global document for the lifetime of one request cycle.
///
/// Durable storage is the source of truth; callers reload before every
/// read or write operation.
#[derive(Debug)]
pub struct GlobalConfig {
    store: YamlStore<GlobalDocument>,
    document: GlobalDocument,
}

impl GlobalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: YamlStore::new(path),
            document: GlobalDocument::default(),
        }
    }

    /// Reload the document from durable storage, validating section/key
    /// requirements. A missing required section aborts the load.
    pub fn load(&mut self) -> Result<()> {
        self.document = self.store.load_validated()?;
        Ok(())
    }

    pub fn document(&self) -> &GlobalDocument {
        &self.document
    }

    /// Apply a section-scoped patch and rewrite durable storage.
    ///
    /// On a write failure the file is untouched and the error is returned;
    /// the in-memory document is ahead of disk until the next load.
    pub fn update(&mut self, patch: &ConfigPatch) -> Result<()> {
        tracing::info!("Saving global config section '{}'", patch.category());

        self.document.apply(patch);
        self.store.persist(&self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_document() -> GlobalDocument {
        let yaml = r#"
identity-provider:
  tenant-id: "tenant-1"
authentication:
  app-id: "app"
  app-secret: "secret"
  salt: "s1"
  redirect-uri: "https://portal/auth"
  admin-group: "admins"
messaging:
  app-id: "bot"
  app-secret: "secret"
  salt: "s2"
  user: "bot@example.org"
  public-key: "pub"
  private-key: "priv"
database:
  server: "db"
  port: 1433
  database: "atrium"
  username: "svc"
  password: "pw"
  salt: "s3"
web:
  logging-level: "info"
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn complete_document_has_no_violations() {
        assert!(sample_document().validate().is_empty());
    }

    #[test]
    fn missing_section_is_fatal() {
        let mut doc = sample_document();
        doc.sections.remove("database");

        let violations = doc.validate();
        assert!(violations.iter().any(|v| v.fatal && v.field == "database"));
    }

    #[test]
    fn missing_key_is_warning_only() {
        let mut doc = sample_document();
        doc.sections
            .get_mut("authentication")
            .unwrap()
            .remove("salt");

        let violations = doc.validate();
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].fatal);
    }

    #[test]
    fn invalid_logging_level_is_warning_only() {
        let mut doc = sample_document();
        doc.set("web", "logging-level", "verbose");

        let violations = doc.validate();
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].fatal);
        assert_eq!(violations[0].field, "web.logging-level");
    }

    #[test]
    fn unknown_category_is_rejected_at_deserialization() {
        let patch: std::result::Result<ConfigPatch, _> = serde_json::from_value(
            serde_json::json!({"category": "plugins", "tenant-id": "x"}),
        );
        assert!(patch.is_err());
    }

    #[test]
    fn partial_section_patch_is_rejected() {
        // All fields of the selected section must be present.
        let patch: std::result::Result<ConfigPatch, _> = serde_json::from_value(
            serde_json::json!({"category": "authentication", "app-id": "x"}),
        );
        assert!(patch.is_err());
    }

    #[test]
    fn web_patch_lowercases_and_touches_only_web() {
        let mut doc = sample_document();
        let before = doc.clone();

        doc.apply(&ConfigPatch::Web {
            logging_level: "DEBUG".into(),
        });

        assert_eq!(
            doc.section("web").unwrap().get("logging-level"),
            Some(&serde_yaml::Value::from("debug"))
        );
        for name in ["identity-provider", "authentication", "messaging", "database"] {
            assert_eq!(doc.section(name), before.section(name));
        }
    }

    #[test]
    fn update_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.yaml");
        std::fs::write(&path, serde_yaml::to_string(&sample_document()).unwrap()).unwrap();

        let mut config = GlobalConfig::new(&path);
        config.load().unwrap();
        config
            .update(&ConfigPatch::IdentityProvider {
                tenant_id: "tenant-2".into(),
            })
            .unwrap();

        let reloaded: GlobalDocument =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            reloaded.section("identity-provider").unwrap().get("tenant-id"),
            Some(&serde_yaml::Value::from("tenant-2"))
        );
    }
}
