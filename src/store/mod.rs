//! Validated document store.
//!
//! Both durable documents (global configuration and the plugin list) share
//! the same load/validate/persist cycle over a YAML file on local disk.
//! Persistence writes a sibling temp file and renames it into place so a
//! failed write never leaves a truncated document behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::types::{Error, Result};

/// A single validation finding.
///
/// Non-fatal violations are logged and the document is served anyway;
/// fatal violations abort the load.
#[derive(Debug, Clone)]
pub struct Violation {
    pub field: String,
    pub message: String,
    pub fatal: bool,
}

impl Violation {
    pub fn fatal(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            fatal: true,
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            fatal: false,
        }
    }
}

/// Structural validation over a loaded document.
pub trait Validate {
    fn validate(&self) -> Vec<Violation>;
}

/// YAML-backed document store.
#[derive(Debug)]
pub struct YamlStore<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> YamlStore<T>
where
    T: DeserializeOwned + Serialize,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the backing file.
    pub fn load(&self) -> Result<T> {
        let raw = fs::read_to_string(&self.path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                tracing::error!("Configuration file not found: {}", self.path.display());
                Error::not_found(format!(
                    "configuration file not found: {}",
                    self.path.display()
                ))
            } else {
                Error::Io(err)
            }
        })?;

        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Load and run structural validation.
    ///
    /// Every violation is logged; the first fatal one aborts the load.
    pub fn load_validated(&self) -> Result<T>
    where
        T: Validate,
    {
        let doc = self.load()?;

        let mut first_fatal: Option<Violation> = None;
        for violation in doc.validate() {
            if violation.fatal {
                tracing::error!("{}: {}", violation.field, violation.message);
                if first_fatal.is_none() {
                    first_fatal = Some(violation);
                }
            } else {
                tracing::warn!("{}: {}", violation.field, violation.message);
            }
        }

        match first_fatal {
            Some(violation) => Err(Error::validation(violation.message)),
            None => Ok(doc),
        }
    }

    /// Rewrite the backing file atomically (temp file + rename).
    pub fn persist(&self, doc: &T) -> Result<()> {
        let raw = serde_yaml::to_string(doc)?;
        let tmp = self.path.with_extension("tmp");

        fs::write(&tmp, raw)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|err| {
                tracing::error!("Failed to save {}: {}", self.path.display(), err);
                Error::persistence(format!(
                    "failed to write {}: {err}",
                    self.path.display()
                ))
            })
    }
}
