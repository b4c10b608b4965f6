//! Module facts declared in a YAML manifest.
//!
//! ```yaml
//! modules:
//!   - id: web.ServerModule
//!     requires: [http.Runtime]
//!     after: [core.ConfigModule]
//!     order: -10
//!     application_kind: servlet
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::autoconfigure::metadata::{
    MetadataSource, AUTO_CONFIGURE_AFTER, AUTO_CONFIGURE_BEFORE, AUTO_CONFIGURE_ORDER,
    CONDITIONAL_ON_APPLICATION_KIND, CONDITIONAL_ON_CAPABILITY,
};
use crate::error::{AutowireError, Result};

/// One module entry of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleEntry {
    pub id: String,

    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub before: Vec<String>,

    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub order: Option<i32>,

    #[serde(default)]
    pub application_kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    modules: Vec<ModuleEntry>,
}

/// A live metadata source backed by a module manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestMetadataSource {
    modules: IndexMap<String, ModuleEntry>,
}

impl ManifestMetadataSource {
    /// Build from entries; a repeated id replaces the earlier entry.
    pub fn from_entries(entries: impl IntoIterator<Item = ModuleEntry>) -> Self {
        Self {
            modules: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    /// Parse a manifest; `location` is used in error messages.
    pub fn from_yaml(location: &str, content: &str) -> Result<Self> {
        let manifest: Manifest =
            serde_yaml::from_str(content).map_err(|e| AutowireError::ConfigLoad {
                location: location.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::from_entries(manifest.modules))
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&path.display().to_string(), &content)
    }

    /// Module ids in declaration order.
    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn get(&self, module: &str) -> Option<&ModuleEntry> {
        self.modules.get(module)
    }
}

fn joined(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

impl MetadataSource for ManifestMetadataSource {
    fn was_processed(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    fn read(&self, module: &str, attribute: &str) -> Option<String> {
        let entry = self.modules.get(module)?;
        match attribute {
            CONDITIONAL_ON_CAPABILITY => joined(&entry.requires),
            AUTO_CONFIGURE_BEFORE => joined(&entry.before),
            AUTO_CONFIGURE_AFTER => joined(&entry.after),
            AUTO_CONFIGURE_ORDER => entry.order.map(|o| o.to_string()),
            CONDITIONAL_ON_APPLICATION_KIND => entry.application_kind.clone(),
            _ => None,
        }
    }
}
