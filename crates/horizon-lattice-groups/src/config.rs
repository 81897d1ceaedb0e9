//! Configuration for group models.
//!
//! ```
//! use horizon_lattice_groups::GroupModelConfig;
//!
//! let config = GroupModelConfig::from_toml_str(r#"
//! default_collapseable = false
//! persistence_key = ".columnGroups"
//! "#).unwrap();
//!
//! assert!(!config.default_collapseable);
//! assert!(!config.default_unbreakable);
//! assert_eq!(config.persistence_key, ".columnGroups");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default suffix of the property key holding a model's saved state.
pub const DEFAULT_PERSISTENCE_KEY: &str = ".groupModel";

/// Settings applied by a [`GroupModel`](crate::GroupModel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupModelConfig {
    /// Whether newly created groups can be collapsed.
    pub default_collapseable: bool,
    /// Whether newly created groups are unbreakable.
    pub default_unbreakable: bool,
    /// Suffix appended to the save/load prefix to form the property key.
    pub persistence_key: String,
}

impl Default for GroupModelConfig {
    fn default() -> Self {
        Self {
            default_collapseable: true,
            default_unbreakable: false,
            persistence_key: DEFAULT_PERSISTENCE_KEY.to_string(),
        }
    }
}

impl GroupModelConfig {
    /// Parses a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the full property key for the given prefix.
    pub fn property_key(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.persistence_key)
    }
}
