//! blueprint model as written by the user
//!
//! ```yaml
//! blueprint_name: simple
//! vars:
//!   project_id: my-project
//!   region: us-east1
//! terraform_backend_defaults:
//!   type: gcs
//!   configuration:
//!     bucket: tf-state
//! deployment_groups:
//! - group: primary
//!   modules:
//!   - id: network
//!     source: ./modules/network/vpc
//!     kind: terraform
//!     settings:
//!       region: ((var.region))
//! - group: images
//!   modules:
//!   - id: image
//!     source: ./modules/packer/custom-image
//!     kind: packer
//!     settings:
//!       subnetwork: ((network.subnetwork_name))
//! ```
//!
//! Setting values and global variables are kept as loaded ([serde_yaml::Value]) so a blueprint can be written back
//! unchanged. Conversion into [crate::value::Value] happens during expansion.
use crate::overrides::ValidationLevel;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Setting name -> value as loaded
pub type Settings = IndexMap<String, serde_yaml::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub blueprint_name: String,

    /// Global variables
    #[serde(default)]
    pub vars: Settings,

    #[serde(default)]
    pub terraform_backend_defaults: Backend,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_level: Option<ValidationLevel>,

    pub deployment_groups: Vec<DeploymentGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    #[serde(rename = "type", default)]
    pub backend_type: String,
    #[serde(default)]
    pub configuration: Settings,
}

impl Backend {
    /// A backend without type is "use the default"
    pub fn is_set(&self) -> bool {
        !self.backend_type.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentGroup {
    #[serde(rename = "group")]
    pub name: String,

    #[serde(
        rename = "terraform_backend",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub backend: Option<Backend>,

    pub modules: Vec<Module>,
}

impl DeploymentGroup {
    pub fn module_by_id(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn has_kind(&self, kind: ModuleKind) -> bool {
        self.modules.iter().any(|module| module.kind == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub source: String,

    #[serde(default)]
    pub kind: ModuleKind,

    /// Modules whose outputs are wired into matching inputs of this module
    #[serde(rename = "use", default, skip_serializing_if = "Vec::is_empty")]
    pub use_modules: Vec<String>,

    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    #[default]
    Terraform,
    Packer,
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleKind::Terraform => f.write_str("terraform"),
            ModuleKind::Packer => f.write_str("packer"),
        }
    }
}

/// A validator to run during expansion, looked up by name in [crate::config::ExpandConfig]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub validator: String,
    #[serde(default)]
    pub inputs: Settings,
}

impl Blueprint {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        tracing::info!(path=%path.display(), "loading blueprint");
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn to_yaml_string(&self) -> Result<String, LoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn export(&self, path: &Path) -> Result<(), LoadError> {
        tracing::info!(path=%path.display(), "exporting blueprint");
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse blueprint")]
    YamlFailed(#[from] serde_yaml::Error),
}
