//! module metadata
//!
//! Expansion needs to know the inputs and outputs a module declares. A [ModuleReader] provides them as a
//! [ModuleDescriptor] for a module source.
//!
//! [HclModuleReader] reads local module directories:
//! - terraform modules: `variable` and `output` blocks of all `*.tf` files
//! - packer templates: `variable` blocks of all `*.pkr.hcl` files
use crate::blueprint::ModuleKind;
use crate::value::Value;
use hcl_edit::structure::{Block, Body, Structure};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

/// A declared input or output
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VarInfo {
    pub name: String,
    /// type constraint as written, e.g. `string` or `list(string)`
    #[serde(rename = "type")]
    pub type_tag: String,
    pub description: String,
    pub default: Option<Value>,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleDescriptor {
    pub inputs: Vec<VarInfo>,
    pub outputs: Vec<VarInfo>,
}

impl ModuleDescriptor {
    pub fn input(&self, name: &str) -> Option<&VarInfo> {
        self.inputs.iter().find(|input| input.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&VarInfo> {
        self.outputs.iter().find(|output| output.name == name)
    }
}

/// Source of module descriptors
pub trait ModuleReader {
    fn read(&self, source: &str, kind: ModuleKind) -> Result<ModuleDescriptor, ReadError>;
}

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("cannot introspect module source {0}: only local directories are supported")]
    RemoteSource(String),
    #[error("unknown module source {0}")]
    UnknownSource(String),
    #[error("No module files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
}

/// Reads descriptors from local module directories
#[derive(Debug, Default, Clone, Copy)]
pub struct HclModuleReader;

impl HclModuleReader {
    pub fn is_local(source: &str) -> bool {
        source.starts_with("./") || source.starts_with("../") || source.starts_with('/')
    }

    fn load_file(&self, file_path: &Path) -> Result<Body, ReadError> {
        tracing::debug!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(file_path)?;
        Ok(hcl_edit::parser::parse_body(&file_contents)?)
    }

    fn load_directory(&self, dir_path: &Path, suffix: &str) -> Result<Vec<Body>, ReadError> {
        let mut bodies = vec![];

        let read_dir = std::fs::read_dir(dir_path)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_module_file = dir_entry.file_name().to_string_lossy().ends_with(suffix);
            if !is_module_file {
                continue;
            }

            bodies.push(self.load_file(&dir_entry.path())?);
        }

        if bodies.is_empty() {
            return Err(ReadError::NoFilesFound);
        }

        Ok(bodies)
    }
}

impl ModuleReader for HclModuleReader {
    fn read(&self, source: &str, kind: ModuleKind) -> Result<ModuleDescriptor, ReadError> {
        if !Self::is_local(source) {
            return Err(ReadError::RemoteSource(source.to_string()));
        }

        let suffix = match kind {
            ModuleKind::Terraform => ".tf",
            ModuleKind::Packer => ".pkr.hcl",
        };

        let mut descriptor = ModuleDescriptor::default();
        for body in self.load_directory(Path::new(source), suffix)? {
            for structure in body.into_iter() {
                let Structure::Block(block) = structure else {
                    continue;
                };

                match block.ident.value().as_str() {
                    "variable" => descriptor.inputs.extend(var_info(&block, true)),
                    "output" => descriptor.outputs.extend(var_info(&block, false)),
                    _ => {}
                }
            }
        }

        tracing::debug!(
            source,
            inputs = descriptor.inputs.len(),
            outputs = descriptor.outputs.len(),
            "module read"
        );
        Ok(descriptor)
    }
}

/// `variable "name" { ... }` or `output "name" { ... }`
fn var_info(block: &Block, is_input: bool) -> Option<VarInfo> {
    let name = block.labels.first()?.as_str().to_string();
    let mut info = VarInfo {
        name,
        ..Default::default()
    };

    let mut has_default = false;
    for attribute in block.body.attributes() {
        let expression: hcl::Expression = attribute.value.clone().into();
        match attribute.key.value().as_str() {
            "description" => {
                if let hcl::Expression::String(description) = expression {
                    info.description = description;
                }
            }
            "type" => info.type_tag = type_tag(&expression),
            "default" => {
                has_default = true;
                info.default = match Value::try_from(expression) {
                    Ok(value) => Some(value),
                    Err(expression) => {
                        tracing::debug!(?expression, "default is not a literal value");
                        None
                    }
                };
            }
            _ => {}
        }
    }

    info.required = is_input && !has_default;
    Some(info)
}

fn type_tag(expression: &hcl::Expression) -> String {
    match expression {
        hcl::Expression::Variable(var) => var.as_str().to_string(),
        other => hcl::format::to_string(other).unwrap_or_default(),
    }
}

/// Descriptors known up front, keyed by module source
#[derive(Debug, Default, Clone)]
pub struct MemoryModuleReader {
    descriptors: IndexMap<String, ModuleDescriptor>,
}

impl MemoryModuleReader {
    pub fn with(mut self, source: impl Into<String>, descriptor: ModuleDescriptor) -> Self {
        self.descriptors.insert(source.into(), descriptor);
        self
    }
}

impl ModuleReader for MemoryModuleReader {
    fn read(&self, source: &str, _kind: ModuleKind) -> Result<ModuleDescriptor, ReadError> {
        self.descriptors
            .get(source)
            .cloned()
            .ok_or_else(|| ReadError::UnknownSource(source.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const VARIABLES_TF: &str = r#"
variable "project_id" {
  description = "Project in which to create the network"
  type        = string
}

variable "zones" {
  description = "Zones to deploy into"
  type        = list(string)
  default     = ["us-east1-b"]
}

resource "google_compute_network" "network" {
  name = var.network_name
}
"#;

    const OUTPUTS_TF: &str = r#"
output "network_name" {
  description = "Name of the network"
  value       = google_compute_network.network.name
}
"#;

    #[test]
    fn reads_terraform_module() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("variables.tf"), VARIABLES_TF).expect("written");
        std::fs::write(dir.path().join("outputs.tf"), OUTPUTS_TF).expect("written");
        std::fs::write(dir.path().join("README.md"), "not hcl {").expect("written");

        let source = dir.path().to_string_lossy().to_string();
        let descriptor = HclModuleReader
            .read(&source, ModuleKind::Terraform)
            .expect("readable module");

        let project_id = descriptor.input("project_id").expect("declared");
        assert_eq!(project_id.type_tag, "string");
        assert_eq!(
            project_id.description,
            "Project in which to create the network"
        );
        assert!(project_id.required);

        let zones = descriptor.input("zones").expect("declared");
        assert!(!zones.required);
        assert_eq!(zones.default, Some(Value::from(vec!["us-east1-b"])));

        let network_name = descriptor.output("network_name").expect("declared");
        assert_eq!(network_name.description, "Name of the network");
        assert!(!network_name.required);

        assert_eq!(descriptor.inputs.len(), 2);
        assert_eq!(descriptor.outputs.len(), 1);
    }

    #[test]
    fn reads_packer_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("image.pkr.hcl"),
            "variable \"subnetwork_name\" {\n  type = string\n}\n",
        )
        .expect("written");
        std::fs::write(dir.path().join("ignored.tf"), VARIABLES_TF).expect("written");

        let source = dir.path().to_string_lossy().to_string();
        let descriptor = HclModuleReader
            .read(&source, ModuleKind::Packer)
            .expect("readable template");

        assert_eq!(descriptor.inputs.len(), 1);
        assert_eq!(descriptor.inputs[0].name, "subnetwork_name");
    }

    #[test]
    fn empty_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().to_string_lossy().to_string();
        assert!(matches!(
            HclModuleReader.read(&source, ModuleKind::Terraform),
            Err(ReadError::NoFilesFound)
        ));
    }

    #[test]
    fn remote_source_cannot_be_introspected() {
        let err = HclModuleReader
            .read("github.com/org/repo//modules/vpc", ModuleKind::Terraform)
            .expect_err("must fail");
        assert!(matches!(err, ReadError::RemoteSource(_)));
    }

    #[test]
    fn memory_reader_knows_registered_sources() {
        let reader = MemoryModuleReader::default().with("./vpc", ModuleDescriptor::default());

        assert!(reader.read("./vpc", ModuleKind::Terraform).is_ok());
        assert!(matches!(
            reader.read("./other", ModuleKind::Terraform),
            Err(ReadError::UnknownSource(_))
        ));
    }
}
