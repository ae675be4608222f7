//! blueprint expansion
//!
//! [Blueprint::expand] turns a blueprint as written into an [ExpandedBlueprint]:
//! 1. group names and module ids are checked, modules indexed by group ([check_module_and_group_names])
//! 2. module descriptors are read, once per group and source
//! 3. command line overrides are applied
//! 4. inputs are wired, settings and validators checked (level dependent)
//! 5. global variables are resolved in every module and backend
//! 6. settings are split into pure and impure ([partition_settings]), outputs crossing a group boundary are
//!    registered as exports of the producing group and imports of the consuming group
//!
//! The input blueprint is never modified. The first failing step aborts the expansion.
use crate::blueprint::{Backend, Blueprint, DeploymentGroup, ModuleKind};
use crate::config::ExpandConfig;
use crate::error::ExpandError;
use crate::index::check_module_and_group_names;
use crate::overrides::ValidationLevel;
use crate::partition::{partition_settings, PartitionedSettings};
use crate::reader::{ModuleDescriptor, ModuleReader, ReadError};
use crate::references::IntergroupOutput;
use crate::value::{convert_map_to_value, Value};
use crate::wiring;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Module descriptors of one expansion, per group and module source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleDescriptors {
    groups: IndexMap<String, IndexMap<String, ModuleDescriptor>>,
}

impl ModuleDescriptors {
    pub fn get(&self, group: &str, source: &str) -> Option<&ModuleDescriptor> {
        self.groups.get(group)?.get(source)
    }

    /// Read the descriptor of every distinct (group, source) pair
    ///
    /// Remote sources cannot be introspected; they are skipped and their modules are neither wired nor checked.
    pub fn fetch(
        groups: &[DeploymentGroup],
        reader: &dyn ModuleReader,
    ) -> Result<Self, ExpandError> {
        let mut descriptors = Self::default();

        for group in groups {
            let cache = descriptors.groups.entry(group.name.clone()).or_default();

            for module in &group.modules {
                if cache.contains_key(&module.source) {
                    tracing::trace!(source = %module.source, "descriptor cached");
                    continue;
                }

                match reader.read(&module.source, module.kind) {
                    Ok(descriptor) => {
                        tracing::debug!(group = %group.name, source = %module.source, "descriptor read");
                        cache.insert(module.source.clone(), descriptor);
                    }
                    Err(ReadError::RemoteSource(source)) => {
                        tracing::warn!(%source, "remote module is not checked against its inputs");
                    }
                    Err(error) => {
                        return Err(ExpandError::ModuleRead {
                            group: group.name.clone(),
                            module_source: module.source.clone(),
                            error,
                        })
                    }
                }
            }
        }

        Ok(descriptors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBackend {
    #[serde(rename = "type")]
    pub backend_type: String,
    pub configuration: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedModule {
    pub id: String,
    pub source: String,
    pub kind: ModuleKind,
    #[serde(flatten)]
    pub settings: PartitionedSettings,
}

impl ResolvedModule {
    pub fn has_intergroup_dependency(&self) -> bool {
        self.settings.has_intergroup_dependency()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<ResolvedBackend>,
    pub modules: Vec<ResolvedModule>,
    /// outputs of this group's modules consumed by later groups
    #[serde(skip_serializing_if = "IndexSet::is_empty")]
    pub exports: IndexSet<IntergroupOutput>,
    /// outputs of earlier groups consumed by this group
    #[serde(skip_serializing_if = "IndexSet::is_empty")]
    pub imports: IndexSet<IntergroupOutput>,
}

impl ResolvedGroup {
    pub fn has_kind(&self, kind: ModuleKind) -> bool {
        self.modules.iter().any(|module| module.kind == kind)
    }
}

/// A blueprint ready to be written
#[derive(Debug, Clone, Serialize)]
pub struct ExpandedBlueprint {
    name: String,
    validation_level: ValidationLevel,
    groups: Vec<ResolvedGroup>,
}

impl ExpandedBlueprint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validation_level(&self) -> ValidationLevel {
        self.validation_level
    }

    pub fn groups(&self) -> &[ResolvedGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&ResolvedGroup> {
        self.groups.iter().find(|group| group.name == name)
    }
}

fn convert_settings(
    settings: &IndexMap<String, serde_yaml::Value>,
    owner: &str,
) -> Result<IndexMap<String, Value>, ExpandError> {
    convert_map_to_value(settings).map_err(|partial| ExpandError::UnsupportedValueType {
        name: format!("{owner}.{}", partial.key),
        source: partial.source,
    })
}

impl Blueprint {
    /// Expand into deployment groups ready to be written
    pub fn expand(
        &self,
        config: &ExpandConfig,
        reader: &dyn ModuleReader,
    ) -> Result<ExpandedBlueprint, ExpandError> {
        tracing::info!(blueprint = %self.blueprint_name, "expanding blueprint");

        let mut blueprint = self.clone();
        let index = check_module_and_group_names(&blueprint.deployment_groups)?;
        let descriptors = ModuleDescriptors::fetch(&blueprint.deployment_groups, reader)?;

        blueprint.set_cli_variables(&config.cli_variables)?;
        blueprint.set_backend_config(&config.backend_config)?;
        let validation_level = config
            .validation_level
            .or(blueprint.validation_level)
            .unwrap_or_default();

        wiring::apply_use_modules(&mut blueprint, &index, &descriptors)?;
        wiring::apply_global_variables(&mut blueprint, &descriptors);
        wiring::validate_settings(&blueprint, &descriptors, validation_level)?;
        wiring::run_validators(&blueprint, config, validation_level)?;

        // global variables of every module and backend are resolved before any reference is classified
        let mut resolved = Vec::with_capacity(blueprint.deployment_groups.len());
        for group in &blueprint.deployment_groups {
            let backend = match &group.backend {
                Some(backend) if backend.is_set() => Some(backend),
                _ if blueprint.terraform_backend_defaults.is_set() => {
                    Some(&blueprint.terraform_backend_defaults)
                }
                _ => None,
            };
            let backend = backend
                .map(|backend| blueprint.resolve_backend(backend))
                .transpose()?;

            let mut settings = Vec::with_capacity(group.modules.len());
            for module in &group.modules {
                let mut module_settings = convert_settings(&module.settings, &module.id)?;
                blueprint.resolve_global_variables(&mut module_settings)?;
                settings.push(module_settings);
            }

            resolved.push((backend, settings));
        }

        let mut groups = Vec::with_capacity(resolved.len());
        let mut crossings = vec![];

        for (group, (backend, settings)) in blueprint.deployment_groups.iter().zip(resolved) {
            let mut modules = Vec::with_capacity(group.modules.len());
            for (module, settings) in group.modules.iter().zip(settings) {
                let settings = partition_settings(settings, module, &index)?;
                crossings.extend(settings.references.iter().cloned());

                modules.push(ResolvedModule {
                    id: module.id.clone(),
                    source: module.source.clone(),
                    kind: module.kind,
                    settings,
                });
            }

            groups.push(ResolvedGroup {
                name: group.name.clone(),
                backend,
                modules,
                exports: IndexSet::new(),
                imports: IndexSet::new(),
            });
        }

        for reference in crossings {
            // both ends are indexed: partition_settings rejects unknown modules
            let (Some(producer), Some(consumer)) =
                (index.get(&reference.module), index.get(&reference.consumer))
            else {
                continue;
            };

            let output = reference.output(&groups[producer].name);
            groups[producer].exports.insert(output.clone());
            groups[consumer].imports.insert(output);
        }

        tracing::info!(
            blueprint = %blueprint.blueprint_name,
            groups = groups.len(),
            %validation_level,
            "blueprint expanded"
        );

        Ok(ExpandedBlueprint {
            name: blueprint.blueprint_name,
            validation_level,
            groups,
        })
    }

    fn resolve_backend(&self, backend: &Backend) -> Result<ResolvedBackend, ExpandError> {
        let mut configuration = convert_settings(&backend.configuration, "terraform_backend")?;
        self.resolve_global_variables(&mut configuration)?;

        Ok(ResolvedBackend {
            backend_type: backend.backend_type.clone(),
            configuration,
        })
    }
}
