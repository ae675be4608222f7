//! settings derived from module descriptors
//!
//! Before settings are resolved, inputs a module declares but does not set are filled in:
//! 1. from outputs of the modules listed in `use` (first module listing the output wins)
//! 2. from global variables of the same name
//!
//! Afterwards every setting must be a declared input and every required input must be set. How violations are
//! reported depends on the [ValidationLevel].
use crate::blueprint::Blueprint;
use crate::config::ExpandConfig;
use crate::error::{ExpandError, SettingIssue};
use crate::expand::ModuleDescriptors;
use crate::index::ModuleGroupIndex;
use crate::literal::GLOBAL_CONTEXT;
use crate::overrides::ValidationLevel;
use crate::references::check_direction;
use crate::value::convert_map_to_value;

/// group position, module position, setting, value
type Wiring = (usize, usize, String, String);

fn apply(blueprint: &mut Blueprint, wirings: Vec<Wiring>) {
    for (group, module, setting, value) in wirings {
        let module = &mut blueprint.deployment_groups[group].modules[module];
        tracing::debug!(module = %module.id, %setting, %value, "input wired");
        module.settings.entry(setting).or_insert(value.into());
    }
}

/// Connect outputs of used modules to unset inputs with the same name
pub(crate) fn apply_use_modules(
    blueprint: &mut Blueprint,
    index: &ModuleGroupIndex,
    descriptors: &ModuleDescriptors,
) -> Result<(), ExpandError> {
    let mut wirings = vec![];

    for (group_pos, group) in blueprint.deployment_groups.iter().enumerate() {
        for (module_pos, module) in group.modules.iter().enumerate() {
            for used_id in &module.use_modules {
                let dangling = || ExpandError::DanglingReference {
                    module: module.id.clone(),
                    target: used_id.clone(),
                };

                let used_group_pos = index.get(used_id).ok_or_else(dangling)?;
                check_direction(&module.id, group_pos, used_id, used_group_pos)?;

                let used_group = &blueprint.deployment_groups[used_group_pos];
                let used = used_group.module_by_id(used_id).ok_or_else(dangling)?;

                let (Some(descriptor), Some(used_descriptor)) = (
                    descriptors.get(&group.name, &module.source),
                    descriptors.get(&used_group.name, &used.source),
                ) else {
                    continue;
                };

                for output in &used_descriptor.outputs {
                    if descriptor.input(&output.name).is_none()
                        || module.settings.contains_key(&output.name)
                    {
                        continue;
                    }

                    wirings.push((
                        group_pos,
                        module_pos,
                        output.name.clone(),
                        format!("(({used_id}.{}))", output.name),
                    ));
                }
            }
        }
    }

    apply(blueprint, wirings);
    Ok(())
}

/// Set unset inputs to the global variable of the same name, if there is one
pub(crate) fn apply_global_variables(blueprint: &mut Blueprint, descriptors: &ModuleDescriptors) {
    let mut wirings = vec![];

    for (group_pos, group) in blueprint.deployment_groups.iter().enumerate() {
        for (module_pos, module) in group.modules.iter().enumerate() {
            let Some(descriptor) = descriptors.get(&group.name, &module.source) else {
                continue;
            };

            for input in &descriptor.inputs {
                if module.settings.contains_key(&input.name)
                    || !blueprint.vars.contains_key(&input.name)
                {
                    continue;
                }

                wirings.push((
                    group_pos,
                    module_pos,
                    input.name.clone(),
                    format!("(({GLOBAL_CONTEXT}.{}))", input.name),
                ));
            }
        }
    }

    apply(blueprint, wirings);
}

/// Settings must be declared inputs, required inputs must be set
pub(crate) fn validate_settings(
    blueprint: &Blueprint,
    descriptors: &ModuleDescriptors,
    level: ValidationLevel,
) -> Result<(), ExpandError> {
    for group in &blueprint.deployment_groups {
        for module in &group.modules {
            let Some(descriptor) = descriptors.get(&group.name, &module.source) else {
                continue;
            };

            let issue = |setting: &str, reason| ExpandError::InvalidSetting {
                module: module.id.clone(),
                setting: setting.to_string(),
                reason,
            };

            for setting in module.settings.keys() {
                if descriptor.input(setting).is_none() {
                    level.report(issue(setting, SettingIssue::Undeclared))?;
                }
            }

            for input in descriptor.inputs.iter().filter(|input| input.required) {
                if !module.settings.contains_key(&input.name) {
                    level.report(issue(&input.name, SettingIssue::MissingRequired))?;
                }
            }
        }
    }

    Ok(())
}

/// Run the validators a blueprint asks for
pub(crate) fn run_validators(
    blueprint: &Blueprint,
    config: &ExpandConfig,
    level: ValidationLevel,
) -> Result<(), ExpandError> {
    for validator_config in &blueprint.validators {
        let validator = config
            .validator(&validator_config.validator)
            .ok_or_else(|| ExpandError::UnknownValidator(validator_config.validator.clone()))?;

        let mut inputs = convert_map_to_value(&validator_config.inputs).map_err(|partial| {
            ExpandError::UnsupportedValueType {
                name: partial.key,
                source: partial.source,
            }
        })?;
        blueprint.resolve_global_variables(&mut inputs)?;

        tracing::debug!(validator = validator.name(), "running validator");
        if let Err(message) = validator.validate(&inputs) {
            level.report(ExpandError::ValidationFailed {
                validator: validator.name().to_string(),
                message,
            })?;
        }
    }

    Ok(())
}
