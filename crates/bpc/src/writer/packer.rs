use super::{copy_local_source, WriteError, Writer};
use crate::blueprint::ModuleKind;
use crate::expand::{ResolvedGroup, ResolvedModule};
use crate::value::{Reference, Value};
use indexmap::IndexMap;
use std::io::Write;
use std::path::Path;

/// Writes one directory per packer template, settings go into `defaults.auto.pkrvars.hcl`
#[derive(Debug, Default, Clone, Copy)]
pub struct PackerWriter;

pub const PKRVARS_FILE: &str = "defaults.auto.pkrvars.hcl";

fn attributes(settings: &IndexMap<String, Value>) -> hcl::Body {
    let mut builder = hcl::Body::builder();
    for (name, value) in settings {
        let expression: hcl::Expression = value.clone().into();
        builder = builder.add_attribute(hcl::Attribute::new(name.clone(), expression));
    }
    builder.build()
}

/// `-var` arguments reading impure settings from the outputs of earlier groups
///
/// Settings that are more than a plain output cannot be passed this way, they are returned by name.
fn var_arguments(
    group: &ResolvedGroup,
    module: &ResolvedModule,
    deploy_dir: &Path,
) -> (Vec<String>, Vec<String>) {
    let mut arguments = vec![];
    let mut manual = vec![];

    for (setting, value) in &module.settings.impure {
        let producer = match value {
            Value::Reference(Reference::Input { name, path }) if path.is_empty() => group
                .imports
                .iter()
                .find(|output| output.automatic_name() == *name)
                .map(|output| (&output.group, name)),
            _ => None,
        };

        match producer {
            Some((producer, output)) => arguments.push(format!(
                "-var \"{setting}=$(terraform -chdir={} output -raw {output})\"",
                deploy_dir.join(producer).display()
            )),
            None => manual.push(setting.clone()),
        }
    }

    (arguments, manual)
}

fn print_instructions(
    group: &ResolvedGroup,
    module: &ResolvedModule,
    deploy_dir: &Path,
    module_dir: &Path,
    instructions: &mut dyn Write,
) -> Result<(), WriteError> {
    writeln!(
        instructions,
        "Packer group '{}' was successfully created in directory {}",
        group.name,
        module_dir.display()
    )?;
    writeln!(instructions, "To deploy, run the following commands:")?;
    writeln!(instructions)?;

    let (arguments, manual) = var_arguments(group, module, deploy_dir);
    if !manual.is_empty() {
        writeln!(
            instructions,
            "# set these variables by hand, they combine outputs of earlier groups:"
        )?;
        for setting in &manual {
            writeln!(instructions, "#   {setting}")?;
        }
    }

    let vars: String = arguments
        .iter()
        .map(|argument| format!(" {argument}"))
        .collect();
    writeln!(instructions, "cd {}", module_dir.display())?;
    writeln!(instructions, "packer init .")?;
    writeln!(instructions, "packer validate{vars} .")?;
    writeln!(instructions, "packer build{vars} .")?;
    writeln!(instructions, "cd -")?;
    writeln!(instructions)?;
    Ok(())
}

impl Writer for PackerWriter {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Packer
    }

    fn write_deployment_group(
        &self,
        group: &ResolvedGroup,
        deploy_dir: &Path,
        instructions: &mut dyn Write,
    ) -> Result<(), WriteError> {
        for module in &group.modules {
            let module_dir = deploy_dir.join(&group.name).join(&module.id);
            std::fs::create_dir_all(&module_dir)?;
            copy_local_source(&module.id, &module.source, &module_dir)?;

            let pkrvars = hcl::to_string(&attributes(&module.settings.pure))?;
            std::fs::write(module_dir.join(PKRVARS_FILE), pkrvars)?;
            tracing::info!(group = %group.name, module = %module.id, "packer template written");

            print_instructions(group, module, deploy_dir, &module_dir, instructions)?;
        }

        Ok(())
    }
}
