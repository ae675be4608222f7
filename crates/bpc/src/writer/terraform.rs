use super::{copy_local_source, WriteError, Writer};
use crate::blueprint::ModuleKind;
use crate::expand::{ResolvedBackend, ResolvedGroup, ResolvedModule};
use crate::references::IntergroupOutput;
use crate::value::{Reference, Value};
use indexmap::IndexSet;
use std::io::Write;
use std::path::Path;

/// Writes a terraform root module per group
///
/// - `main.tf`: backend and one `module` block per module
/// - `modules/<id>`: copies of local module sources, `main.tf` points there
/// - `variables.tf`: outputs of earlier groups this group imports
/// - `outputs.tf`: outputs later groups import from this group
#[derive(Debug, Default, Clone, Copy)]
pub struct TerraformWriter;

fn block_with_attributes<'a>(
    builder: hcl::structure::BlockBuilder,
    attributes: impl IntoIterator<Item = (&'a String, &'a Value)>,
) -> hcl::structure::BlockBuilder {
    attributes.into_iter().fold(builder, |builder, (name, value)| {
        let expression: hcl::Expression = value.clone().into();
        builder.add_attribute(hcl::Attribute::new(name.clone(), expression))
    })
}

fn backend_block(backend: &ResolvedBackend) -> hcl::Block {
    let backend = block_with_attributes(
        hcl::Block::builder("backend".to_string()).add_label(backend.backend_type.clone()),
        &backend.configuration,
    );
    hcl::Block::builder("terraform".to_string())
        .add_block(backend.build())
        .build()
}

/// Source as seen from the group directory
fn module_source(module: &ResolvedModule, group_dir: &Path) -> Result<String, WriteError> {
    let copy = Path::new("modules").join(&module.id);
    if copy_local_source(&module.id, &module.source, &group_dir.join(&copy))? {
        Ok(format!("./{}", copy.display()))
    } else {
        Ok(module.source.clone())
    }
}

fn main_tf(group: &ResolvedGroup, sources: &[String]) -> hcl::Body {
    let mut body = hcl::Body::builder();

    if let Some(backend) = &group.backend {
        body = body.add_block(backend_block(backend));
    }

    for (module, source) in group.modules.iter().zip(sources) {
        let block = hcl::Block::builder("module".to_string())
            .add_label(module.id.clone())
            .add_attribute(hcl::Attribute::new(
                "source".to_string(),
                hcl::Expression::String(source.clone()),
            ));
        let block = block_with_attributes(
            block,
            module.settings.pure.iter().chain(&module.settings.impure),
        );
        body = body.add_block(block.build());
    }

    body.build()
}

fn variables_tf(imports: &IndexSet<IntergroupOutput>) -> hcl::Body {
    let mut body = hcl::Body::builder();
    for output in imports {
        body = body.add_block(
            hcl::Block::builder("variable".to_string())
                .add_label(output.automatic_name())
                .add_attribute(hcl::Attribute::new(
                    "description".to_string(),
                    hcl::Expression::String(format!(
                        "Output {} of module {}",
                        output.name, output.module
                    )),
                ))
                .add_attribute(hcl::Attribute::new(
                    "type".to_string(),
                    hcl::Expression::from(hcl::Variable::unchecked("any")),
                ))
                .build(),
        );
    }
    body.build()
}

fn outputs_tf(exports: &IndexSet<IntergroupOutput>) -> hcl::Body {
    let mut body = hcl::Body::builder();
    for output in exports {
        let value = Reference::ModuleOutput {
            module: output.module.clone(),
            output: output.name.clone(),
            path: vec![],
        };
        body = body.add_block(
            hcl::Block::builder("output".to_string())
                .add_label(output.automatic_name())
                .add_attribute(hcl::Attribute::new(
                    "description".to_string(),
                    hcl::Expression::String(format!(
                        "Output {} of module {}",
                        output.name, output.module
                    )),
                ))
                .add_attribute(hcl::Attribute::new(
                    "value".to_string(),
                    hcl::Expression::from(value.to_traversal()),
                ))
                .build(),
        );
    }
    body.build()
}

fn print_instructions(
    group: &ResolvedGroup,
    group_dir: &Path,
    instructions: &mut dyn Write,
) -> Result<(), WriteError> {
    let dir = group_dir.display();
    writeln!(
        instructions,
        "Terraform group '{}' was successfully created in directory {dir}",
        group.name
    )?;
    writeln!(instructions, "To deploy, run the following commands:")?;
    writeln!(instructions)?;

    if !group.imports.is_empty() {
        writeln!(
            instructions,
            "# set these variables from the outputs of earlier groups:"
        )?;
        for output in &group.imports {
            writeln!(
                instructions,
                "#   {} (group '{}')",
                output.automatic_name(),
                output.group
            )?;
        }
    }

    writeln!(instructions, "terraform -chdir={dir} init")?;
    writeln!(instructions, "terraform -chdir={dir} validate")?;
    writeln!(instructions, "terraform -chdir={dir} apply")?;
    writeln!(instructions)?;
    Ok(())
}

impl Writer for TerraformWriter {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Terraform
    }

    fn write_deployment_group(
        &self,
        group: &ResolvedGroup,
        deploy_dir: &Path,
        instructions: &mut dyn Write,
    ) -> Result<(), WriteError> {
        let group_dir = deploy_dir.join(&group.name);
        std::fs::create_dir_all(&group_dir)?;

        let sources = group
            .modules
            .iter()
            .map(|module| module_source(module, &group_dir))
            .collect::<Result<Vec<_>, _>>()?;
        std::fs::write(
            group_dir.join("main.tf"),
            hcl::to_string(&main_tf(group, &sources))?,
        )?;
        if !group.imports.is_empty() {
            let variables = hcl::to_string(&variables_tf(&group.imports))?;
            std::fs::write(group_dir.join("variables.tf"), variables)?;
        }
        if !group.exports.is_empty() {
            let outputs = hcl::to_string(&outputs_tf(&group.exports))?;
            std::fs::write(group_dir.join("outputs.tf"), outputs)?;
        }
        tracing::info!(group = %group.name, directory = %group_dir.display(), "terraform group written");

        print_instructions(group, &group_dir, instructions)
    }
}
