//! deployment writers
//!
//! Every deployment group is written into its own directory below the deployment directory by the [Writer] for the
//! kind of its modules. Writers also print what a user has to run to deploy the group.
use crate::blueprint::ModuleKind;
use crate::expand::{ExpandedBlueprint, ResolvedGroup};
use crate::reader::HclModuleReader;
use std::path::Path;

mod packer;
mod terraform;

pub use packer::PackerWriter;
pub use terraform::TerraformWriter;

pub trait Writer {
    fn kind(&self) -> ModuleKind;

    fn write_deployment_group(
        &self,
        group: &ResolvedGroup,
        deploy_dir: &Path,
        instructions: &mut dyn std::io::Write,
    ) -> Result<(), WriteError>;
}

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("Unable to render hcl")]
    Hcl(#[from] hcl::Error),
    #[error("group {group} mixes terraform and packer modules")]
    MixedKinds { group: String },
    #[error("local source {source_dir} of module {module} is not a directory")]
    MissingSource { module: String, source_dir: String },
}

/// Copy a local module source (recursively) to `destination`
///
/// Returns `false` for remote sources, those are fetched by terraform or packer.
pub(crate) fn copy_local_source(
    module: &str,
    source: &str,
    destination: &Path,
) -> Result<bool, WriteError> {
    if !HclModuleReader::is_local(source) {
        return Ok(false);
    }

    let source_dir = Path::new(source);
    if !source_dir.is_dir() {
        return Err(WriteError::MissingSource {
            module: module.to_string(),
            source_dir: source.to_string(),
        });
    }

    copy_dir(source_dir, destination)?;
    tracing::debug!(module, source, destination = %destination.display(), "module source copied");
    Ok(true)
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for dir_entry in std::fs::read_dir(from)? {
        let dir_entry = dir_entry?;
        let target = to.join(dir_entry.file_name());
        if dir_entry.file_type()?.is_dir() {
            copy_dir(&dir_entry.path(), &target)?;
        } else {
            std::fs::copy(dir_entry.path(), target)?;
        }
    }
    Ok(())
}

/// Write every group of an expanded blueprint with the writer for its kind
#[tracing::instrument(level = "trace", skip_all, fields(blueprint = expanded.name()))]
pub fn write_deployment(
    expanded: &ExpandedBlueprint,
    deploy_dir: &Path,
    instructions: &mut dyn std::io::Write,
) -> Result<(), WriteError> {
    let writers: [&dyn Writer; 2] = [&TerraformWriter, &PackerWriter];

    for group in expanded.groups() {
        let mut matching = writers.iter().filter(|writer| group.has_kind(writer.kind()));

        let Some(writer) = matching.next() else {
            tracing::debug!(group = %group.name, "empty group is not written");
            continue;
        };

        if matching.next().is_some() {
            return Err(WriteError::MixedKinds {
                group: group.name.clone(),
            });
        }

        writer.write_deployment_group(group, deploy_dir, instructions)?;
    }

    tracing::info!(directory = %deploy_dir.display(), "deployment written");
    Ok(())
}
