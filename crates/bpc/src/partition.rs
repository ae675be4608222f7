//! pure / impure settings
//!
//! A setting is *pure* when it has no intergroup reference. Pure settings are fully known once global variables are
//! resolved and can be written as they are. *Impure* settings depend on an output of an earlier group; they are
//! rewritten to read the input variable that carries that output and are resolved at deployment time.
use crate::blueprint::Module;
use crate::error::ExpandError;
use crate::index::ModuleGroupIndex;
use crate::references::{find_intergroup_references, IntergroupReference};
use crate::util::ReferenceRewriter;
use crate::value::Value;
use crate::visit::VisitLeavesMut;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartitionedSettings {
    pub pure: IndexMap<String, Value>,
    pub impure: IndexMap<String, Value>,
    /// intergroup references of all impure settings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<IntergroupReference>,
}

impl PartitionedSettings {
    pub fn has_intergroup_dependency(&self) -> bool {
        !self.impure.is_empty()
    }
}

/// Split a module's settings (with global variables already resolved) into pure and impure settings
///
/// Module references in both halves are replaced with [crate::value::Reference]s.
#[tracing::instrument(level = "trace", skip_all, fields(module = %module.id))]
pub fn partition_settings(
    settings: IndexMap<String, Value>,
    module: &Module,
    index: &ModuleGroupIndex,
) -> Result<PartitionedSettings, ExpandError> {
    let mut partitioned = PartitionedSettings::default();

    for (name, mut value) in settings {
        let references = find_intergroup_references(&value, module, index)?;

        let mut rewriter = ReferenceRewriter::new(&module.id, index);
        value.visit_leaves_mut(&mut rewriter);
        rewriter.finish()?;

        if references.is_empty() {
            partitioned.pure.insert(name, value);
        } else {
            tracing::debug!(setting = %name, "setting depends on an earlier group");
            partitioned.impure.insert(name, value);
            partitioned.references.extend(references);
        }
    }

    Ok(partitioned)
}
