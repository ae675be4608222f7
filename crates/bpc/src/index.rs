//! module -> group index
use crate::blueprint::DeploymentGroup;
use crate::error::{ExpandError, NameKind};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Module id -> position of the group that owns the module
///
/// Only built by [check_module_and_group_names], so it always covers every module of the blueprint it was built
/// from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleGroupIndex {
    groups: IndexMap<String, usize>,
}

impl ModuleGroupIndex {
    pub fn get(&self, module_id: &str) -> Option<usize> {
        self.groups.get(module_id).copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Check that group names and module ids are unique and index modules by group
///
/// Module ids must be unique across all groups, not just within their own.
#[tracing::instrument(level = "trace", skip_all)]
pub fn check_module_and_group_names(
    groups: &[DeploymentGroup],
) -> Result<ModuleGroupIndex, ExpandError> {
    let mut group_names = HashSet::new();
    let mut index = ModuleGroupIndex::default();

    for (ordinal, group) in groups.iter().enumerate() {
        if !group_names.insert(group.name.as_str()) {
            return Err(ExpandError::NameCollision {
                kind: NameKind::Group,
                name: group.name.clone(),
            });
        }

        for module in &group.modules {
            if index.groups.contains_key(&module.id) {
                return Err(ExpandError::NameCollision {
                    kind: NameKind::Module,
                    name: module.id.clone(),
                });
            }
            index.groups.insert(module.id.clone(), ordinal);
        }
    }

    tracing::trace!(modules = index.len(), "module index built");
    Ok(index)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::blueprint::test::module;
    use crate::blueprint::ModuleKind;
    use pretty_assertions::assert_eq;

    fn group(name: &str, ids: &[&str]) -> DeploymentGroup {
        DeploymentGroup {
            name: name.into(),
            backend: None,
            modules: ids
                .iter()
                .map(|id| module(id, ModuleKind::Terraform))
                .collect(),
        }
    }

    #[test]
    fn indexes_modules_by_group_position() {
        let groups = [
            group("primary", &["network", "filestore"]),
            group("images", &["image"]),
            group("cluster", &["compute", "login", "controller"]),
        ];

        let index = check_module_and_group_names(&groups).expect("unique names");

        assert_eq!(index.len(), 6);
        for (ordinal, group) in groups.iter().enumerate() {
            for module in &group.modules {
                assert_eq!(index.get(&module.id), Some(ordinal));
            }
        }
        assert_eq!(index.get("unknown"), None);
    }

    #[test]
    fn duplicate_module_in_other_group_fails() {
        let groups = [group("primary", &["network"]), group("cluster", &["network"])];

        let err = check_module_and_group_names(&groups).expect_err("must fail");
        assert!(matches!(
            err,
            ExpandError::NameCollision { kind: NameKind::Module, name } if name == "network"
        ));
    }

    #[test]
    fn duplicate_module_in_same_group_fails() {
        let groups = [group("primary", &["network", "network"])];
        assert!(check_module_and_group_names(&groups).is_err());
    }

    #[test]
    fn duplicate_group_fails() {
        let groups = [group("primary", &["a"]), group("primary", &["b"])];

        let err = check_module_and_group_names(&groups).expect_err("must fail");
        assert_eq!(err.to_string(), "duplicate group name: primary");
    }

    #[test]
    fn no_groups_is_an_empty_index() {
        let index = check_module_and_group_names(&[]).expect("nothing to collide");
        assert!(index.is_empty());
    }
}
