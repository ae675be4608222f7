//! references between modules
//!
//! A module refers to an output of another module with `((module_id.output))`. The referenced module must be
//! deployed no later than the referencing one: it lives in the same group or in an earlier group.
//!
//! References into an earlier group are *intergroup references*. Their value does not exist until the earlier group
//! is deployed, so the earlier group exports the output and the later group imports it as an input variable named
//! [automatic_output_name].
use crate::blueprint::Module;
use crate::error::ExpandError;
use crate::index::ModuleGroupIndex;
use crate::literal::LiteralVariable;
use crate::util::ReferenceCollector;
use crate::value::Value;
use crate::visit::VisitLeaves;
use serde::Serialize;

/// Output of a module in one group consumed by a module in a later group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IntergroupReference {
    /// producing module
    pub module: String,
    /// output of the producing module
    pub name: String,
    /// consuming module
    pub consumer: String,
}

impl IntergroupReference {
    pub fn automatic_name(&self) -> String {
        automatic_output_name(&self.name, &self.module)
    }

    /// The carried output, `group` being the group of the producing module
    pub fn output(&self, group: &str) -> IntergroupOutput {
        IntergroupOutput {
            group: group.to_string(),
            module: self.module.clone(),
            name: self.name.clone(),
        }
    }
}

/// An output carried across a group boundary, regardless of who consumes it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IntergroupOutput {
    /// group of the producing module
    pub group: String,
    pub module: String,
    pub name: String,
}

impl IntergroupOutput {
    pub fn automatic_name(&self) -> String {
        automatic_output_name(&self.name, &self.module)
    }
}

/// Name of the variable that carries `output` of `module_id` into later groups
///
/// `<output>_<module_id>_<length of module_id>`: the trailing length makes the name unambiguous even when output or
/// module id contain underscores, so distinct pairs never share a name.
pub fn automatic_output_name(output: &str, module_id: &str) -> String {
    format!("{output}_{module_id}_{}", module_id.chars().count())
}

/// A module-context literal variable that points at an existing module
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedReference<'a> {
    pub module: &'a str,
    pub output: &'a str,
    /// attributes below the output
    pub path: Vec<&'a str>,
    /// module lives in an earlier group than the consumer
    pub intergroup: bool,
}

/// Locate the module a literal variable refers to, relative to the consuming module
///
/// Global variables (`((var.name))`) are not references and yield `None`.
pub(crate) fn resolve_reference<'a>(
    literal: &LiteralVariable<'a>,
    consumer: &str,
    index: &ModuleGroupIndex,
) -> Result<Option<ResolvedReference<'a>>, ExpandError> {
    if literal.is_global() {
        return Ok(None);
    }

    let consumer_group = group_of(consumer, consumer, index)?;
    let target_group = group_of(consumer, literal.context, index)?;
    check_direction(consumer, consumer_group, literal.context, target_group)?;

    let (output, path) = literal.split_name();
    Ok(Some(ResolvedReference {
        module: literal.context,
        output,
        path,
        intergroup: target_group < consumer_group,
    }))
}

fn group_of(consumer: &str, module: &str, index: &ModuleGroupIndex) -> Result<usize, ExpandError> {
    index
        .get(module)
        .ok_or_else(|| ExpandError::DanglingReference {
            module: consumer.to_string(),
            target: module.to_string(),
        })
}

/// A module may only depend on modules of its own or an earlier group
pub(crate) fn check_direction(
    consumer: &str,
    consumer_group: usize,
    target: &str,
    target_group: usize,
) -> Result<(), ExpandError> {
    if target_group > consumer_group {
        return Err(ExpandError::IllegalReferenceDirection {
            module: consumer.to_string(),
            group: consumer_group,
            target: target.to_string(),
            target_group,
        });
    }
    Ok(())
}

/// Every intergroup reference in a setting value, nested values included
///
/// References to modules of the same group are validated but not returned.
pub fn find_intergroup_references(
    value: &Value,
    module: &Module,
    index: &ModuleGroupIndex,
) -> Result<Vec<IntergroupReference>, ExpandError> {
    let mut collector = ReferenceCollector::new(&module.id, index);
    value.visit_leaves(&mut collector);
    collector.finish()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::blueprint::test::module;
    use crate::blueprint::{DeploymentGroup, ModuleKind};
    use crate::index::check_module_and_group_names;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn groups() -> Vec<DeploymentGroup> {
        let group = |name: &str, ids: &[&str]| DeploymentGroup {
            name: name.into(),
            backend: None,
            modules: ids
                .iter()
                .map(|id| module(id, ModuleKind::Terraform))
                .collect(),
        };
        vec![group("g0", &["m1", "m3"]), group("g1", &["m2", "m4"])]
    }

    fn find(value: Value, consumer: &str) -> Result<Vec<IntergroupReference>, ExpandError> {
        let groups = groups();
        let index = check_module_and_group_names(&groups).expect("unique names");
        let module = groups
            .iter()
            .find_map(|group| group.module_by_id(consumer))
            .expect("consumer exists");
        find_intergroup_references(&value, module, &index)
    }

    #[test]
    fn earlier_group_is_intergroup() {
        let references = find("((m1.network_name))".into(), "m2").expect("valid reference");

        assert_eq!(
            references,
            vec![IntergroupReference {
                module: "m1".into(),
                name: "network_name".into(),
                consumer: "m2".into(),
            }]
        );
        assert_eq!(
            references[0].automatic_name(),
            automatic_output_name("network_name", "m1")
        );
    }

    #[test]
    fn same_group_is_not_intergroup() {
        assert_eq!(find("((m3.network_name))".into(), "m1").expect("valid"), vec![]);
    }

    #[test]
    fn later_group_is_illegal() {
        let err = find("((m4.output))".into(), "m3").expect_err("must fail");
        assert!(matches!(
            err,
            ExpandError::IllegalReferenceDirection { ref module, group: 0, ref target, target_group: 1 }
                if module == "m3" && target == "m4"
        ));
    }

    #[test]
    fn unknown_module_is_dangling() {
        let err = find("((ghost.output))".into(), "m2").expect_err("must fail");
        assert_eq!(err.to_string(), "module m2 references unknown module ghost");
    }

    #[test]
    fn globals_and_plain_strings_are_ignored() {
        assert_eq!(find("((var.region))".into(), "m2").expect("valid"), vec![]);
        assert_eq!(find("m1.network_name".into(), "m2").expect("valid"), vec![]);
    }

    #[test]
    fn finds_nested_references() {
        let value = Value::Object(IndexMap::from([
            ("plain".to_string(), Value::from("text")),
            (
                "list".to_string(),
                Value::from(vec!["((m1.subnet))", "((m4.peer))", "((m3.id.nested))"]),
            ),
        ]));

        let references = find(value, "m2").expect("valid");
        let names: Vec<_> = references
            .iter()
            .map(|r| (r.module.as_str(), r.name.as_str()))
            .collect();
        assert_eq!(names, vec![("m1", "subnet"), ("m3", "id")]);
    }

    #[test]
    fn automatic_output_name_is_deterministic() {
        assert_eq!(automatic_output_name("network_name", "m1"), "network_name_m1_2");
        assert_eq!(
            automatic_output_name("network_name", "m1"),
            automatic_output_name("network_name", "m1")
        );
    }

    #[test]
    fn automatic_output_name_does_not_collide() {
        let pairs = [
            ("a_b", "c"),
            ("a", "b_c"),
            ("a", "b_1"),
            ("a_b_1", ""),
            ("x_1", "y"),
            ("x", "1_y"),
            ("", "a_b"),
        ];

        let mut names: Vec<_> = pairs
            .iter()
            .map(|(output, module)| automatic_output_name(output, module))
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), pairs.len());
    }
}
