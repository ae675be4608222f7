use crate::error::ExpandError;
use crate::index::ModuleGroupIndex;
use crate::literal::identify_literal_variable;
use crate::references::{resolve_reference, IntergroupReference};
use crate::value::{convert_to_value, Reference, Value};
use crate::visit;
use indexmap::IndexMap;

/// Replaces `((var.name))` with the value of global variable `name`
///
/// Stops rewriting at the first failure, earlier replacements are kept.
#[derive(derive_new::new)]
pub(crate) struct GlobalVariableRewriter<'b> {
    vars: &'b IndexMap<String, serde_yaml::Value>,
    #[new(default)]
    error: Option<ExpandError>,
}

impl<'b> GlobalVariableRewriter<'b> {
    pub fn finish(self) -> Result<(), ExpandError> {
        self.error.map_or(Ok(()), Err)
    }
}

impl<'b> visit::VisitMut<Value> for GlobalVariableRewriter<'b> {
    fn visit_mut(&mut self, value: &mut Value) {
        if self.error.is_some() {
            return;
        }

        let Value::String(s) = value else {
            return;
        };

        // module references are left for the reference rewriter
        let Some(literal) = identify_literal_variable(s).filter(|literal| literal.is_global()) else {
            return;
        };

        let (head, path) = literal.split_name();
        let Some(global) = self.vars.get(head) else {
            self.error = Some(ExpandError::UnresolvedVariable {
                name: head.to_string(),
            });
            return;
        };

        let mut resolved = match convert_to_value(global) {
            Ok(resolved) => resolved,
            Err(source) => {
                self.error = Some(ExpandError::UnsupportedValueType {
                    name: head.to_string(),
                    source,
                });
                return;
            }
        };

        for attribute in path {
            let Some(nested) = attribute_of(resolved, attribute) else {
                self.error = Some(ExpandError::UnresolvedVariable {
                    name: attribute.to_string(),
                });
                return;
            };
            resolved = nested;
        }

        tracing::trace!(name = literal.name, "global variable resolved");
        *value = resolved;
    }
}

/// `value.attribute`, array elements are addressed by position
fn attribute_of(value: Value, attribute: &str) -> Option<Value> {
    match value {
        Value::Object(mut object) => object.swap_remove(attribute),
        Value::Array(mut array) => {
            let position = attribute.parse::<usize>().ok()?;
            (position < array.len()).then(|| array.swap_remove(position))
        }
        _ => None,
    }
}

/// Collects intergroup references of a module's setting
#[derive(derive_new::new)]
pub(crate) struct ReferenceCollector<'a> {
    consumer: &'a str,
    index: &'a ModuleGroupIndex,
    #[new(default)]
    references: Vec<IntergroupReference>,
    #[new(default)]
    error: Option<ExpandError>,
}

impl<'a> ReferenceCollector<'a> {
    pub fn finish(self) -> Result<Vec<IntergroupReference>, ExpandError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.references),
        }
    }
}

impl<'a> visit::Visit<Value> for ReferenceCollector<'a> {
    fn visit(&mut self, value: &Value) {
        if self.error.is_some() {
            return;
        }

        let Some(literal) = value.as_str().and_then(identify_literal_variable) else {
            return;
        };

        match resolve_reference(&literal, self.consumer, self.index) {
            Ok(Some(resolved)) if resolved.intergroup => {
                self.references.push(IntergroupReference {
                    module: resolved.module.to_string(),
                    name: resolved.output.to_string(),
                    consumer: self.consumer.to_string(),
                })
            }
            Ok(_) => {}
            Err(error) => self.error = Some(error),
        }
    }
}

/// Replaces `((module.output))` with a [Reference]
///
/// Outputs of the same group are referenced directly, outputs of earlier groups through the input variable named
/// after [IntergroupReference::automatic_name].
#[derive(derive_new::new)]
pub(crate) struct ReferenceRewriter<'a> {
    consumer: &'a str,
    index: &'a ModuleGroupIndex,
    #[new(default)]
    error: Option<ExpandError>,
}

impl<'a> ReferenceRewriter<'a> {
    pub fn finish(self) -> Result<(), ExpandError> {
        self.error.map_or(Ok(()), Err)
    }
}

impl<'a> visit::VisitMut<Value> for ReferenceRewriter<'a> {
    fn visit_mut(&mut self, value: &mut Value) {
        if self.error.is_some() {
            return;
        }

        let Some(literal) = value.as_str().and_then(identify_literal_variable) else {
            return;
        };

        let resolved = match resolve_reference(&literal, self.consumer, self.index) {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return,
            Err(error) => {
                self.error = Some(error);
                return;
            }
        };

        let path = resolved.path.iter().map(|s| s.to_string()).collect();
        let reference = if resolved.intergroup {
            Reference::Input {
                name: crate::references::automatic_output_name(resolved.output, resolved.module),
                path,
            }
        } else {
            Reference::ModuleOutput {
                module: resolved.module.to_string(),
                output: resolved.output.to_string(),
                path,
            }
        };

        tracing::trace!(consumer = self.consumer, %reference, "reference rewritten");
        *value = Value::Reference(reference);
    }
}
