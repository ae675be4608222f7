//! literal variables
//!
//! A setting value can be written as `((context.name))` to refer to something that is not known when the
//! blueprint is written down:
//!
//! - `((var.project_id))` refers to the global variable `project_id`
//! - `((network.subnetwork_name))` refers to the output `subnetwork_name` of the module `network`
//!
//! Whitespace directly inside the parentheses is ignored. Everything after the first dot is the name, so
//! `((network.structure.nested))` has the name `structure.nested`.
use regex::Regex;
use std::sync::LazyLock;

/// Context of literal variables that refer to global variables
pub const GLOBAL_CONTEXT: &str = "var";

static LITERAL_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(\(\s*(?P<inner>\S(?:.*\S)?)\s*\)\)$").expect("literal variable pattern is valid")
});

/// A literal variable split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralVariable<'a> {
    pub context: &'a str,
    pub name: &'a str,
}

impl<'a> LiteralVariable<'a> {
    /// Refers to a global variable (`((var.name))`)
    pub fn is_global(&self) -> bool {
        self.context == GLOBAL_CONTEXT
    }

    /// The top level name and the nested attribute path below it
    ///
    /// `structure.nested.value` is `("structure", ["nested", "value"])`
    pub fn split_name(&self) -> (&'a str, Vec<&'a str>) {
        let mut parts = self.name.split('.');
        let head = parts.next().unwrap_or_default();
        (head, parts.collect())
    }
}

/// Is the whole string (ignoring surrounding whitespace) a `((...))` expression
pub fn is_literal_variable(s: &str) -> bool {
    LITERAL_VARIABLE.is_match(s.trim())
}

/// Splits a literal variable at its first dot
///
/// Returns `None` if `s` is not a literal variable or the expression has no `context.name` form. An empty name
/// (`((var.))`) is kept so that resolving it fails instead of the string passing through unchanged.
pub fn identify_literal_variable(s: &str) -> Option<LiteralVariable<'_>> {
    let captures = LITERAL_VARIABLE.captures(s.trim())?;
    let inner = captures.name("inner")?.as_str();

    let (context, name) = inner.split_once('.')?;
    if context.is_empty() {
        return None;
    }

    Some(LiteralVariable { context, name })
}
