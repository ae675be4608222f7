//! global variable resolution
use crate::blueprint::Blueprint;
use crate::error::ExpandError;
use crate::util::GlobalVariableRewriter;
use crate::value::Value;
use crate::visit::VisitLeavesMut;
use indexmap::IndexMap;

impl Blueprint {
    /// Replace every `((var.name))` in `values` with the global variable `name`
    ///
    /// A dotted name walks into the global: `((var.labels.env))` is the `env` attribute of `labels`, array elements
    /// are addressed by position. Nested values are resolved as well. Module references and plain strings are left as they are. Stops at the
    /// first unknown variable, values resolved up to that point stay resolved.
    pub fn resolve_global_variables(
        &self,
        values: &mut IndexMap<String, Value>,
    ) -> Result<(), ExpandError> {
        let mut rewriter = GlobalVariableRewriter::new(&self.vars);
        values.visit_leaves_mut(&mut rewriter);
        rewriter.finish()
    }
}
