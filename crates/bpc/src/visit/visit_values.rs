use super::{Visit, VisitMut};
use crate::value::Value;
use indexmap::IndexMap;

/// Recursively visit all leaf [Value]s (everything but arrays and objects)
pub trait VisitLeaves {
    fn visit_leaves(&self, visitor: &mut dyn Visit<Value>);
}

/// Recursively visit all leaf [Value]s mutably
///
/// A leaf replaced by the visitor is not visited again, even if the replacement is a collection.
pub trait VisitLeavesMut {
    fn visit_leaves_mut(&mut self, visitor: &mut dyn VisitMut<Value>);
}

impl VisitLeaves for Value {
    fn visit_leaves(&self, visitor: &mut dyn Visit<Value>) {
        match self {
            Value::Array(array) => {
                for value in array {
                    value.visit_leaves(visitor);
                }
            }
            Value::Object(object) => object.visit_leaves(visitor),
            leaf => visitor.visit(leaf),
        }
    }
}

impl VisitLeaves for IndexMap<String, Value> {
    fn visit_leaves(&self, visitor: &mut dyn Visit<Value>) {
        for value in self.values() {
            value.visit_leaves(visitor);
        }
    }
}

impl VisitLeavesMut for Value {
    fn visit_leaves_mut(&mut self, visitor: &mut dyn VisitMut<Value>) {
        match self {
            Value::Array(array) => {
                for value in array {
                    value.visit_leaves_mut(visitor);
                }
            }
            Value::Object(object) => object.visit_leaves_mut(visitor),
            leaf => visitor.visit_mut(leaf),
        }
    }
}

impl VisitLeavesMut for IndexMap<String, Value> {
    fn visit_leaves_mut(&mut self, visitor: &mut dyn VisitMut<Value>) {
        for value in self.values_mut() {
            value.visit_leaves_mut(visitor);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn visits_nested_leaves() {
        let value = Value::Object(IndexMap::from([
            ("a".to_string(), Value::from("one")),
            (
                "b".to_string(),
                Value::Array(vec![Value::from("two"), Value::Integer(3)]),
            ),
        ]));

        let mut leaves = vec![];
        value.visit_leaves(&mut |leaf: &Value| leaves.push(leaf.clone()));

        assert_eq!(
            leaves,
            vec![Value::from("one"), Value::from("two"), Value::Integer(3)]
        );
    }

    #[test]
    fn replaced_leaf_is_not_revisited() {
        let mut value = Value::Array(vec![Value::from("expand")]);
        let mut visits = 0;

        value.visit_leaves_mut(&mut |leaf: &mut Value| {
            visits += 1;
            *leaf = Value::Array(vec![Value::from("expand"), Value::from("expand")]);
        });

        assert_eq!(visits, 1);
    }
}
