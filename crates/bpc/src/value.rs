//! value representation
//!
//! Blueprints are loaded as plain YAML ([serde_yaml::Value]). Before settings can be resolved they are converted into
//! [Value], which contains the following data types
//! - null
//! - boolean (true/false)
//! - integer (signed, i64)
//! - decimal (f64, always finite)
//! - string (utf-8)
//! - array ("list" of values)
//! - object (order-preserving "map"/"dictionary", where the key is of type string)
//! - reference (a value that only exists once some module has been deployed)
//!
//! Tagged YAML values (`!complex 1-1i`), non-string mapping keys and non-finite numbers have no representation
//! and fail conversion with [ConvertError].
use indexmap::IndexMap;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    Reference(Reference),
}

/// Pointer to a module output that is resolved by the deployment tooling, not by us
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// `module.<module>.<output>` - output of a module deployed in the same group
    ModuleOutput {
        module: String,
        output: String,
        path: Vec<String>,
    },
    /// `var.<name>` - input carrying an output exported by an earlier group
    Input { name: String, path: Vec<String> },
}

impl Reference {
    pub fn to_traversal(&self) -> hcl::Traversal {
        let (builder, path) = match self {
            Reference::ModuleOutput {
                module,
                output,
                path,
            } => (
                hcl::Traversal::builder(hcl::Variable::unchecked("module"))
                    .attr(hcl::Identifier::unchecked(module))
                    .attr(hcl::Identifier::unchecked(output)),
                path,
            ),
            Reference::Input { name, path } => (
                hcl::Traversal::builder(hcl::Variable::unchecked("var"))
                    .attr(hcl::Identifier::unchecked(name)),
                path,
            ),
        };

        path.iter()
            .fold(builder, |builder, element| {
                builder.attr(hcl::Identifier::unchecked(element))
            })
            .build()
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (head, path) = match self {
            Reference::ModuleOutput {
                module,
                output,
                path,
            } => (format!("module.{module}.{output}"), path),
            Reference::Input { name, path } => (format!("var.{name}"), path),
        };

        f.write_str(&head)?;
        for element in path {
            write!(f, ".{element}")?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("unsupported value type: tagged value {tag}")]
    Tagged { tag: String },
    #[error("unsupported value type: mapping key {key} is not a string")]
    NonStringKey { key: String },
    #[error("unsupported value type: {number} is not a finite number")]
    NonFiniteNumber { number: String },
}

/// Convert a loaded YAML value
///
/// On failure the error is the only result, there is no placeholder value.
pub fn convert_to_value(value: &serde_yaml::Value) -> Result<Value, ConvertError> {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Ok(Value::Null),
        Yaml::Bool(b) => Ok(Value::Boolean(*b)),
        Yaml::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(Value::Integer(int));
            }

            match number.as_f64() {
                Some(decimal) if decimal.is_finite() => Ok(Value::Decimal(decimal)),
                _ => Err(ConvertError::NonFiniteNumber {
                    number: number.to_string(),
                }),
            }
        }
        Yaml::String(s) => Ok(Value::String(s.clone())),
        Yaml::Sequence(sequence) => sequence
            .iter()
            .map(convert_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Mapping(mapping) => {
            let mut object = IndexMap::with_capacity(mapping.len());
            for (key, value) in mapping {
                let Some(key) = key.as_str() else {
                    return Err(ConvertError::NonStringKey {
                        key: format!("{key:?}"),
                    });
                };
                object.insert(key.to_string(), convert_to_value(value)?);
            }
            Ok(Value::Object(object))
        }
        Yaml::Tagged(tagged) => Err(ConvertError::Tagged {
            tag: tagged.tag.to_string(),
        }),
    }
}

/// Map conversion that could not convert every entry
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("unable to convert {key}: {source}")]
pub struct PartialConversion {
    /// every entry that did convert
    pub converted: IndexMap<String, Value>,
    /// first key that failed
    pub key: String,
    pub source: ConvertError,
}

/// Convert every entry of a mapping
///
/// All entries are attempted. If any fails, the error carries the entries that did convert (failed keys are
/// absent, not replaced by a placeholder). Callers that need all-or-nothing discard `converted`.
pub fn convert_map_to_value(
    mapping: &IndexMap<String, serde_yaml::Value>,
) -> Result<IndexMap<String, Value>, PartialConversion> {
    let mut converted = IndexMap::with_capacity(mapping.len());
    let mut first_error = None;

    for (key, value) in mapping {
        match convert_to_value(value) {
            Ok(value) => {
                converted.insert(key.clone(), value);
            }
            Err(source) => {
                tracing::debug!(%key, %source, "conversion failed");
                if first_error.is_none() {
                    first_error = Some((key.clone(), source));
                }
            }
        }
    }

    match first_error {
        None => Ok(converted),
        Some((key, source)) => Err(PartialConversion {
            converted,
            key,
            source,
        }),
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Self::Reference(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<hcl::Expression> for Value {
    type Error = hcl::Expression;

    /// Only literal expressions have a value, anything else is handed back
    fn try_from(expression: hcl::Expression) -> Result<Self, Self::Error> {
        use hcl::Expression;

        match expression {
            Expression::Null => Ok(Value::Null),
            Expression::Bool(b) => Ok(b.into()),
            Expression::Number(number) => {
                if let Some(int) = number.as_i64() {
                    return Ok(Value::Integer(int));
                }
                match number.as_f64() {
                    Some(decimal) => Ok(Value::Decimal(decimal)),
                    None => Err(Expression::Number(number)),
                }
            }
            Expression::String(s) => Ok(s.into()),
            Expression::Array(array) => {
                let mut values = Vec::with_capacity(array.len());
                for element in array {
                    values.push(Value::try_from(element)?);
                }
                Ok(Value::Array(values))
            }
            Expression::Object(object) => {
                let mut values = IndexMap::new();
                for (key, element) in object {
                    let key = match key {
                        hcl::ObjectKey::Identifier(ident) => ident.as_str().to_string(),
                        hcl::ObjectKey::Expression(Expression::String(s)) => s,
                        hcl::ObjectKey::Expression(Expression::Variable(var)) => {
                            var.as_str().to_string()
                        }
                        key => {
                            return Err(Expression::Object(
                                std::iter::once((key, element)).collect(),
                            ))
                        }
                    };
                    values.insert(key, Value::try_from(element)?);
                }
                Ok(Value::Object(values))
            }
            other => Err(other),
        }
    }
}

impl From<Value> for hcl::Expression {
    fn from(value: Value) -> Self {
        use hcl::Expression;

        match value {
            Value::Null => Expression::Null,
            Value::Boolean(b) => Expression::Bool(b),
            Value::Integer(int) => Expression::Number(int.into()),
            Value::Decimal(decimal) => {
                hcl::Number::from_f64(decimal).map_or(Expression::Null, Expression::Number)
            }
            Value::String(s) => Expression::String(s),
            Value::Array(array) => Expression::Array(array.into_iter().map(Into::into).collect()),
            Value::Object(object) => Expression::Object(
                object
                    .into_iter()
                    .map(|(key, value)| {
                        (
                            hcl::ObjectKey::Expression(Expression::String(key)),
                            value.into(),
                        )
                    })
                    .collect(),
            ),
            Value::Reference(reference) => reference.to_traversal().into(),
        }
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
            Value::Reference(reference) => serializer.collect_str(reference),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).expect("valid yaml")
    }

    #[test]
    fn converts_primitives() {
        assert_eq!(convert_to_value(&yaml("test")), Ok(Value::from("test")));
        assert_eq!(convert_to_value(&yaml("true")), Ok(Value::Boolean(true)));
        assert_eq!(convert_to_value(&yaml("42")), Ok(Value::Integer(42)));
        assert_eq!(convert_to_value(&yaml("0.5")), Ok(Value::Decimal(0.5)));
        assert_eq!(convert_to_value(&yaml("~")), Ok(Value::Null));
    }

    #[test]
    fn converts_collections() {
        let value = convert_to_value(&yaml("{ zones: [a, b], count: 2 }")).expect("converts");

        let expected = Value::Object(IndexMap::from([
            ("zones".to_string(), Value::from(vec!["a", "b"])),
            ("count".to_string(), Value::Integer(2)),
        ]));
        assert_eq!(value, expected);
    }

    #[test]
    fn tagged_value_is_unsupported() {
        let err = convert_to_value(&yaml("!complex 1-1i")).expect_err("must fail");
        let ConvertError::Tagged { tag } = err else {
            panic!("expected tagged value error, got {err:?}");
        };
        assert!(tag.contains("complex"));
    }

    #[test]
    fn non_string_key_is_unsupported() {
        let err = convert_to_value(&yaml("{ 1: one }")).expect_err("must fail");
        assert!(matches!(err, ConvertError::NonStringKey { .. }));
    }

    #[test]
    fn non_finite_number_is_unsupported() {
        let err = convert_to_value(&yaml(".nan")).expect_err("must fail");
        assert!(matches!(err, ConvertError::NonFiniteNumber { .. }));
    }

    #[test]
    fn converts_map() {
        let mapping = IndexMap::from([("testkey".to_string(), yaml("testval"))]);
        let converted = convert_map_to_value(&mapping).expect("converts");
        assert_eq!(converted.get("testkey"), Some(&Value::from("testval")));
    }

    #[test]
    fn failed_keys_are_absent_from_partial_map() {
        let mapping = IndexMap::from([
            ("good".to_string(), yaml("value")),
            ("testkey".to_string(), yaml("!complex 1-1i")),
            ("also_good".to_string(), yaml("1")),
        ]);

        let partial = convert_map_to_value(&mapping).expect_err("must fail");
        assert_eq!(partial.key, "testkey");
        assert!(!partial.converted.contains_key("testkey"));
        assert_eq!(partial.converted.get("good"), Some(&Value::from("value")));
        assert_eq!(partial.converted.get("also_good"), Some(&Value::Integer(1)));
    }

    #[test]
    fn reference_renders_as_traversal() {
        let reference = Reference::Input {
            name: "structure_network_7".into(),
            path: vec!["nested".into()],
        };
        assert_eq!(reference.to_string(), "var.structure_network_7.nested");

        let expected = hcl::Traversal::builder(hcl::Variable::unchecked("var"))
            .attr("structure_network_7")
            .attr("nested")
            .build();
        assert_eq!(reference.to_traversal(), expected);
    }

    #[test]
    fn hcl_literal_round_trips() {
        let value = Value::Object(IndexMap::from([
            ("name".to_string(), Value::from("x")),
            ("sizes".to_string(), Value::from(vec![1i64, 2])),
        ]));

        let expression: hcl::Expression = value.clone().into();
        assert_eq!(Value::try_from(expression), Ok(value));
    }
}
