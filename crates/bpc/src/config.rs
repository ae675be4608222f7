//! expansion configuration
use crate::overrides::ValidationLevel;
use crate::value::Value;
use indexmap::IndexMap;

/// Check run against a blueprint during expansion
///
/// Blueprints list validators by name (see [crate::blueprint::ValidatorConfig]); the inputs are passed with global
/// variables resolved.
pub trait Validator {
    fn name(&self) -> &str;
    fn validate(&self, inputs: &IndexMap<String, Value>) -> Result<(), String>;
}

/// Everything expansion needs besides the blueprint itself
#[derive(Default)]
pub struct ExpandConfig {
    /// overrides the blueprint's validation level
    pub validation_level: Option<ValidationLevel>,
    /// `key=value` global variable overrides
    pub cli_variables: Vec<String>,
    /// `key=value` backend overrides
    pub backend_config: Vec<String>,
    pub validators: Vec<Box<dyn Validator>>,
}

impl ExpandConfig {
    pub fn with_validation_level(mut self, level: ValidationLevel) -> Self {
        self.validation_level = Some(level);
        self
    }

    pub fn with_cli_variables(mut self, entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cli_variables.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn with_backend_config(mut self, entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.backend_config
            .extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn validator(&self, name: &str) -> Option<&dyn Validator> {
        self.validators
            .iter()
            .find(|validator| validator.name() == name)
            .map(|validator| &**validator)
    }
}

impl std::fmt::Debug for ExpandConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpandConfig")
            .field("validation_level", &self.validation_level)
            .field("cli_variables", &self.cli_variables)
            .field("backend_config", &self.backend_config)
            .field(
                "validators",
                &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
