//! errors raised while expanding a blueprint
use crate::reader::ReadError;
use crate::value::ConvertError;

/// First error encountered while expanding a blueprint
///
/// Expansion stops at the first error, nothing is recovered.
#[derive(thiserror::Error, Debug)]
pub enum ExpandError {
    #[error("duplicate {kind} name: {name}")]
    NameCollision { kind: NameKind, name: String },

    /// Mirrors the diagnostic hcl reports for a missing object attribute
    #[error("Unsupported attribute; This object does not have an attribute named \"{name}\".")]
    UnresolvedVariable { name: String },

    #[error("module {module} references unknown module {target}")]
    DanglingReference { module: String, target: String },

    #[error(
        "module {module} in group {group} references module {target} in group {target_group}, \
         which is deployed later"
    )]
    IllegalReferenceDirection {
        module: String,
        group: usize,
        target: String,
        target_group: usize,
    },

    #[error("invalid format: '{entry}' should follow the 'name=value' format")]
    InvalidOverrideFormat { entry: String },

    #[error("unable to convert {name}: {source}")]
    UnsupportedValueType {
        name: String,
        #[source]
        source: ConvertError,
    },

    #[error("unknown validation level '{0}', expected one of ERROR, WARNING, IGNORE")]
    UnknownValidationLevel(String),

    #[error("invalid setting {setting} for module {module}: {reason}")]
    InvalidSetting {
        module: String,
        setting: String,
        reason: SettingIssue,
    },

    #[error("validator {0} is not registered")]
    UnknownValidator(String),

    #[error("validator {validator} failed: {message}")]
    ValidationFailed { validator: String, message: String },

    #[error("unable to read module {module_source} of group {group}")]
    ModuleRead {
        group: String,
        module_source: String,
        #[source]
        error: ReadError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Group,
    Module,
}

impl std::fmt::Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameKind::Group => f.write_str("group"),
            NameKind::Module => f.write_str("module"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingIssue {
    /// the module does not declare an input of that name
    Undeclared,
    /// a required input was never set
    MissingRequired,
}

impl std::fmt::Display for SettingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingIssue::Undeclared => f.write_str("not an input of the module"),
            SettingIssue::MissingRequired => f.write_str("required input is not set"),
        }
    }
}
