//! `key=value` overrides and the validation level
use crate::blueprint::Blueprint;
use crate::error::ExpandError;
use serde::{Deserialize, Serialize};

/// How validation failures are reported, ordered from strictest to most lenient
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationLevel {
    /// fail expansion
    #[default]
    Error,
    /// log a warning and continue
    Warning,
    /// continue silently
    Ignore,
}

impl ValidationLevel {
    pub const ALL: [ValidationLevel; 3] = [
        ValidationLevel::Error,
        ValidationLevel::Warning,
        ValidationLevel::Ignore,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    pub fn is_valid(ordinal: i64) -> bool {
        usize::try_from(ordinal).is_ok_and(|ordinal| Self::from_ordinal(ordinal).is_some())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationLevel::Error => "ERROR",
            ValidationLevel::Warning => "WARNING",
            ValidationLevel::Ignore => "IGNORE",
        }
    }

    /// Report a validation failure at this level
    pub(crate) fn report(self, error: ExpandError) -> Result<(), ExpandError> {
        match self {
            ValidationLevel::Error => Err(error),
            ValidationLevel::Warning => {
                tracing::warn!(%error, "validation failed");
                Ok(())
            }
            ValidationLevel::Ignore => {
                tracing::trace!(%error, "validation failure ignored");
                Ok(())
            }
        }
    }
}

impl std::str::FromStr for ValidationLevel {
    type Err = ExpandError;

    /// Case sensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ExpandError::UnknownValidationLevel(s.to_string()))
    }
}

impl std::fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split every entry on its first `=`
///
/// Either every entry is well formed or the first malformed one is reported.
fn parse_entries<S: AsRef<str>>(entries: &[S]) -> Result<Vec<(&str, &str)>, ExpandError> {
    entries
        .iter()
        .map(|entry| {
            entry
                .as_ref()
                .split_once('=')
                .ok_or_else(|| ExpandError::InvalidOverrideFormat {
                    entry: entry.as_ref().to_string(),
                })
        })
        .collect()
}

impl Blueprint {
    /// Overwrite global variables from `key=value` entries
    ///
    /// Entries are checked before anything is written: with one malformed entry no variable is set.
    /// Later entries win over earlier ones.
    pub fn set_cli_variables<S: AsRef<str>>(&mut self, entries: &[S]) -> Result<(), ExpandError> {
        for (key, value) in parse_entries(entries)? {
            tracing::debug!(%key, "global variable set from command line");
            self.vars.insert(key.to_string(), value.into());
        }
        Ok(())
    }

    /// Overwrite the default backend from `key=value` entries
    ///
    /// `type` sets the backend type, every other key its configuration. Same checking as
    /// [Blueprint::set_cli_variables].
    pub fn set_backend_config<S: AsRef<str>>(&mut self, entries: &[S]) -> Result<(), ExpandError> {
        let backend = &mut self.terraform_backend_defaults;
        for (key, value) in parse_entries(entries)? {
            match key {
                "type" => backend.backend_type = value.to_string(),
                _ => {
                    backend
                        .configuration
                        .insert(key.to_string(), value.into());
                }
            }
        }
        Ok(())
    }

    pub fn set_validation_level(&mut self, level: &str) -> Result<(), ExpandError> {
        self.validation_level = Some(level.parse()?);
        Ok(())
    }
}
