//! Conflict records and how they are resolved

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::ChangeCategory;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    AdminWins,
    FrontendWins,
    Merge,
    /// Blocks execution until a caller picks a value
    Manual,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AdminWins => "adminWins",
            Self::FrontendWins => "frontendWins",
            Self::Merge => "merge",
            Self::Manual => "manual",
        })
    }
}

/// A caller's decision for one conflict
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictChoice {
    UseAdmin,
    UseFrontend,
    /// An explicit value, recorded as a merge
    UseValue(Value),
}

impl FromStr for ConflictChoice {
    type Err = Error;

    /// Parses `admin` or `frontend`; explicit values are built directly
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::UseAdmin),
            "frontend" => Ok(Self::UseFrontend),
            other => Err(Error::validation(format!(
                "unknown resolution '{}' (expected admin or frontend)",
                other
            ))),
        }
    }
}

/// A field changed independently on both sides since the last sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolution {
    /// Dotted path such as `quiz.questions.q1` or `rewards.coinValues.correct`
    pub field: String,
    pub category: ChangeCategory,
    /// `None` when the admin side deleted the field
    pub admin_value: Option<Value>,
    /// `None` when the frontend side deleted the field
    pub frontend_value: Option<Value>,
    pub admin_timestamp: DateTime<Utc>,
    pub frontend_timestamp: DateTime<Utc>,
    pub resolution: Resolution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_value: Option<Value>,
}

impl ConflictResolution {
    pub fn is_blocking(&self) -> bool {
        self.resolution == Resolution::Manual
    }

    /// Whether one side removed the item the other side changed
    pub fn is_destructive(&self) -> bool {
        self.admin_value.is_none() || self.frontend_value.is_none()
    }

    pub fn resolve(&mut self, choice: ConflictChoice) {
        match choice {
            ConflictChoice::UseAdmin => {
                self.resolution = Resolution::AdminWins;
                self.merged_value = None;
            }
            ConflictChoice::UseFrontend => {
                self.resolution = Resolution::FrontendWins;
                self.merged_value = None;
            }
            ConflictChoice::UseValue(value) => {
                self.resolution = Resolution::Merge;
                self.merged_value = Some(value);
            }
        }
    }

    /// Value this conflict settles on; `Ok(None)` means the field is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictBlocked`] while the resolution is manual.
    pub fn chosen_value(&self) -> Result<Option<Value>> {
        match self.resolution {
            Resolution::AdminWins => Ok(self.admin_value.clone()),
            Resolution::FrontendWins => Ok(self.frontend_value.clone()),
            Resolution::Merge => Ok(self
                .merged_value
                .clone()
                .or_else(|| self.admin_value.clone())),
            Resolution::Manual => Err(Error::ConflictBlocked {
                fields: vec![self.field.clone()],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conflict() -> ConflictResolution {
        ConflictResolution {
            field: "rewards.coinValues.correct".into(),
            category: ChangeCategory::Rewards,
            admin_value: Some(json!(20)),
            frontend_value: Some(json!(30)),
            admin_timestamp: Utc::now(),
            frontend_timestamp: Utc::now(),
            resolution: Resolution::Manual,
            merged_value: None,
        }
    }

    #[test]
    fn manual_blocks_until_resolved() {
        let mut c = conflict();
        assert!(c.is_blocking());
        assert!(matches!(c.chosen_value(), Err(Error::ConflictBlocked { .. })));

        c.resolve(ConflictChoice::UseFrontend);
        assert!(!c.is_blocking());
        assert_eq!(c.chosen_value().unwrap(), Some(json!(30)));
    }

    #[test]
    fn explicit_value_is_a_merge() {
        let mut c = conflict();
        c.resolve(ConflictChoice::UseValue(json!(25)));
        assert_eq!(c.resolution, Resolution::Merge);
        assert_eq!(c.chosen_value().unwrap(), Some(json!(25)));
    }

    #[test]
    fn deleted_side_is_destructive() {
        let mut c = conflict();
        c.frontend_value = None;
        assert!(c.is_destructive());
        c.resolve(ConflictChoice::UseFrontend);
        assert_eq!(c.chosen_value().unwrap(), None);
    }

    #[test]
    fn parses_cli_choices() {
        assert_eq!(
            "admin".parse::<ConflictChoice>().unwrap(),
            ConflictChoice::UseAdmin
        );
        assert!("both".parse::<ConflictChoice>().is_err());
    }
}
