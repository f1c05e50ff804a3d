//! Error type and identifiers shared by the Vaultline playbook crates.
//!
//! Every playbook, run, activity entry and task is owned by one [`OrgId`].

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result alias returned by ports, adapters and validating constructors.
pub type AppResult<T> = Result<T, AppError>;

/// Text that holds at least one non-whitespace character.
///
/// Used for playbook names and condition field paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Wraps `value`, rejecting blank input. The text is stored as given.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must contain a non-whitespace character".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Borrows the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Organization that owns playbooks and everything they write.
///
/// Repository queries are always scoped by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgId(Uuid);

impl OrgId {
    /// Generates a fresh v4 organization id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an id read from storage or an inbound event.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the id for binding into queries.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrgId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrgId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, formatter)
    }
}

impl FromStr for OrgId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid org id '{value}': {error}")))
    }
}

/// Failure categories surfaced by ports and adapters.
///
/// The playbook engine logs these and records them on runs; it never returns
/// them to the event source.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input, stored JSON or identifier.
    #[error("validation error: {0}")]
    Validation(String),

    /// Playbook or run is absent for the requested organization.
    #[error("not found: {0}")]
    NotFound(String),

    /// Insert collides with an existing record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage or collaborator failure.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{NonEmptyString, OrgId};

    #[test]
    fn blank_text_is_rejected() {
        assert!(NonEmptyString::new("   ").is_err());
        assert!(NonEmptyString::new("").is_err());
    }

    #[test]
    fn padded_text_is_kept_as_given() {
        let value = NonEmptyString::new(" activity.type ").unwrap_or_else(|_| unreachable!());
        assert_eq!(value.as_str(), " activity.type ");
    }

    #[test]
    fn org_id_round_trips_through_its_display_form() {
        let org_id = OrgId::new();
        let rendered = org_id.to_string();
        assert_eq!(rendered.len(), 36);
        assert_eq!(rendered.parse::<OrgId>().ok(), Some(org_id));
    }

    #[test]
    fn org_id_parsing_trims_and_rejects_garbage() {
        let org_id = OrgId::new();
        assert_eq!(format!(" {org_id}\n").parse::<OrgId>().ok(), Some(org_id));
        assert!("not-a-uuid".parse::<OrgId>().is_err());
    }
}
