use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vaultline_core::{AppError, AppResult, NonEmptyString, OrgId};

use crate::action::PlaybookAction;
use crate::condition::PlaybookCondition;

/// Class of domain event a playbook subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// An activity was written to the activity log.
    ActivityEvent,
    /// An accounting pack finished running.
    AccountsPackRun,
}

impl TriggerKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActivityEvent => "activity_event",
            Self::AccountsPackRun => "accounts_pack_run",
        }
    }
}

impl Display for TriggerKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "activity_event" => Ok(Self::ActivityEvent),
            "accounts_pack_run" => Ok(Self::AccountsPackRun),
            _ => Err(AppError::Validation(format!(
                "unknown playbook trigger '{value}'"
            ))),
        }
    }
}

/// Playbook lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybookStatus {
    /// Evaluated by the engine.
    Active,
    /// Paused by a user.
    Inactive,
    /// Retired, kept for history.
    Archived,
}

impl PlaybookStatus {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for PlaybookStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "archived" => Ok(Self::Archived),
            _ => Err(AppError::Validation(format!(
                "unknown playbook status '{value}'"
            ))),
        }
    }
}

/// Playbook identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybookId(Uuid);

impl PlaybookId {
    /// Creates a random playbook identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a playbook identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PlaybookId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PlaybookId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Organization-scoped automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    id: PlaybookId,
    org_id: OrgId,
    name: NonEmptyString,
    trigger: TriggerKind,
    conditions: Vec<PlaybookCondition>,
    actions: Vec<PlaybookAction>,
    status: PlaybookStatus,
    last_run_at: Option<DateTime<Utc>>,
}

/// Input payload used to construct a validated playbook.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybookInput {
    /// Playbook identifier.
    pub id: PlaybookId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Human label, unique per organization by convention.
    pub name: String,
    /// Trigger kind.
    pub trigger: TriggerKind,
    /// Conditions, all of which must hold.
    pub conditions: Vec<PlaybookCondition>,
    /// Actions executed in order on match.
    pub actions: Vec<PlaybookAction>,
    /// Lifecycle status.
    pub status: PlaybookStatus,
    /// Advisory timestamp of the latest matching run.
    pub last_run_at: Option<DateTime<Utc>>,
}

impl Playbook {
    /// Creates a validated playbook.
    pub fn new(input: PlaybookInput) -> AppResult<Self> {
        let PlaybookInput {
            id,
            org_id,
            name,
            trigger,
            conditions,
            actions,
            status,
            last_run_at,
        } = input;

        let name = NonEmptyString::new(name.trim())
            .map_err(|_| AppError::Validation("playbook name must not be empty".to_owned()))?;

        Ok(Self {
            id,
            org_id,
            name,
            trigger,
            conditions,
            actions,
            status,
            last_run_at,
        })
    }

    /// Returns playbook identifier.
    #[must_use]
    pub fn id(&self) -> PlaybookId {
        self.id
    }

    /// Returns owning organization.
    #[must_use]
    pub fn org_id(&self) -> OrgId {
        self.org_id
    }

    /// Returns playbook name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns trigger kind.
    #[must_use]
    pub fn trigger(&self) -> TriggerKind {
        self.trigger
    }

    /// Returns ordered conditions.
    #[must_use]
    pub fn conditions(&self) -> &[PlaybookCondition] {
        &self.conditions
    }

    /// Returns ordered actions.
    #[must_use]
    pub fn actions(&self) -> &[PlaybookAction] {
        &self.actions
    }

    /// Returns lifecycle status.
    #[must_use]
    pub fn status(&self) -> PlaybookStatus {
        self.status
    }

    /// Returns whether the engine evaluates this playbook.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PlaybookStatus::Active
    }

    /// Returns advisory last run timestamp.
    #[must_use]
    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_run_at
    }

    /// Updates lifecycle status.
    pub fn set_status(&mut self, status: PlaybookStatus) {
        self.status = status;
    }

    /// Updates advisory last run timestamp.
    pub fn set_last_run_at(&mut self, at: DateTime<Utc>) {
        self.last_run_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use vaultline_core::OrgId;

    use super::{Playbook, PlaybookId, PlaybookInput, PlaybookStatus, TriggerKind};

    fn input(name: &str) -> PlaybookInput {
        PlaybookInput {
            id: PlaybookId::new(),
            org_id: OrgId::new(),
            name: name.to_owned(),
            trigger: TriggerKind::ActivityEvent,
            conditions: Vec::new(),
            actions: Vec::new(),
            status: PlaybookStatus::Active,
            last_run_at: None,
        }
    }

    #[test]
    fn playbook_requires_name() {
        assert!(Playbook::new(input("   ")).is_err());
    }

    #[test]
    fn playbook_name_is_trimmed() {
        let playbook = Playbook::new(input("  Renewal reminder ")).unwrap_or_else(|_| unreachable!());
        assert_eq!(playbook.name().as_str(), "Renewal reminder");
        assert!(playbook.is_active());
    }

    #[test]
    fn trigger_and_status_roundtrip_storage_values() {
        for trigger in [TriggerKind::ActivityEvent, TriggerKind::AccountsPackRun] {
            assert_eq!(TriggerKind::from_str(trigger.as_str()).ok(), Some(trigger));
        }

        for status in [
            PlaybookStatus::Active,
            PlaybookStatus::Inactive,
            PlaybookStatus::Archived,
        ] {
            assert_eq!(PlaybookStatus::from_str(status.as_str()).ok(), Some(status));
        }

        assert!(TriggerKind::from_str("document_uploaded").is_err());
    }
}
