use serde_json::{Map, Value, json};
use vaultline_core::{AppResult, OrgId};
use vaultline_domain::{
    ConditionOperator, Playbook, PlaybookAction, PlaybookCondition, PlaybookEvent, PlaybookId,
    PlaybookInput, PlaybookStatus, TriggerKind,
};

/// Activity type prefix that seeds the contract family.
pub(crate) const CONTRACT_ACTIVITY_PREFIX: &str = "contract_";

/// Name of the contract renewal reminder template.
pub const CONTRACT_RENEWAL_REMINDER: &str = "Contract renewal reminder";
/// Name of the contract expiry escalation template.
pub const CONTRACT_EXPIRY_ESCALATION: &str = "Contract expiry escalation";
/// Name of the accounts pack cash runway template.
pub const ACCOUNTS_PACK_CASH_RUNWAY: &str = "Accounts pack cash runway alert";
/// Name of the accounts pack margin template.
pub const ACCOUNTS_PACK_MARGIN_REVIEW: &str = "Accounts pack margin review";

/// Group of templates seeded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateFamily {
    /// Contract lifecycle automations.
    Contracts,
    /// Accounting pack automations.
    AccountsPack,
}

impl TemplateFamily {
    /// Sniffs which family an event should seed, if any.
    #[must_use]
    pub fn for_event(event: &PlaybookEvent) -> Option<Self> {
        match event.trigger {
            TriggerKind::ActivityEvent => event
                .activity_type()
                .filter(|activity_type| activity_type.starts_with(CONTRACT_ACTIVITY_PREFIX))
                .map(|_| Self::Contracts),
            TriggerKind::AccountsPackRun => Some(Self::AccountsPack),
        }
    }

    /// Returns the templates of this family.
    pub fn templates(self) -> AppResult<Vec<PlaybookTemplate>> {
        match self {
            Self::Contracts => Ok(vec![
                contract_renewal_reminder()?,
                contract_expiry_escalation()?,
            ]),
            Self::AccountsPack => Ok(vec![
                accounts_pack_cash_runway()?,
                accounts_pack_margin_review()?,
            ]),
        }
    }
}

/// Known-good playbook definition that can be seeded into any organization.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybookTemplate {
    /// Playbook name, also the seeding idempotency key.
    pub name: String,
    /// Trigger kind.
    pub trigger: TriggerKind,
    /// Conditions.
    pub conditions: Vec<PlaybookCondition>,
    /// Actions.
    pub actions: Vec<PlaybookAction>,
}

impl PlaybookTemplate {
    /// Builds an active playbook for one organization.
    pub fn instantiate(&self, org_id: OrgId) -> AppResult<Playbook> {
        Playbook::new(PlaybookInput {
            id: PlaybookId::new(),
            org_id,
            name: self.name.clone(),
            trigger: self.trigger,
            conditions: self.conditions.clone(),
            actions: self.actions.clone(),
            status: PlaybookStatus::Active,
            last_run_at: None,
        })
    }
}

/// Returns every template in the catalog.
pub fn all_templates() -> AppResult<Vec<PlaybookTemplate>> {
    let mut templates = TemplateFamily::Contracts.templates()?;
    templates.extend(TemplateFamily::AccountsPack.templates()?);
    Ok(templates)
}

/// Returns the templates an event would seed.
pub fn templates_for_event(event: &PlaybookEvent) -> AppResult<Vec<PlaybookTemplate>> {
    TemplateFamily::for_event(event).map_or_else(|| Ok(Vec::new()), TemplateFamily::templates)
}

fn contract_renewal_reminder() -> AppResult<PlaybookTemplate> {
    Ok(PlaybookTemplate {
        name: CONTRACT_RENEWAL_REMINDER.to_owned(),
        trigger: TriggerKind::ActivityEvent,
        conditions: vec![
            PlaybookCondition::new("activity.type", ConditionOperator::Equals, "contract_signed")?,
            PlaybookCondition::new(
                "activity.metadata.status",
                ConditionOperator::Equals,
                "active",
            )?,
            PlaybookCondition::new(
                "activity.metadata.days_until_renewal",
                ConditionOperator::Lte,
                30,
            )?,
        ],
        actions: vec![
            log_activity("contract_renewal_reminder_created", "contracts"),
            enqueue_task(json!({
                "taskType": "contract_renewal_reminder",
                "channel": "email",
            })),
        ],
    })
}

fn contract_expiry_escalation() -> AppResult<PlaybookTemplate> {
    Ok(PlaybookTemplate {
        name: CONTRACT_EXPIRY_ESCALATION.to_owned(),
        trigger: TriggerKind::ActivityEvent,
        conditions: vec![
            PlaybookCondition::new(
                "activity.type",
                ConditionOperator::Equals,
                "contract_expiring",
            )?,
            PlaybookCondition::new(
                "activity.metadata.days_until_expiry",
                ConditionOperator::Lte,
                7,
            )?,
        ],
        actions: vec![
            log_activity("contract_expiry_escalated", "contracts"),
            enqueue_task(json!({
                "taskType": "contract_expiry_escalation",
                "priority": "high",
            })),
        ],
    })
}

fn accounts_pack_cash_runway() -> AppResult<PlaybookTemplate> {
    Ok(PlaybookTemplate {
        name: ACCOUNTS_PACK_CASH_RUNWAY.to_owned(),
        trigger: TriggerKind::AccountsPackRun,
        conditions: vec![
            PlaybookCondition::new("metrics.pack_type", ConditionOperator::Equals, "month_end")?,
            PlaybookCondition::new("metrics.cash_runway_months", ConditionOperator::Lt, 6)?,
        ],
        actions: vec![
            log_activity("accounts_pack_cash_runway_alert", "accounts"),
            enqueue_task(json!({"taskType": "cash_runway_review"})),
        ],
    })
}

fn accounts_pack_margin_review() -> AppResult<PlaybookTemplate> {
    Ok(PlaybookTemplate {
        name: ACCOUNTS_PACK_MARGIN_REVIEW.to_owned(),
        trigger: TriggerKind::AccountsPackRun,
        conditions: vec![
            PlaybookCondition::new("metrics.pack_type", ConditionOperator::Equals, "month_end")?,
            PlaybookCondition::new("metrics.gross_margin_pct", ConditionOperator::Lt, 20)?,
        ],
        actions: vec![
            log_activity("accounts_pack_margin_flagged", "accounts"),
            enqueue_task(json!({"taskType": "margin_review"})),
        ],
    })
}

fn log_activity(activity_type: &str, feature: &str) -> PlaybookAction {
    PlaybookAction::LogActivity {
        params: object(json!({
            "type": activity_type,
            "feature": feature,
            "category": "automation",
        })),
    }
}

fn enqueue_task(params: Value) -> PlaybookAction {
    PlaybookAction::EnqueueTask {
        params: object(params),
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
