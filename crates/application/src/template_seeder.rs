use std::sync::Arc;

use tracing::{debug, info, warn};
use vaultline_core::{AppResult, OrgId};
use vaultline_domain::PlaybookEvent;

use crate::playbook_ports::PlaybookRepository;

mod catalog;

pub use catalog::{
    ACCOUNTS_PACK_CASH_RUNWAY, ACCOUNTS_PACK_MARGIN_REVIEW, CONTRACT_EXPIRY_ESCALATION,
    CONTRACT_RENEWAL_REMINDER, PlaybookTemplate, TemplateFamily, all_templates,
    templates_for_event,
};

/// Best-effort seeding of canonical playbooks.
///
/// Idempotency is an advisory lookup-then-insert by `(org_id, name)`. Two
/// concurrent first events for one organization can both insert.
#[derive(Clone)]
pub struct TemplateSeeder {
    repository: Arc<dyn PlaybookRepository>,
}

impl TemplateSeeder {
    /// Creates a template seeder.
    #[must_use]
    pub fn new(repository: Arc<dyn PlaybookRepository>) -> Self {
        Self { repository }
    }

    /// Ensures one playbook built from the template exists for the organization.
    pub async fn ensure_playbook_for_org(&self, org_id: OrgId, template: &PlaybookTemplate) {
        match self.try_ensure_playbook(org_id, template).await {
            Ok(true) => info!(
                org_id = %org_id,
                playbook = %template.name,
                "seeded playbook template"
            ),
            Ok(false) => debug!(
                org_id = %org_id,
                playbook = %template.name,
                "playbook template already present"
            ),
            Err(error) => warn!(
                org_id = %org_id,
                playbook = %template.name,
                error = %error,
                "failed to seed playbook template"
            ),
        }
    }

    /// Seeds the template family an event's shape points at.
    pub async fn seed_for_event(&self, org_id: OrgId, event: &PlaybookEvent) {
        let Some(family) = TemplateFamily::for_event(event) else {
            return;
        };

        match family.templates() {
            Ok(templates) => {
                for template in &templates {
                    self.ensure_playbook_for_org(org_id, template).await;
                }
            }
            Err(error) => warn!(
                org_id = %org_id,
                family = ?family,
                error = %error,
                "failed to build playbook templates"
            ),
        }
    }

    async fn try_ensure_playbook(
        &self,
        org_id: OrgId,
        template: &PlaybookTemplate,
    ) -> AppResult<bool> {
        if self
            .repository
            .find_playbook_by_name(org_id, template.name.as_str())
            .await?
            .is_some()
        {
            return Ok(false);
        }

        self.repository
            .insert_playbook(template.instantiate(org_id)?)
            .await?;
        Ok(true)
    }
}
