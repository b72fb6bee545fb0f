use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{environment_priority, Actionability, Environment, Incident};

/// Group key used for incidents without an account id.
pub const UNKNOWN_ACCOUNT_KEY: &str = "unknown";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionabilitySummary {
    pub action_required: usize,
    pub action_may_be_required: usize,
    pub informational: usize,
}

impl ActionabilitySummary {
    /// Count incidents per actionability. Unrecognized values count as informational.
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        let mut summary = Self::default();
        for inc in incidents {
            match inc.actionability {
                Actionability::ActionRequired => summary.action_required += 1,
                Actionability::ActionMayBeRequired => summary.action_may_be_required += 1,
                Actionability::Informational | Actionability::Unknown => {
                    summary.informational += 1
                }
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.action_required + self.action_may_be_required + self.informational
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountGroup {
    /// `account_id`, or `"unknown"` when missing.
    pub key: String,
    pub account_id: Option<String>,
    pub account_alias: Option<String>,
    pub environment: Option<Environment>,
    pub incidents: Vec<Incident>,
    pub summary: ActionabilitySummary,
}

impl AccountGroup {
    pub fn display_name(&self) -> &str {
        self.account_alias
            .as_deref()
            .or(self.account_id.as_deref())
            .unwrap_or("Unknown Account")
    }
}

fn account_key(incident: &Incident) -> &str {
    incident
        .account_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_ACCOUNT_KEY)
}

/// Partition incidents by account.
///
/// Members keep input order. Alias and environment come from the first member.
/// Groups are ordered by ACTION_REQUIRED count (descending), then environment priority
/// (PRD first, missing/unrecognized last); remaining ties keep first-appearance order.
pub fn group_by_account(incidents: &[Incident]) -> Vec<AccountGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<AccountGroup> = Vec::new();

    for inc in incidents {
        let key = account_key(inc);
        let slot = match index.get(key) {
            Some(&i) => i,
            None => {
                groups.push(AccountGroup {
                    key: key.to_string(),
                    account_id: inc.account_id.clone().filter(|s| !s.is_empty()),
                    account_alias: inc.account_alias.clone(),
                    environment: inc.environment,
                    incidents: Vec::new(),
                    summary: ActionabilitySummary::default(),
                });
                index.insert(key.to_string(), groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].incidents.push(inc.clone());
    }

    for g in &mut groups {
        g.summary = ActionabilitySummary::from_incidents(&g.incidents);
    }

    groups.sort_by(|a, b| {
        b.summary
            .action_required
            .cmp(&a.summary.action_required)
            .then_with(|| {
                environment_priority(a.environment).cmp(&environment_priority(b.environment))
            })
    });
    groups
}
