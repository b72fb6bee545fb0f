use serde::{Deserialize, Serialize};

use crate::domain::{Actionability, Category, Environment, Incident, Status};

/// Optional predicates applied to the incident list. Present fields combine with AND.
///
/// `search`, `service` and `region` treat an empty string the same as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub actionability: Option<Actionability>,
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn contains_ci(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle_lower))
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        present(&self.search).is_none()
            && self.category.is_none()
            && self.actionability.is_none()
            && self.environment.is_none()
            && present(&self.service).is_none()
            && present(&self.region).is_none()
            && self.status.is_none()
    }

    fn matches_search(&self, incident: &Incident) -> bool {
        let Some(term) = present(&self.search) else {
            return true;
        };
        let term = term.to_lowercase();
        contains_ci(Some(&incident.title), &term)
            || contains_ci(incident.service.as_deref(), &term)
            || contains_ci(incident.region.as_deref(), &term)
            || contains_ci(Some(&incident.arn), &term)
            || contains_ci(incident.account_alias.as_deref(), &term)
            || contains_ci(incident.account_id.as_deref(), &term)
    }

    /// True when every present criterion holds for `incident`.
    ///
    /// A missing incident field never equals a present criterion.
    pub fn matches(&self, incident: &Incident) -> bool {
        if !self.matches_search(incident) {
            return false;
        }
        if self.category.is_some_and(|c| incident.category != c) {
            return false;
        }
        if self
            .actionability
            .is_some_and(|a| incident.actionability != a)
        {
            return false;
        }
        if self
            .environment
            .is_some_and(|e| incident.environment != Some(e))
        {
            return false;
        }
        if let Some(service) = present(&self.service) {
            if incident.service.as_deref() != Some(service) {
                return false;
            }
        }
        if let Some(region) = present(&self.region) {
            if incident.region.as_deref() != Some(region) {
                return false;
            }
        }
        if self.status.is_some_and(|s| incident.status != s) {
            return false;
        }
        true
    }
}

/// Stable filter: returns the matching incidents in their original order.
pub fn filter_incidents(incidents: &[Incident], criteria: &FilterCriteria) -> Vec<Incident> {
    if criteria.is_empty() {
        return incidents.to_vec();
    }
    incidents
        .iter()
        .filter(|i| criteria.matches(i))
        .cloned()
        .collect()
}
