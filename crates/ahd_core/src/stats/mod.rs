use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Actionability, Category, Environment, Incident, Status};

/// Headline counters shown above the event list. Computed over the unfiltered list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub open_issues: usize,
    pub scheduled: usize,
    pub notifications: usize,
    pub action_required: usize,
    pub prd_affected: usize,
}

/// Distinct values offered as filter choices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Facets {
    pub services: Vec<String>,
    pub regions: Vec<String>,
}

pub fn compute_stats(incidents: &[Incident]) -> DashboardStats {
    let mut stats = DashboardStats::default();
    for inc in incidents {
        let not_closed = inc.status != Status::Closed;
        match inc.category {
            Category::Issue if inc.status == Status::Open => {
                stats.open_issues += 1;
                if inc.environment == Some(Environment::Prd) {
                    stats.prd_affected += 1;
                }
            }
            Category::ScheduledChange if not_closed => stats.scheduled += 1,
            Category::AccountNotification if not_closed => stats.notifications += 1,
            _ => {}
        }
        if inc.actionability == Actionability::ActionRequired && not_closed {
            stats.action_required += 1;
        }
    }
    stats
}

pub fn compute_facets(incidents: &[Incident]) -> Facets {
    let mut services = BTreeSet::new();
    let mut regions = BTreeSet::new();
    for inc in incidents {
        if let Some(s) = inc.service.as_deref().filter(|s| !s.is_empty()) {
            services.insert(s.to_string());
        }
        if let Some(r) = inc.region.as_deref().filter(|r| !r.is_empty()) {
            regions.insert(r.to_string());
        }
    }
    Facets {
        services: services.into_iter().collect(),
        regions: regions.into_iter().collect(),
    }
}
