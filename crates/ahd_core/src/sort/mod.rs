use std::cmp::Ordering;

use time::OffsetDateTime;

use crate::domain::Incident;

fn recency_key(incident: &Incident) -> OffsetDateTime {
    incident
        .last_updated_time
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Composite ordering: actionability, then category, then most recently updated first.
///
/// Missing `last_updated_time` ranks as the Unix epoch (oldest).
pub fn compare_incidents(a: &Incident, b: &Incident) -> Ordering {
    a.actionability
        .priority()
        .cmp(&b.actionability.priority())
        .then_with(|| a.category.priority().cmp(&b.category.priority()))
        .then_with(|| recency_key(b).cmp(&recency_key(a)))
}

/// Returns a sorted copy. `sort_by` is stable, so equal keys keep their input order.
pub fn sort_incidents(incidents: &[Incident]) -> Vec<Incident> {
    let mut sorted = incidents.to_vec();
    sorted.sort_by(compare_incidents);
    sorted
}
