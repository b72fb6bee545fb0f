//! Event-source boundary: the only contract the pipeline needs from a health-event backend.

pub mod file;
pub mod mock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::Incident;
use crate::error::AppError;
use crate::ingest::health_event::{ingest_event, ingest_events, RawAffectedEntity, RawHealthEvent};

pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Server-side narrowing applied by `get_events`. Empty lists impose no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    #[serde(default)]
    pub event_status_codes: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl EventQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            max_results: Some(limit),
            ..Default::default()
        }
    }

    /// `max_results`, with zero or missing meaning the default of 100.
    pub fn effective_limit(&self) -> usize {
        self.max_results
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_RESULTS)
    }

    pub fn matches(&self, event: &RawHealthEvent) -> bool {
        fn allowed(list: &[String], value: &Option<String>) -> bool {
            list.is_empty() || value.as_ref().is_some_and(|v| list.contains(v))
        }
        allowed(&self.event_status_codes, &event.status_code)
            && allowed(&self.services, &event.service)
            && allowed(&self.regions, &event.region)
    }

    /// Filter then truncate, preserving order.
    pub fn apply(&self, events: &[RawHealthEvent]) -> Vec<RawHealthEvent> {
        events
            .iter()
            .filter(|e| self.matches(e))
            .take(self.effective_limit())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDescription {
    pub latest_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub event: RawHealthEvent,
    pub event_description: EventDescription,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppPublicSettings {
    pub requires_auth: bool,
    pub app_name: String,
    pub allow_registration: bool,
}

impl Default for AppPublicSettings {
    fn default() -> Self {
        Self {
            requires_auth: false,
            app_name: "AWS Health Events Dashboard".to_string(),
            allow_registration: true,
        }
    }
}

/// A backend that serves AWS Health events.
pub trait EventSource {
    fn get_events(&self, query: &EventQuery) -> Result<Vec<RawHealthEvent>, AppError>;

    /// Details for each known ARN, in request order. Unknown ARNs are skipped.
    fn get_event_details(&self, arns: &[String]) -> Result<Vec<EventDetail>, AppError>;

    /// Resources affected by `arn`; empty for unknown events.
    fn get_affected_entities(&self, arn: &str) -> Result<Vec<RawAffectedEntity>, AppError>;

    fn me(&self) -> Result<User, AppError>;

    fn public_settings(&self) -> Result<AppPublicSettings, AppError>;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn get_events(&self, query: &EventQuery) -> Result<Vec<RawHealthEvent>, AppError> {
        (**self).get_events(query)
    }

    fn get_event_details(&self, arns: &[String]) -> Result<Vec<EventDetail>, AppError> {
        (**self).get_event_details(arns)
    }

    fn get_affected_entities(&self, arn: &str) -> Result<Vec<RawAffectedEntity>, AppError> {
        (**self).get_affected_entities(arn)
    }

    fn me(&self) -> Result<User, AppError> {
        (**self).me()
    }

    fn public_settings(&self) -> Result<AppPublicSettings, AppError> {
        (**self).public_settings()
    }
}

/// Fetch up to `limit` events and ingest them into incidents.
pub fn list_incidents<S: EventSource + ?Sized>(
    source: &S,
    limit: usize,
) -> Result<Vec<Incident>, AppError> {
    let events = source.get_events(&EventQuery::with_limit(limit))?;
    let summary = ingest_events(&events);
    if !summary.warnings.is_empty() {
        warn!(
            count = summary.warnings.len(),
            "ingest produced warnings for fetched events"
        );
    }
    debug!(incidents = summary.incidents.len(), "listed incidents");
    Ok(summary.incidents)
}

/// Fetch one event with its latest description and affected resources.
///
/// Returns `Ok(None)` when the source does not know `arn`.
pub fn load_incident_detail<S: EventSource + ?Sized>(
    source: &S,
    arn: &str,
) -> Result<Option<Incident>, AppError> {
    let details = source.get_event_details(&[arn.to_string()])?;
    let Some(detail) = details.into_iter().next() else {
        return Ok(None);
    };

    let mut raw = detail.event;
    if !detail.event_description.latest_description.trim().is_empty() {
        raw.description = Some(detail.event_description.latest_description);
    }
    raw.affected_entities = source.get_affected_entities(arn)?;

    let mut warnings = Vec::new();
    let incident = ingest_event(&raw, &mut warnings);
    for w in &warnings {
        debug!(code = %w.code, "{}", w.message);
    }
    Ok(Some(incident))
}

