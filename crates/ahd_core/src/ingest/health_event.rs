use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    Actionability, AffectedEntity, Category, Environment, Incident, Status, ValidationWarning,
};
use crate::normalize::timestamps::normalize_timestamp;

pub const DEFAULT_DESCRIPTION: &str = "AWS Health Event";

/// Affected resource as delivered by an event source (timestamps still raw strings).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawAffectedEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
}

/// Health event record as returned by `EventSource::get_events`.
///
/// Field names follow the AWS Health `Event` shape. `title`, `actionability`, `environment`,
/// `accountId`, `accountAlias` and `affectedEntities` are enrichment fields a multi-account
/// aggregator adds on top of the raw AWS payload; all of them may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawHealthEvent {
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_scope_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actionability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_entities: Vec<RawAffectedEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestSummary {
    pub incidents: Vec<Incident>,
    pub warnings: Vec<ValidationWarning>,
}

fn non_empty(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn unrecognized(field: &str, arn: &str, value: &str) -> ValidationWarning {
    ValidationWarning::new(
        "INGEST_ENUM_UNRECOGNIZED",
        format!("Unrecognized {field} value; ranked lowest"),
    )
    .with_details(format!("arn={arn}; value={value}"))
}

/// Build a readable title from an AWS event type code.
///
/// `AWS_EC2_OPERATIONAL_ISSUE` becomes `EC2 operational issue`.
pub fn title_from_event_type_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    let rest = trimmed.strip_prefix("AWS_").unwrap_or(trimmed);
    let mut words = rest.split('_').filter(|w| !w.is_empty());
    let service = words.next()?;
    let tail = words.map(|w| w.to_lowercase()).collect::<Vec<_>>();
    if tail.is_empty() {
        return Some(service.to_string());
    }
    Some(format!("{service} {}", tail.join(" ")))
}

fn ingest_entity(
    arn: &str,
    raw: &RawAffectedEntity,
    warnings: &mut Vec<ValidationWarning>,
) -> AffectedEntity {
    let field = format!("affectedEntities.lastUpdateTime ({arn})");
    AffectedEntity {
        entity_type: non_empty(&raw.entity_type),
        entity_value: non_empty(&raw.entity_value),
        entity_arn: non_empty(&raw.entity_arn),
        status: non_empty(&raw.status),
        last_update_time: raw
            .last_update_time
            .as_deref()
            .and_then(|s| normalize_timestamp(&field, s, warnings)),
    }
}

/// Convert one raw event into an `Incident`, applying enum fallbacks.
///
/// Absent enum fields take the safe default (`issue` / `INFORMATIONAL` / `unknown`).
/// Present but unrecognized values become `Unknown` and produce a warning.
pub fn ingest_event(raw: &RawHealthEvent, warnings: &mut Vec<ValidationWarning>) -> Incident {
    let arn = raw.arn.trim().to_string();

    let category = match non_empty(&raw.event_type_category) {
        None => Category::Issue,
        Some(v) => Category::parse(&v).unwrap_or_else(|| {
            warnings.push(unrecognized("eventTypeCategory", &arn, &v));
            Category::Unknown
        }),
    };
    let actionability = match non_empty(&raw.actionability) {
        None => Actionability::Informational,
        Some(v) => Actionability::parse(&v).unwrap_or_else(|| {
            warnings.push(unrecognized("actionability", &arn, &v));
            Actionability::Unknown
        }),
    };
    let status = match non_empty(&raw.status_code) {
        None => Status::Unknown,
        Some(v) => Status::parse(&v).unwrap_or_else(|| {
            warnings.push(unrecognized("statusCode", &arn, &v));
            Status::Unknown
        }),
    };
    let environment = non_empty(&raw.environment).map(|v| {
        Environment::parse(&v).unwrap_or_else(|| {
            warnings.push(unrecognized("environment", &arn, &v));
            Environment::Unknown
        })
    });

    let mut ts = |field: &str, value: &Option<String>| {
        value
            .as_deref()
            .and_then(|s| normalize_timestamp(field, s, warnings))
    };
    let start_time = ts("startTime", &raw.start_time);
    let end_time = ts("endTime", &raw.end_time);
    let last_updated_time = ts("lastUpdatedTime", &raw.last_updated_time);

    let title = non_empty(&raw.title)
        .or_else(|| {
            raw.event_type_code
                .as_deref()
                .and_then(title_from_event_type_code)
        })
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
    let description = non_empty(&raw.description).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let affected_entities = raw
        .affected_entities
        .iter()
        .map(|e| ingest_entity(&arn, e, warnings))
        .collect();

    Incident {
        id: arn.clone(),
        arn,
        service: non_empty(&raw.service),
        event_type_code: non_empty(&raw.event_type_code),
        event_scope_code: non_empty(&raw.event_scope_code),
        region: non_empty(&raw.region),
        availability_zone: non_empty(&raw.availability_zone),
        category,
        actionability,
        status,
        environment,
        account_id: non_empty(&raw.account_id),
        account_alias: non_empty(&raw.account_alias),
        start_time,
        end_time,
        last_updated_time,
        title,
        description,
        affected_entities,
    }
}

/// Ingest a fetched batch. Input order is preserved.
pub fn ingest_events(events: &[RawHealthEvent]) -> IngestSummary {
    let mut warnings = Vec::new();
    let incidents = events
        .iter()
        .map(|e| ingest_event(e, &mut warnings))
        .collect::<Vec<_>>();

    for w in &warnings {
        debug!(code = %w.code, details = ?w.details, "{}", w.message);
    }

    IngestSummary {
        incidents,
        warnings,
    }
}
