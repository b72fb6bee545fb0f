use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Rank given to any unrecognized enum value; sorts after every known variant.
pub const UNRECOGNIZED_PRIORITY: u8 = 9;

/// AWS Health event type category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Issue,
    ScheduledChange,
    AccountNotification,
    #[serde(other)]
    Unknown,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Issue,
        Category::ScheduledChange,
        Category::AccountNotification,
    ];

    /// Parse the wire spelling. Returns `None` for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "issue" => Some(Self::Issue),
            "scheduledChange" => Some(Self::ScheduledChange),
            "accountNotification" => Some(Self::AccountNotification),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::ScheduledChange => "scheduledChange",
            Self::AccountNotification => "accountNotification",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Issue => "Issue",
            Self::ScheduledChange => "Scheduled",
            Self::AccountNotification => "Notification",
            Self::Unknown => "Unknown",
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Self::Issue => 0,
            Self::ScheduledChange => 1,
            Self::AccountNotification => 2,
            Self::Unknown => UNRECOGNIZED_PRIORITY,
        }
    }
}

/// Whether an event requires manual action from the account owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actionability {
    ActionRequired,
    ActionMayBeRequired,
    Informational,
    #[serde(other)]
    Unknown,
}

impl Actionability {
    pub const ALL: [Actionability; 3] = [
        Actionability::ActionRequired,
        Actionability::ActionMayBeRequired,
        Actionability::Informational,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ACTION_REQUIRED" => Some(Self::ActionRequired),
            "ACTION_MAY_BE_REQUIRED" => Some(Self::ActionMayBeRequired),
            "INFORMATIONAL" => Some(Self::Informational),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionRequired => "ACTION_REQUIRED",
            Self::ActionMayBeRequired => "ACTION_MAY_BE_REQUIRED",
            Self::Informational => "INFORMATIONAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ActionRequired => "Action Required",
            Self::ActionMayBeRequired => "Action May Be Required",
            Self::Informational | Self::Unknown => "Informational",
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Self::ActionRequired => 0,
            Self::ActionMayBeRequired => 1,
            Self::Informational => 2,
            Self::Unknown => UNRECOGNIZED_PRIORITY,
        }
    }
}

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Upcoming,
    Closed,
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "open" => Some(Self::Open),
            "upcoming" => Some(Self::Upcoming),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Upcoming => "upcoming",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

/// Deployment tier of the affected account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Prd,
    Npr,
    Dev,
    Sandbox,
    #[serde(other)]
    Unknown,
}

impl Environment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "PRD" => Some(Self::Prd),
            "NPR" => Some(Self::Npr),
            "DEV" => Some(Self::Dev),
            "SANDBOX" => Some(Self::Sandbox),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prd => "PRD",
            Self::Npr => "NPR",
            Self::Dev => "DEV",
            Self::Sandbox => "SANDBOX",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Self::Prd => 0,
            Self::Npr => 1,
            Self::Dev => 2,
            Self::Sandbox => 3,
            Self::Unknown => UNRECOGNIZED_PRIORITY,
        }
    }
}

/// Priority of an optional environment; missing sorts with the unrecognized values.
pub fn environment_priority(env: Option<Environment>) -> u8 {
    env.map(|e| e.priority()).unwrap_or(UNRECOGNIZED_PRIORITY)
}

/// A cloud resource impacted by an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AffectedEntity {
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_value: Option<String>,
    #[serde(default)]
    pub entity_arn: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_update_time: Option<OffsetDateTime>,
}

/// Canonical, immutable health event record consumed by the filter/sort/group pipeline.
///
/// Produced only by `ingest`; every derived view clones out of the fetched list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub arn: String,
    pub service: Option<String>,
    pub event_type_code: Option<String>,
    pub event_scope_code: Option<String>,
    pub region: Option<String>,
    pub availability_zone: Option<String>,
    pub category: Category,
    pub actionability: Actionability,
    pub status: Status,
    pub environment: Option<Environment>,
    pub account_id: Option<String>,
    pub account_alias: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated_time: Option<OffsetDateTime>,
    pub title: String,
    pub description: String,
    pub affected_entities: Vec<AffectedEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_wire_values_deserialize_to_unknown() {
        let c: Category = serde_json::from_str("\"maintenance\"").unwrap();
        assert_eq!(c, Category::Unknown);
        let a: Actionability = serde_json::from_str("\"ACTION_REQUIRED\"").unwrap();
        assert_eq!(a, Actionability::ActionRequired);
        let e: Environment = serde_json::from_str("\"STAGING\"").unwrap();
        assert_eq!(e, Environment::Unknown);
        let s: Status = serde_json::from_str("\"upcoming\"").unwrap();
        assert_eq!(s, Status::Upcoming);
    }

    #[test]
    fn priorities_rank_unrecognized_last() {
        assert!(Actionability::Informational.priority() < Actionability::Unknown.priority());
        assert!(Category::AccountNotification.priority() < Category::Unknown.priority());
        assert_eq!(environment_priority(Some(Environment::Prd)), 0);
        assert_eq!(environment_priority(None), UNRECOGNIZED_PRIORITY);
    }

    #[test]
    fn wire_spellings_round_trip_through_parse() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
        for a in Actionability::ALL {
            assert_eq!(Actionability::parse(a.as_str()), Some(a));
        }
        assert_eq!(Category::parse("unknown"), None);
    }
}
