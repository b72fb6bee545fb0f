use std::thread;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::debug;

use super::{AppPublicSettings, EventDescription, EventDetail, EventQuery, EventSource, User};
use crate::demo::{demo_entities_for_service, demo_events};
use crate::error::AppError;
use crate::ingest::health_event::{RawAffectedEntity, RawHealthEvent};

/// Artificial per-call delays, used when a local session should feel like a network backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedLatency {
    pub events: Duration,
    pub details: Duration,
    pub entities: Duration,
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        Self {
            events: Duration::from_millis(500),
            details: Duration::from_millis(300),
            entities: Duration::from_millis(200),
        }
    }
}

/// In-memory event source serving the demo fixture set.
#[derive(Debug, Clone)]
pub struct MockEventSource {
    now: OffsetDateTime,
    events: Vec<RawHealthEvent>,
    latency: Option<SimulatedLatency>,
}

impl MockEventSource {
    /// Fixtures timestamped relative to `now`, no latency.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now,
            events: demo_events(now),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: SimulatedLatency) -> Self {
        self.latency = Some(latency);
        self
    }

    fn pause(&self, pick: impl Fn(&SimulatedLatency) -> Duration) {
        if let Some(l) = &self.latency {
            thread::sleep(pick(l));
        }
    }

    fn find(&self, arn: &str) -> Option<&RawHealthEvent> {
        self.events.iter().find(|e| e.arn == arn)
    }
}

impl EventSource for MockEventSource {
    fn get_events(&self, query: &EventQuery) -> Result<Vec<RawHealthEvent>, AppError> {
        self.pause(|l| l.events);
        let out = query.apply(&self.events);
        debug!(returned = out.len(), "mock source served events");
        Ok(out)
    }

    fn get_event_details(&self, arns: &[String]) -> Result<Vec<EventDetail>, AppError> {
        self.pause(|l| l.details);
        Ok(arns
            .iter()
            .filter_map(|arn| self.find(arn))
            .map(|event| EventDetail {
                event: event.clone(),
                event_description: EventDescription {
                    latest_description: event.description.clone().unwrap_or_default(),
                },
            })
            .collect())
    }

    fn get_affected_entities(&self, arn: &str) -> Result<Vec<RawAffectedEntity>, AppError> {
        self.pause(|l| l.entities);
        let Some(event) = self.find(arn) else {
            return Ok(Vec::new());
        };
        Ok(event
            .service
            .as_deref()
            .map(|svc| demo_entities_for_service(svc, self.now))
            .unwrap_or_default())
    }

    fn me(&self) -> Result<User, AppError> {
        Ok(User {
            id: "user123".to_string(),
            name: "FinOps User".to_string(),
            email: "user@company.com".to_string(),
        })
    }

    fn public_settings(&self) -> Result<AppPublicSettings, AppError> {
        Ok(AppPublicSettings::default())
    }
}
