use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use super::{AppPublicSettings, EventDescription, EventDetail, EventQuery, EventSource, User};
use crate::error::AppError;
use crate::ingest::health_event::{RawAffectedEntity, RawHealthEvent};

pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk event snapshot written by `ahd export`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventSnapshot {
    pub version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub exported_at: OffsetDateTime,
    pub events: Vec<RawHealthEvent>,
}

pub fn write_snapshot(
    path: &Path,
    events: Vec<RawHealthEvent>,
    exported_at: OffsetDateTime,
) -> Result<EventSnapshot, AppError> {
    let snapshot = EventSnapshot {
        version: SNAPSHOT_VERSION,
        exported_at,
        events,
    };
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| {
        AppError::new("SNAPSHOT_ENCODE_FAILED", "Failed to encode event snapshot")
            .with_details(e.to_string())
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new("SNAPSHOT_WRITE_FAILED", "Failed to create snapshot directory")
                .with_details(format!("path={}; err={e}", parent.display()))
        })?;
    }
    fs::write(path, json).map_err(|e| {
        AppError::new("SNAPSHOT_WRITE_FAILED", "Failed to write event snapshot")
            .with_details(format!("path={}; err={e}", path.display()))
    })?;
    Ok(snapshot)
}

pub fn read_snapshot(path: &Path) -> Result<EventSnapshot, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::new("SNAPSHOT_READ_FAILED", "Failed to read event snapshot")
            .with_details(format!("path={}; err={e}", path.display()))
            .with_retryable(true)
    })?;
    let snapshot: EventSnapshot = serde_json::from_str(&text).map_err(|e| {
        AppError::new("SNAPSHOT_INVALID", "Event snapshot is not valid JSON")
            .with_details(format!("path={}; err={e}", path.display()))
    })?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(
            AppError::new("SNAPSHOT_VERSION_UNSUPPORTED", "Unsupported snapshot version")
                .with_details(format!("version={}", snapshot.version)),
        );
    }
    Ok(snapshot)
}

/// Serves events from a snapshot file. The file is re-read on every call so a running
/// `watch` picks up a newly exported snapshot on its next poll.
#[derive(Debug, Clone)]
pub struct FileEventSource {
    path: PathBuf,
}

impl FileEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<RawHealthEvent>, AppError> {
        let snapshot = read_snapshot(&self.path)?;
        debug!(path = %self.path.display(), events = snapshot.events.len(), "loaded snapshot");
        Ok(snapshot.events)
    }
}

impl EventSource for FileEventSource {
    fn get_events(&self, query: &EventQuery) -> Result<Vec<RawHealthEvent>, AppError> {
        Ok(query.apply(&self.load()?))
    }

    fn get_event_details(&self, arns: &[String]) -> Result<Vec<EventDetail>, AppError> {
        let events = self.load()?;
        Ok(arns
            .iter()
            .filter_map(|arn| events.iter().find(|e| &e.arn == arn))
            .map(|event| EventDetail {
                event: event.clone(),
                event_description: EventDescription {
                    latest_description: event.description.clone().unwrap_or_default(),
                },
            })
            .collect())
    }

    fn get_affected_entities(&self, arn: &str) -> Result<Vec<RawAffectedEntity>, AppError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|e| e.arn == arn)
            .map(|e| e.affected_entities)
            .unwrap_or_default())
    }

    fn me(&self) -> Result<User, AppError> {
        Ok(User {
            id: "local".to_string(),
            name: "Snapshot Viewer".to_string(),
            email: String::new(),
        })
    }

    fn public_settings(&self) -> Result<AppPublicSettings, AppError> {
        Ok(AppPublicSettings::default())
    }
}
