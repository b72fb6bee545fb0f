use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::domain::Incident;
use crate::error::AppError;
use crate::filter::{filter_incidents, FilterCriteria};
use crate::group::{group_by_account, AccountGroup};
use crate::sort::sort_incidents;
use crate::source::{list_incidents, EventSource};
use crate::stats::{compute_facets, compute_stats, DashboardStats, Facets};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Account,
}

/// Everything the shell renders for one cycle. Rebuilt from scratch, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub facets: Facets,
    /// Filtered, then sorted.
    pub incidents: Vec<Incident>,
    /// The same incidents partitioned by account.
    pub groups: Vec<AccountGroup>,
    pub event_count: usize,
}

/// Run filter, sort and group over a fetched list.
///
/// Stats and facets describe the unfiltered list.
pub fn build_dashboard_view(incidents: &[Incident], filters: &FilterCriteria) -> DashboardView {
    let filtered = filter_incidents(incidents, filters);
    let sorted = sort_incidents(&filtered);
    let groups = group_by_account(&sorted);
    DashboardView {
        stats: compute_stats(incidents),
        facets: compute_facets(incidents),
        event_count: sorted.len(),
        incidents: sorted,
        groups,
    }
}

/// Sequence token handed out when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the incident list.
    Applied { incidents: usize },
    /// A newer response had already been applied; this one was dropped.
    Stale,
    /// The fetch failed; prior data and `last_updated` are unchanged.
    Failed(AppError),
}

/// View-controller state owned by the shell.
///
/// Incidents are replaced wholesale on each applied refresh. Filters, selection, expanded
/// accounts and view mode survive refreshes.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    incidents: Vec<Incident>,
    last_updated: Option<OffsetDateTime>,
    last_error: Option<AppError>,
    issued: u64,
    applied: u64,
    filters: FilterCriteria,
    view_mode: ViewMode,
    selected: Option<String>,
    expanded: BTreeSet<String>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn last_updated(&self) -> Option<OffsetDateTime> {
        self.last_updated
    }

    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    /// Sequence number of the response currently shown (0 before the first success).
    pub fn applied_generation(&self) -> u64 {
        self.applied
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        debug!(seq = self.issued, "refresh started");
        RefreshTicket(self.issued)
    }

    /// Apply a finished fetch.
    ///
    /// Only results newer than the one on screen count: a slow early request can neither
    /// overwrite a faster later one nor flag it as failed.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Incident>, AppError>,
        now: OffsetDateTime,
    ) -> RefreshOutcome {
        match result {
            _ if ticket.0 <= self.applied => {
                debug!(
                    seq = ticket.0,
                    applied = self.applied,
                    "discarding stale refresh response"
                );
                RefreshOutcome::Stale
            }
            Ok(incidents) => {
                let count = incidents.len();
                self.incidents = incidents;
                self.applied = ticket.0;
                self.last_updated = Some(now);
                self.last_error = None;
                info!(seq = ticket.0, incidents = count, "refresh applied");
                RefreshOutcome::Applied { incidents: count }
            }
            Err(err) => {
                warn!(seq = ticket.0, error = %err, "refresh failed; keeping previous data");
                self.last_error = Some(err.clone());
                RefreshOutcome::Failed(err)
            }
        }
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn select(&mut self, incident_id: impl Into<String>) {
        self.selected = Some(incident_id.into());
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The selected incident, if it is still present after the latest refresh.
    pub fn selected_incident(&self) -> Option<&Incident> {
        let id = self.selected.as_deref()?;
        self.incidents.iter().find(|i| i.id == id)
    }

    /// Flip an account group open/closed. Returns the new state.
    pub fn toggle_account(&mut self, group_key: &str) -> bool {
        if self.expanded.remove(group_key) {
            false
        } else {
            self.expanded.insert(group_key.to_string());
            true
        }
    }

    pub fn expand_all(&mut self, keys: impl IntoIterator<Item = String>) {
        self.expanded.extend(keys);
    }

    pub fn is_expanded(&self, group_key: &str) -> bool {
        self.expanded.contains(group_key)
    }

    pub fn view(&self) -> DashboardView {
        build_dashboard_view(&self.incidents, &self.filters)
    }
}

/// Fixed-interval refetch driver. A manual refresh is just an early `poll`.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    last_poll: Option<Instant>,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_poll: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_poll {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Time left until the next scheduled poll.
    pub fn until_due(&self, now: Instant) -> Duration {
        match self.last_poll {
            None => Duration::ZERO,
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }

    /// One begin/fetch/complete cycle against `source`.
    ///
    /// `now` drives scheduling; `fetched_at` becomes the state's `last_updated` on success.
    pub fn poll<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        state: &mut DashboardState,
        limit: usize,
        now: Instant,
        fetched_at: OffsetDateTime,
    ) -> RefreshOutcome {
        self.last_poll = Some(now);
        let ticket = state.begin_refresh();
        let result = list_incidents(source, limit);
        state.complete_refresh(ticket, result, fetched_at)
    }
}
