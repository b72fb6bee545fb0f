//! Command layer for the `ahd` binary. Each command wraps `ahd_core` calls and returns
//! either rendered text or a structured `AppError`; the binary only parses flags and prints.

use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use ahd_client::http::HttpEventSource;
use ahd_core::auth::AuthSession;
use ahd_core::cache::ViewCache;
use ahd_core::config::{AppConfig, SourceKind};
use ahd_core::dashboard::{DashboardState, Poller, RefreshOutcome, ViewMode};
use ahd_core::error::AppError;
use ahd_core::filter::FilterCriteria;
use ahd_core::report::{render_dashboard, render_incident_detail};
use ahd_core::source::file::{write_snapshot, EventSnapshot, FileEventSource};
use ahd_core::source::mock::{MockEventSource, SimulatedLatency};
use ahd_core::source::{list_incidents, load_incident_detail, EventQuery, EventSource};
use time::OffsetDateTime;
use tracing::{info, warn};

/// Build the event source selected by `config`.
pub fn build_source(config: &AppConfig) -> Result<Box<dyn EventSource>, AppError> {
    match config.source {
        SourceKind::Mock => {
            let mut source = MockEventSource::new(OffsetDateTime::now_utc());
            if config.simulate_latency {
                source = source.with_latency(SimulatedLatency::default());
            }
            Ok(Box::new(source))
        }
        SourceKind::File => {
            let path = config.snapshot_path.as_ref().ok_or_else(|| {
                AppError::new("CONFIG_INVALID", "source=file requires snapshot_path")
            })?;
            Ok(Box::new(FileEventSource::new(path)))
        }
        SourceKind::Http => {
            let base_url = config.api_base_url.as_deref().ok_or_else(|| {
                AppError::new("CONFIG_INVALID", "source=http requires api_base_url")
            })?;
            let mut client = HttpEventSource::new(base_url)?;
            if let Some(token) = &config.api_token {
                client = client.with_token(token.clone());
            }
            Ok(Box::new(client))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filters: FilterCriteria,
    pub view: ViewMode,
    pub expand_all: bool,
    pub json: bool,
    pub limit: usize,
}

fn prepared_state(opts: &ListOptions) -> DashboardState {
    let mut state = DashboardState::new();
    state.set_filters(opts.filters.clone());
    state.set_view_mode(opts.view);
    state
}

fn render(state: &DashboardState, cache: &ViewCache, json: bool) -> Result<String, AppError> {
    let view = cache.view_for(state);
    if json {
        return serde_json::to_string_pretty(&view).map_err(|e| {
            AppError::new("OUTPUT_ENCODE_FAILED", "Failed to encode dashboard view")
                .with_details(e.to_string())
        });
    }
    Ok(render_dashboard(
        &view,
        state.last_updated(),
        state.view_mode(),
        &|key| state.is_expanded(key),
    ))
}

/// Fetch once and render the dashboard.
pub fn run_list(source: &dyn EventSource, opts: &ListOptions) -> Result<String, AppError> {
    let mut state = prepared_state(opts);
    let ticket = state.begin_refresh();
    let result = list_incidents(source, opts.limit);
    if let RefreshOutcome::Failed(err) =
        state.complete_refresh(ticket, result, OffsetDateTime::now_utc())
    {
        return Err(err);
    }

    let cache = ViewCache::new();
    if opts.expand_all {
        let keys = cache.view_for(&state).groups.into_iter().map(|g| g.key);
        state.expand_all(keys);
    }
    render(&state, &cache, opts.json)
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub list: ListOptions,
    pub interval: Duration,
    /// Stop after this many polls; run until interrupted when `None`.
    pub iterations: Option<u32>,
}

fn write_out(out: &mut dyn Write, text: &str) -> Result<(), AppError> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| {
            AppError::new("OUTPUT_WRITE_FAILED", "Failed to write output").with_details(e.to_string())
        })
}

/// Poll on a fixed interval and re-render after every cycle.
///
/// A failed poll keeps the previous data on screen and reports the error under it.
pub fn run_watch(
    source: &dyn EventSource,
    opts: &WatchOptions,
    out: &mut dyn Write,
) -> Result<u32, AppError> {
    let mut state = prepared_state(&opts.list);
    let mut poller = Poller::new(opts.interval);
    let cache = ViewCache::new();
    let mut cycles = 0u32;

    loop {
        if opts.iterations.is_some_and(|n| cycles >= n) {
            break;
        }
        let wait = poller.until_due(Instant::now());
        if !wait.is_zero() {
            thread::sleep(wait);
        }

        let outcome = poller.poll(
            source,
            &mut state,
            opts.list.limit,
            Instant::now(),
            OffsetDateTime::now_utc(),
        );
        cycles += 1;
        if opts.list.expand_all {
            let keys = cache.view_for(&state).groups.into_iter().map(|g| g.key);
            state.expand_all(keys);
        }

        let mut text = render(&state, &cache, opts.list.json)?;
        if let RefreshOutcome::Failed(err) = &outcome {
            warn!(error = %err, "poll failed");
            text.push_str(&format!("\nLast refresh failed: {err}\n"));
        }
        text.push('\n');
        write_out(out, &text)?;
    }

    let stats = cache.stats();
    info!(cycles, hits = stats.hits, misses = stats.misses, "watch finished");
    Ok(cycles)
}

/// Render the detail panel for one event.
pub fn run_show(
    source: &dyn EventSource,
    arn: &str,
    resource_search: &str,
) -> Result<String, AppError> {
    let incident = load_incident_detail(source, arn)?.ok_or_else(|| {
        AppError::new("EVENT_NOT_FOUND", "No event with that ARN").with_details(format!("arn={arn}"))
    })?;
    Ok(render_incident_detail(&incident, resource_search))
}

/// Resolve the session for `token` and describe it.
pub fn run_whoami(source: &dyn EventSource, token: Option<&str>) -> String {
    let session = AuthSession::check_app_state(source, token);
    let mut out = String::new();
    if let Some(settings) = &session.public_settings {
        out.push_str(&format!(
            "{} (auth required: {})\n",
            settings.app_name,
            if settings.requires_auth { "yes" } else { "no" }
        ));
    }
    match (&session.user, &session.auth_error) {
        (Some(user), _) if session.is_authenticated => {
            out.push_str(&format!("Signed in as {} ({})", user.name, user.id));
            if !user.email.is_empty() {
                out.push_str(&format!(" <{}>", user.email));
            }
            out.push('\n');
        }
        (_, Some(err)) => out.push_str(&format!("Not signed in: {}\n", err.message)),
        _ => out.push_str("Not signed in\n"),
    }
    out
}

/// Fetch events with their affected resources and write a snapshot that `source = "file"`
/// can serve later.
pub fn run_export(
    source: &dyn EventSource,
    out: &Path,
    limit: usize,
    exported_at: OffsetDateTime,
) -> Result<EventSnapshot, AppError> {
    let mut events = source.get_events(&EventQuery::with_limit(limit))?;
    for event in &mut events {
        if event.affected_entities.is_empty() {
            event.affected_entities = source.get_affected_entities(&event.arn)?;
        }
    }
    let snapshot = write_snapshot(out, events, exported_at)?;
    info!(path = %out.display(), events = snapshot.events.len(), "snapshot exported");
    Ok(snapshot)
}
