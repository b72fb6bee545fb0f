use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::dashboard::{DashboardView, ViewMode};
use crate::detail::{console_url, filter_entities, ResourceSummary};
use crate::domain::Incident;
use crate::group::AccountGroup;
use crate::normalize::timestamps::format_rfc3339;

const DASH: &str = "-";

fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn opt(value: Option<&str>) -> &str {
    value.filter(|s| !s.is_empty()).unwrap_or(DASH)
}

fn ts(value: Option<OffsetDateTime>) -> String {
    value.map(format_rfc3339).unwrap_or_else(|| DASH.to_string())
}

fn clock(value: Option<OffsetDateTime>) -> String {
    let fmt = format_description!("[hour]:[minute]:[second]");
    value
        .and_then(|t| t.to_offset(UtcOffset::UTC).format(fmt).ok())
        .map(|s| format!("{s} UTC"))
        .unwrap_or_else(|| DASH.to_string())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "event"
    } else {
        "events"
    }
}

fn account_label(inc: &Incident) -> &str {
    inc.account_alias
        .as_deref()
        .or(inc.account_id.as_deref())
        .unwrap_or(DASH)
}

fn render_stats(view: &DashboardView, out: &mut String) {
    let s = &view.stats;
    let action_note = if s.action_required > 0 {
        "Needs attention"
    } else {
        "All clear"
    };
    let scheduled_note = if s.scheduled > 0 {
        "Upcoming maintenance"
    } else {
        "None scheduled"
    };
    out.push_str("| Action Required | Open Issues | Scheduled Changes | Notifications |\n");
    out.push_str("|---:|---:|---:|---:|\n");
    out.push_str(&format!(
        "| {} ({action_note}) | {} | {} ({scheduled_note}) | {} |\n\n",
        s.action_required, s.open_issues, s.scheduled, s.notifications
    ));
    if s.prd_affected > 0 {
        out.push_str(&format!(
            "Open issues affecting PRD accounts: **{}**\n\n",
            s.prd_affected
        ));
    }
}

fn render_table(view: &DashboardView, out: &mut String) {
    if view.incidents.is_empty() {
        out.push_str("No events match the current filters.\n");
        return;
    }
    out.push_str("| Actionability | Category | Service | Region | Account | Env | Status | Title | Last update |\n");
    out.push_str("|---|---|---|---|---|---|---|---|---|\n");
    for inc in &view.incidents {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            inc.actionability.label(),
            inc.category.label(),
            cell(opt(inc.service.as_deref())),
            cell(opt(inc.region.as_deref())),
            cell(account_label(inc)),
            inc.environment.map(|e| e.as_str()).unwrap_or(DASH),
            inc.status.as_str(),
            cell(&inc.title),
            ts(inc.last_updated_time),
        ));
    }
}

fn render_group(group: &AccountGroup, expanded: bool, out: &mut String) {
    let marker = if expanded { "v" } else { ">" };
    out.push_str(&format!("### {marker} {}", group.display_name()));
    if let Some(id) = &group.account_id {
        out.push_str(&format!(" ({id})"));
    }
    if let Some(env) = group.environment {
        out.push_str(&format!(" [{}]", env.as_str()));
    }
    out.push_str("\n\n");
    let n = group.incidents.len();
    out.push_str(&format!(
        "Action required: {} | May be required: {} | Informational: {} | {n} {}\n",
        group.summary.action_required,
        group.summary.action_may_be_required,
        group.summary.informational,
        plural(n)
    ));
    if expanded {
        out.push('\n');
        for inc in &group.incidents {
            out.push_str(&format!(
                "- [{}] {} {}: {} ({}, {})\n",
                inc.actionability.as_str(),
                opt(inc.service.as_deref()),
                opt(inc.region.as_deref()),
                inc.title,
                inc.category.label(),
                inc.status.as_str()
            ));
        }
    }
    out.push('\n');
}

fn render_groups(view: &DashboardView, is_expanded: &dyn Fn(&str) -> bool, out: &mut String) {
    if view.groups.is_empty() {
        out.push_str("No accounts with events. All accounts are healthy.\n");
        return;
    }
    for group in &view.groups {
        render_group(group, is_expanded(&group.key), out);
    }
}

/// Render one dashboard cycle as deterministic Markdown.
///
/// `is_expanded` decides which account groups list their incidents in the account view.
pub fn render_dashboard(
    view: &DashboardView,
    last_updated: Option<OffsetDateTime>,
    mode: ViewMode,
    is_expanded: &dyn Fn(&str) -> bool,
) -> String {
    let mut out = String::new();
    out.push_str("# AWS Health Events Dashboard\n\n");
    out.push_str(&format!("Last updated: {}\n\n", clock(last_updated)));
    render_stats(view, &mut out);

    let n = view.event_count;
    match mode {
        ViewMode::Table => {
            out.push_str(&format!("## Events ({n} {})\n\n", plural(n)));
            render_table(view, &mut out);
        }
        ViewMode::Account => {
            out.push_str(&format!("## Events by account ({n} {})\n\n", plural(n)));
            render_groups(view, is_expanded, &mut out);
        }
    }
    out
}

/// Render the detail panel for one incident, optionally narrowing the resource list.
pub fn render_incident_detail(incident: &Incident, resource_search: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", incident.title));

    let region = match (incident.region.as_deref(), incident.availability_zone.as_deref()) {
        (r, Some(az)) => format!("{} ({az})", opt(r)),
        (r, None) => opt(r).to_string(),
    };
    let account = match (incident.account_alias.as_deref(), incident.account_id.as_deref()) {
        (Some(alias), Some(id)) => format!("{alias} ({id})"),
        (alias, id) => opt(alias.or(id)).to_string(),
    };

    out.push_str(&format!("- Category: {}\n", incident.category.label()));
    out.push_str(&format!("- Actionability: {}\n", incident.actionability.label()));
    out.push_str(&format!(
        "- Environment: {}\n",
        incident.environment.map(|e| e.as_str()).unwrap_or(DASH)
    ));
    out.push_str(&format!("- Service: {}\n", opt(incident.service.as_deref())));
    out.push_str(&format!("- Region / Availability Zone: {region}\n"));
    out.push_str(&format!("- Account: {account}\n"));
    out.push_str(&format!("- Status: {}\n", incident.status.as_str()));
    out.push_str(&format!("- Start: {}\n", ts(incident.start_time)));
    out.push_str(&format!("- End: {}\n", ts(incident.end_time)));
    out.push_str(&format!("- Last updated: {}\n", ts(incident.last_updated_time)));
    out.push_str(&format!("- ARN: `{}`\n\n", incident.arn));

    out.push_str("## Description\n\n");
    out.push_str(&incident.description);
    out.push_str("\n\n");

    let entities = &incident.affected_entities;
    out.push_str(&format!("## Affected resources ({})\n\n", entities.len()));
    if entities.is_empty() {
        out.push_str("No affected resources reported.\n");
        return out;
    }

    let s = ResourceSummary::from_entities(entities);
    out.push_str(&format!(
        "Pending: {} | Resolved: {} | Impaired: {} | Unknown: {}\n\n",
        s.pending, s.resolved, s.impaired, s.unknown
    ));

    let shown = filter_entities(entities, resource_search);
    if shown.is_empty() {
        out.push_str("No resources match the search.\n");
        return out;
    }
    out.push_str("| Resource | Type | Status | Console |\n");
    out.push_str("|---|---|---|---|\n");
    for e in shown {
        let url = console_url(
            e.entity_type.as_deref(),
            e.entity_value.as_deref(),
            incident.region.as_deref(),
        );
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(opt(e.entity_value.as_deref())),
            cell(opt(e.entity_type.as_deref())),
            opt(e.status.as_deref()),
            url.as_deref().unwrap_or(DASH)
        ));
    }
    out
}
