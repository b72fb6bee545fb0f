use time::format_description::well_known::Rfc3339;
use time::{format_description, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::domain::ValidationWarning;

/// Timezone-less formats accepted from event sources. Each is assumed UTC with a warning.
const NAIVE_FORMATS: [&str; 4] = [
    "[year]-[month]-[day]T[hour]:[minute]:[second]",
    "[year]-[month]-[day] [hour]:[minute]:[second]",
    "[year]-[month]-[day]T[hour]:[minute]",
    "[year]-[month]-[day] [hour]:[minute]",
];

fn parse_naive_assume_utc(
    raw: &str,
    fmt: &str,
    field: &str,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<OffsetDateTime> {
    let items = match format_description::parse(fmt) {
        Ok(i) => i,
        Err(e) => {
            warnings.push(
                ValidationWarning::new(
                    "INGEST_TS_FORMAT_CONFIG_FAILED",
                    format!("Timestamp format config error for {field}"),
                )
                .with_details(format!("fmt={fmt}; err={e}")),
            );
            return None;
        }
    };

    let pdt = PrimitiveDateTime::parse(raw, &items).ok()?;

    warnings.push(
        ValidationWarning::new(
            "INGEST_TS_TZ_ASSUMED_UTC",
            format!("Assumed UTC timezone for {field}"),
        )
        .with_details(format!("value={raw}; fmt={fmt}")),
    );
    Some(pdt.assume_utc())
}

/// Normalize an event-source timestamp into a UTC `OffsetDateTime`.
///
/// - Blank input is treated as absent without a warning.
/// - RFC3339 input is converted to UTC.
/// - A timezone-less allowlisted format is assumed UTC and warned about.
/// - Anything else is dropped (`None`) with an `INGEST_TS_UNPARSEABLE` warning.
pub fn normalize_timestamp(
    field: &str,
    raw_input: &str,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<OffsetDateTime> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(dt.to_offset(UtcOffset::UTC));
    }

    for fmt in NAIVE_FORMATS {
        if let Some(dt) = parse_naive_assume_utc(trimmed, fmt, field, warnings) {
            return Some(dt);
        }
    }

    warnings.push(
        ValidationWarning::new(
            "INGEST_TS_UNPARSEABLE",
            format!("Unparseable timestamp for {field}; treated as missing"),
        )
        .with_details(format!("raw={trimmed}")),
    );
    None
}

/// Format as RFC3339 UTC, falling back to the debug form if formatting fails.
pub fn format_rfc3339(dt: OffsetDateTime) -> String {
    dt.to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| format!("{dt:?}"))
}
