//! Command-line input helpers: tags, dates, identifiers and display truncation.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};

use crate::state::AppState;

/// Normalize a tag string by trimming, lowercasing, and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalize each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() {
                tags.push(tag);
            }
        }
    }
    tags.sort();
    tags.dedup();
    tags
}

/// Parse a date relative to `today`.
///
/// Supports "today", "tomorrow", "yesterday", "in 3d", "in 2w", weekday names
/// (next occurrence, today included) and "YYYY-MM-DD".
pub fn parse_date_from(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    let weekdays = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];
    if let Some(target) = weekdays.iter().position(|d| s.starts_with(d)) {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target as i64 + 7 - current) % 7;
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Parse a date relative to the local calendar day, as a UTC midnight instant.
pub fn parse_date_input(s: &str) -> Option<DateTime<Utc>> {
    let day = parse_date_from(s, Local::now().date_naive())?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// First eight characters of an id, for tables.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Pick the single candidate matching an id, id prefix or (case-insensitive) name.
fn resolve<'a, I>(kind: &str, identifier: &str, candidates: I) -> Result<String, String>
where
    I: Iterator<Item = (&'a str, &'a str)> + Clone,
{
    if let Some((id, _)) = candidates.clone().find(|(id, _)| *id == identifier) {
        return Ok(id.to_string());
    }
    let wanted = identifier.to_lowercase();
    let matches: Vec<(&str, &str)> = candidates
        .filter(|(id, name)| id.starts_with(identifier) || name.to_lowercase() == wanted)
        .collect();
    match matches.len() {
        0 => Err(format!("No {kind} found matching '{identifier}'")),
        1 => Ok(matches[0].0.to_string()),
        _ => {
            let mut msg = format!("Multiple {kind}s match '{identifier}':\n");
            for (id, name) in matches {
                msg.push_str(&format!("  {}: {}\n", short_id(id), name));
            }
            msg.push_str("Please use a longer id instead.");
            Err(msg)
        }
    }
}

/// Resolve a project identifier (id, id prefix or name) to its id.
pub fn resolve_project(identifier: &str, state: &AppState) -> Result<String, String> {
    resolve("project", identifier, state.projects.iter().map(|p| (p.id.as_str(), p.name.as_str())))
}

/// Resolve a task identifier (id, id prefix or title) to its id.
pub fn resolve_task(identifier: &str, state: &AppState) -> Result<String, String> {
    resolve("task", identifier, state.tasks.iter().map(|t| (t.id.as_str(), t.title.as_str())))
}
