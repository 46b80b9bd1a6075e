//! Text projections of tracker values.

use chrono::DateTime;
use jirafs_tracker::{IssueLink, Progress};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

const TIMESTAMP_INPUT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
const TIMESTAMP_OUTPUT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Formats whole seconds as a time span such as `1h30m0s`, `2m0s` or `45s`.
pub fn format_duration(seconds: i64) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }
    let sign = if seconds < 0 { "-" } else { "" };
    let total = seconds.unsigned_abs();
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{secs}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{secs}s")
    } else {
        format!("{sign}{secs}s")
    }
}

pub fn render_progress(progress: &Progress) -> String {
    let remaining = progress.total - progress.progress;
    format!(
        "Progress: {}, Remaining: {}, Total: {}\n",
        format_duration(progress.progress),
        format_duration(remaining),
        format_duration(progress.total)
    )
}

/// Renders a tracker timestamp; unparseable input is returned unchanged.
pub fn render_timestamp(raw: &str) -> String {
    match DateTime::parse_from_str(raw, TIMESTAMP_INPUT) {
        Ok(parsed) => parsed.format(TIMESTAMP_OUTPUT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// One link line, `INWARD OUTWARD RELATION`, from the point of view of
/// issue `key`.
pub fn render_issue_link(link: &IssueLink, key: &str) -> String {
    match (&link.outward_issue, &link.inward_issue) {
        (Some(outward), _) => format!("{key} {} {}", outward.key, link.link_type.name),
        (None, Some(inward)) => format!("{} {key} {}", inward.key, link.link_type.name),
        (None, None) => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLine {
    pub inward: String,
    pub outward: String,
    pub relation: String,
}

impl LinkLine {
    /// Parses a written link line. Anything other than exactly three
    /// whitespace separated tokens is rejected.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let (inward, outward, relation) = (tokens.next()?, tokens.next()?, tokens.next()?);
        if tokens.next().is_some() {
            return None;
        }
        Some(Self {
            inward: inward.to_string(),
            outward: outward.to_string(),
            relation: relation.to_string(),
        })
    }

    pub fn mentions(&self, key: &str) -> bool {
        self.inward == key || self.outward == key
    }
}

/// One value per line, each terminated by a newline.
pub fn lines<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values.into_iter().fold(String::new(), |mut out, value| {
        out.push_str(value.as_ref());
        out.push('\n');
        out
    })
}

pub fn strip_newlines(text: &str) -> String {
    text.replace('\n', "")
}

/// Pretty JSON indented with tabs.
pub fn tab_indented_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer)?;
    Ok(out)
}
