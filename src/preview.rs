//! Short human-readable views of loaded records.

use crate::pipeline::normalize::{normalize, ProfileRecord};
use crate::record::{present_str, RawRecord};

/// Records listed before the "... and N more" line.
pub const PREVIEW_LIMIT: usize = 5;

const PREVIEW_UNKNOWN_NAME: &str = "Unknown Contact";
const PREVIEW_NO_TITLE: &str = "No title";

/// One line per record for the first [`PREVIEW_LIMIT`] records, plus a
/// trailing count of the rest.
pub fn preview_lines(records: &[RawRecord]) -> Vec<String> {
    let mut lines: Vec<String> = records
        .iter()
        .take(PREVIEW_LIMIT)
        .map(preview_line)
        .collect();
    let rest = records.len().saturating_sub(PREVIEW_LIMIT);
    if rest > 0 {
        let noun = if rest == 1 { "contact" } else { "contacts" };
        lines.push(format!("... and {rest} more {noun}"));
    }
    lines
}

/// `"<name> — <title>"`, with `" at <company>"` when a company is known.
pub fn preview_line(raw: &RawRecord) -> String {
    profile_preview_line(&normalize(raw))
}

/// [`preview_line`] for a record that is already normalized.
pub fn profile_preview_line(profile: &ProfileRecord) -> String {
    let (name, title) = name_and_title(profile);
    match present_str(&profile.company_name) {
        Some(company) => format!("{name} — {title} at {company}"),
        None => format!("{name} — {title}"),
    }
}

/// `"<index>. <name> - <title>"` for a record picker (1-indexed).
pub fn selector_label(index: usize, raw: &RawRecord) -> String {
    let (name, title) = name_and_title(&normalize(raw));
    format!("{index}. {name} - {title}")
}

/// Labels for every record, numbered from 1.
pub fn selector_labels(records: &[RawRecord]) -> Vec<String> {
    records
        .iter()
        .enumerate()
        .map(|(i, raw)| selector_label(i + 1, raw))
        .collect()
}

fn name_and_title(profile: &ProfileRecord) -> (String, String) {
    let name = present_str(&profile.full_name)
        .unwrap_or(PREVIEW_UNKNOWN_NAME)
        .to_string();
    let title = present_str(&profile.title)
        .unwrap_or(PREVIEW_NO_TITLE)
        .to_string();
    (name, title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn preview_defaults() {
        assert_eq!(
            preview_line(&raw(json!({ "company": "Acme" }))),
            "Unknown Contact — No title at Acme"
        );
        assert_eq!(
            preview_line(&raw(json!({ "Full Name": "Jane", "title": "CEO" }))),
            "Jane — CEO"
        );
    }

    #[test]
    fn normalized_profile_previews_directly() {
        let profile = ProfileRecord {
            full_name: "Jane Doe".into(),
            company_name: "Acme".into(),
            ..Default::default()
        };
        assert_eq!(profile_preview_line(&profile), "Jane Doe — No title at Acme");
        assert_eq!(
            profile_preview_line(&normalize(&raw(json!({ "Full Name": "Jane Doe", "company": "Acme" })))),
            preview_line(&raw(json!({ "Full Name": "Jane Doe", "company": "Acme" })))
        );
    }

    #[test]
    fn preview_is_capped_with_remainder() {
        let records: Vec<RawRecord> = (0..7)
            .map(|i| raw(json!({ "Full Name": format!("Person {i}") })))
            .collect();
        let lines = preview_lines(&records);
        assert_eq!(lines.len(), PREVIEW_LIMIT + 1);
        assert_eq!(lines.last().unwrap(), "... and 2 more contacts");

        let lines = preview_lines(&records[..6]);
        assert_eq!(lines.last().unwrap(), "... and 1 more contact");

        assert_eq!(preview_lines(&records[..3]).len(), 3);
    }

    #[test]
    fn selector_labels_are_numbered() {
        let records = vec![
            raw(json!({ "Full Name": "Jane Doe", "Person Title": "CEO" })),
            raw(json!({ "name": "Bob" })),
        ];
        assert_eq!(
            selector_labels(&records),
            vec!["1. Jane Doe - CEO", "2. Bob - No title"]
        );
    }
}
