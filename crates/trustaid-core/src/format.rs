//! Pure formatting helpers shared by every frontend.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::payload::{Payload, Table};

/// Shown in place of a missing or null table cell.
pub const PLACEHOLDER: &str = "\u{2014}";

const NAVIGATOR_HEADER: &str = "Here are the steps:";
const TRUSTBOT_PLACEHOLDER: &str = "Here are the results.";

/// Plain-text rendering of a payload, used as the transcript entry content.
///
/// Navigator answers get their step titles appended as a numbered list.
/// Kinds without a narrative produce an empty string.
pub fn fallback_text(payload: &Payload) -> String {
    match payload {
        Payload::Navigator(nav) => {
            let mut text = nav
                .answer
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| NAVIGATOR_HEADER.to_string());
            if !nav.steps.is_empty() {
                text.push_str("\n\n");
                let numbered: Vec<String> = nav
                    .steps
                    .iter()
                    .enumerate()
                    .map(|(i, step)| format!("{}. {}", i + 1, step.title))
                    .collect();
                text.push_str(&numbered.join("\n"));
            }
            text
        }
        Payload::Trustbot(tb) => tb
            .answer
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| TRUSTBOT_PLACEHOLDER.to_string()),
        Payload::Error { .. } | Payload::Unknown { .. } => String::new(),
    }
}

/// Zip column names with each row's positional values.
///
/// Short rows are padded with `null`; values beyond the last column are dropped.
pub fn project_rows(table: &Table) -> Vec<Map<String, Value>> {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .enumerate()
                .map(|(i, column)| (column.clone(), row.get(i).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect()
}

/// Display text for one table cell.
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                let grouped = group_digits(&i.unsigned_abs().to_string());
                if i < 0 {
                    format!("-{}", grouped)
                } else {
                    grouped
                }
            } else {
                n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())
            }
        }
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Format a number with thousands separators and at most three decimals.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }

    let rounded = format!("{:.3}", n.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if n < 0.0 && (int_part != "0" || !frac.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Render a backend timestamp as a calendar date ("10 May 2025").
///
/// Accepts RFC 3339, naive ISO-8601 date-times and plain dates; anything else
/// is returned unchanged.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%-d %b %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Render a score in [0, 1] as a whole percentage.
pub fn format_percent(score: f64) -> String {
    format!("{:.0}%", score.clamp(0.0, 1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{NavigatorPayload, Step, TrustbotPayload};
    use serde_json::json;

    fn nav_with_steps(answer: Option<&str>, steps: &[&str]) -> Payload {
        Payload::Navigator(NavigatorPayload {
            answer: answer.map(str::to_string),
            steps: steps
                .iter()
                .map(|t| Step {
                    title: t.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_navigator_fallback_numbers_steps() {
        let payload = nav_with_steps(Some("Do this."), &["First", "Second"]);
        assert_eq!(fallback_text(&payload), "Do this.\n\n1. First\n2. Second");
    }

    #[test]
    fn test_navigator_fallback_uses_header_without_answer() {
        let payload = nav_with_steps(None, &["Only"]);
        assert_eq!(fallback_text(&payload), "Here are the steps:\n\n1. Only");
    }

    #[test]
    fn test_trustbot_fallback_placeholder() {
        let payload = Payload::Trustbot(TrustbotPayload::default());
        assert_eq!(fallback_text(&payload), "Here are the results.");
    }

    #[test]
    fn test_other_kinds_have_empty_fallback() {
        let error = Payload::Error {
            message: Some("boom".to_string()),
        };
        let unknown = Payload::Unknown {
            kind: "unknown_future_type".to_string(),
            raw: json!({"kind": "unknown_future_type"}),
        };
        assert_eq!(fallback_text(&error), "");
        assert_eq!(fallback_text(&unknown), "");
    }

    #[test]
    fn test_fallback_is_idempotent() {
        let payload = nav_with_steps(Some("Answer"), &["A", "B", "C"]);
        assert_eq!(fallback_text(&payload), fallback_text(&payload));
    }

    #[test]
    fn test_project_rows_with_null() {
        let table = Table {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![json!(1), Value::Null]],
        };
        let rows = project_rows(&table);
        assert_eq!(rows.len(), 1);
        assert_eq!(Value::Object(rows[0].clone()), json!({"a": 1, "b": null}));
        assert_eq!(format_cell(rows[0].get("b")), PLACEHOLDER);
    }

    #[test]
    fn test_project_rows_pads_and_truncates() {
        let table = Table {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![json!("x")], vec![json!(1), json!(2), json!(3)]],
        };
        let rows = project_rows(&table);
        assert_eq!(Value::Object(rows[0].clone()), json!({"a": "x", "b": null}));
        assert_eq!(Value::Object(rows[1].clone()), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_format_cell_numbers() {
        assert_eq!(format_cell(Some(&json!(830000))), "830,000");
        assert_eq!(format_cell(Some(&json!(-1234567))), "-1,234,567");
        assert_eq!(format_cell(Some(&json!(999))), "999");
        assert_eq!(format_cell(Some(&json!(1234.5))), "1,234.5");
        assert_eq!(format_cell(None), PLACEHOLDER);
        assert_eq!(format_cell(Some(&json!("Acme"))), "Acme");
    }

    #[test]
    fn test_format_number_rounding() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1_000_000.125), "1,000,000.125");
        assert_eq!(format_number(2.0004), "2");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn test_format_date_variants() {
        assert_eq!(format_date("2025-05-10"), "10 May 2025");
        assert_eq!(format_date("2024-06-30T12:01:02.123456"), "30 Jun 2024");
        assert_eq!(format_date("2025-06-01T00:00:00Z"), "1 Jun 2025");
        assert_eq!(format_date("last week"), "last week");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.82), "82%");
        assert_eq!(format_percent(1.5), "100%");
    }
}
