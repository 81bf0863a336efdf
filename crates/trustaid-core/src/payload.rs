//! Backend response payloads.
//!
//! The backend returns loosely shaped JSON tagged by a `kind` field. Parsing
//! never fails once the body is a JSON object: fields that are missing or have
//! the wrong type simply come out as `None`, and unrecognised kinds are kept
//! whole so the UI can dump them.

use serde_json::{Map, Value};

use crate::error::{ChatError, ChatResult};

/// A parsed backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Navigator(NavigatorPayload),
    Trustbot(TrustbotPayload),
    /// Backend-reported failure. `message` is shown verbatim if present.
    Error { message: Option<String> },
    /// A `kind` this client does not know about (or no `kind` at all).
    Unknown { kind: String, raw: Value },
}

/// Service-navigation answer: narrative plus steps and citations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigatorPayload {
    pub answer: Option<String>,
    pub steps: Vec<Step>,
    pub evidence: Vec<Evidence>,
    pub confidence: Option<Confidence>,
    pub audit_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub title: String,
    pub link: Option<String>,
    pub deadline: Option<String>,
}

/// A cited source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evidence {
    pub title: String,
    pub url: Option<String>,
    pub source: Option<String>,
    pub updated: Option<String>,
    /// Retrieval similarity in [0, 1].
    pub score: Option<f64>,
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Confidence {
    pub level: String,
    pub score: Option<f64>,
}

/// Spending-data answer: a result table, optional chart hints and the SQL
/// that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrustbotPayload {
    pub answer: Option<String>,
    pub table: Option<Table>,
    pub chart: Option<Chart>,
    pub sql: Option<String>,
    pub dataset: Option<Dataset>,
    pub confidence: Option<Confidence>,
    pub audit_id: Option<String>,
}

/// Column names plus positional rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Bar,
    Line,
}

/// Chart hint: `x` and `y` name columns of the accompanying table.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub chart_type: ChartType,
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub name: Option<String>,
    pub period: Option<String>,
    pub last_updated: Option<String>,
}

impl Payload {
    /// Parse a response body. Only a non-object body is an error.
    pub fn from_json(body: &str) -> ChatResult<Self> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| ChatError::MalformedBody(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> ChatResult<Self> {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                return Err(ChatError::MalformedBody(format!(
                    "expected a JSON object, got {}",
                    json_type_name(&value)
                )))
            }
        };

        let kind = obj.get("kind").and_then(Value::as_str).unwrap_or_default();
        let payload = match kind {
            "navigator" => Payload::Navigator(NavigatorPayload::from_object(obj)),
            "trustbot" => Payload::Trustbot(TrustbotPayload::from_object(obj)),
            "error" => Payload::Error {
                message: string(obj, "message").or_else(|| string(obj, "answer")),
            },
            other => Payload::Unknown {
                kind: other.to_string(),
                raw: value.clone(),
            },
        };
        Ok(payload)
    }

    pub fn kind(&self) -> &str {
        match self {
            Payload::Navigator(_) => "navigator",
            Payload::Trustbot(_) => "trustbot",
            Payload::Error { .. } => "error",
            Payload::Unknown { kind, .. } => kind,
        }
    }

    pub fn audit_id(&self) -> Option<&str> {
        match self {
            Payload::Navigator(nav) => nav.audit_id.as_deref(),
            Payload::Trustbot(tb) => tb.audit_id.as_deref(),
            _ => None,
        }
    }

    pub fn is_navigator(&self) -> bool {
        matches!(self, Payload::Navigator(_))
    }
}

impl NavigatorPayload {
    fn from_object(obj: &Map<String, Value>) -> Self {
        // Older backends only send `citations`; use them when `evidence` is absent.
        let mut evidence = list(obj, "evidence", Evidence::from_value);
        if evidence.is_empty() {
            evidence = list(obj, "citations", Evidence::from_value);
        }

        Self {
            answer: string(obj, "answer"),
            steps: list(obj, "steps", Step::from_value),
            evidence,
            confidence: obj.get("confidence").and_then(Confidence::from_value),
            audit_id: string(obj, "audit_id"),
        }
    }
}

impl Step {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(title) => Some(Step {
                title: title.clone(),
                ..Default::default()
            }),
            Value::Object(obj) => Some(Step {
                title: string(obj, "title")?,
                link: string(obj, "link").or_else(|| string(obj, "url")),
                deadline: string(obj, "deadline"),
            }),
            _ => None,
        }
    }
}

impl Evidence {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Evidence {
            title: string(obj, "title")?,
            url: string(obj, "url"),
            source: string(obj, "source"),
            updated: string(obj, "updated_at").or_else(|| string(obj, "updated")),
            score: number(obj, "similarity")
                .or_else(|| number(obj, "score"))
                .map(|s| s.clamp(0.0, 1.0)),
            snippet: string(obj, "snippet"),
        })
    }
}

impl Confidence {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Confidence {
            level: string(obj, "level")?,
            score: number(obj, "score").map(|s| s.clamp(0.0, 1.0)),
        })
    }
}

impl TrustbotPayload {
    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            answer: string(obj, "answer"),
            table: obj.get("table").and_then(Table::from_value),
            chart: obj.get("chart").and_then(Chart::from_value),
            sql: string(obj, "sql"),
            dataset: obj.get("dataset").and_then(Dataset::from_value),
            confidence: obj.get("confidence").and_then(Confidence::from_value),
            audit_id: string(obj, "audit_id"),
        }
    }
}

impl Table {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let columns = obj
            .get("columns")?
            .as_array()?
            .iter()
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        let rows = obj
            .get("rows")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.as_array().cloned())
                    .collect()
            })
            .unwrap_or_default();
        Some(Table { columns, rows })
    }
}

impl Chart {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let chart_type = match obj.get("type").and_then(Value::as_str)? {
            "bar" => ChartType::Bar,
            "line" => ChartType::Line,
            _ => return None,
        };
        Some(Chart {
            chart_type,
            x: string(obj, "x")?,
            y: string(obj, "y")?,
        })
    }
}

impl Dataset {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Dataset {
            name: string(obj, "name"),
            period: string(obj, "period"),
            last_updated: string(obj, "last_updated").or_else(|| string(obj, "updated_at")),
        })
    }
}

fn string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

fn list<T>(obj: &Map<String, Value>, key: &str, parse: fn(&Value) -> Option<T>) -> Vec<T> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse).collect())
        .unwrap_or_default()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_navigator_with_all_fields() {
        let payload = Payload::from_value(json!({
            "kind": "navigator",
            "answer": "Apply for Carer Allowance.",
            "steps": [
                {"title": "Check eligibility", "link": "https://example.gov.au", "deadline": "2025-07-01"},
                "Gather identity documents"
            ],
            "evidence": [
                {"title": "Carer Allowance", "url": "https://example.gov.au", "updated_at": "2025-05-10", "similarity": 0.82}
            ],
            "confidence": {"level": "high", "score": 0.8},
            "audit_id": "abc123"
        }))
        .unwrap();

        let Payload::Navigator(nav) = payload else {
            panic!("expected navigator");
        };
        assert_eq!(nav.answer.as_deref(), Some("Apply for Carer Allowance."));
        assert_eq!(nav.steps.len(), 2);
        assert_eq!(nav.steps[0].deadline.as_deref(), Some("2025-07-01"));
        assert_eq!(nav.steps[1].title, "Gather identity documents");
        assert_eq!(nav.evidence[0].score, Some(0.82));
        assert_eq!(nav.confidence.unwrap().level, "high");
        assert_eq!(nav.audit_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_navigator_falls_back_to_citations() {
        let payload = Payload::from_value(json!({
            "kind": "navigator",
            "citations": [{"title": "Home Care Packages Overview", "url": "https://www.myagedcare.gov.au/"}]
        }))
        .unwrap();
        let Payload::Navigator(nav) = payload else {
            panic!("expected navigator");
        };
        assert_eq!(nav.evidence.len(), 1);
        assert_eq!(nav.evidence[0].title, "Home Care Packages Overview");
    }

    #[test]
    fn test_wrong_field_types_are_ignored() {
        let payload = Payload::from_value(json!({
            "kind": "navigator",
            "answer": 42,
            "steps": "not a list",
            "evidence": [{"url": "missing title"}, 7],
            "confidence": "high"
        }))
        .unwrap();
        assert_eq!(payload, Payload::Navigator(NavigatorPayload::default()));
    }

    #[test]
    fn test_parse_trustbot_table_and_chart() {
        let payload = Payload::from_value(json!({
            "kind": "trustbot",
            "table": {"columns": ["vendor", "amount"], "rows": [["Acme Pty Ltd", 830000], "junk"]},
            "chart": {"type": "bar", "x": "vendor", "y": "amount"},
            "sql": "SELECT vendor, amount FROM procurement_payments",
            "dataset": {"name": "AusTender Demo", "period": "2023-07-01..2024-06-30"}
        }))
        .unwrap();
        let Payload::Trustbot(tb) = payload else {
            panic!("expected trustbot");
        };
        let table = tb.table.unwrap();
        assert_eq!(table.columns, vec!["vendor", "amount"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(tb.chart.unwrap().chart_type, ChartType::Bar);
        assert_eq!(tb.dataset.unwrap().name.as_deref(), Some("AusTender Demo"));
    }

    #[test]
    fn test_unsupported_chart_type_is_dropped() {
        let payload = Payload::from_value(json!({
            "kind": "trustbot",
            "chart": {"type": "pie", "x": "vendor", "y": "amount"}
        }))
        .unwrap();
        let Payload::Trustbot(tb) = payload else {
            panic!("expected trustbot");
        };
        assert!(tb.chart.is_none());
    }

    #[test]
    fn test_unknown_kind_keeps_raw() {
        let raw = json!({"kind": "unknown_future_type", "widgets": [1, 2]});
        let payload = Payload::from_value(raw.clone()).unwrap();
        assert_eq!(payload.kind(), "unknown_future_type");
        assert_eq!(
            payload,
            Payload::Unknown {
                kind: "unknown_future_type".to_string(),
                raw
            }
        );
    }

    #[test]
    fn test_missing_kind_is_unknown() {
        let payload = Payload::from_value(json!({"answer": "hi"})).unwrap();
        assert!(matches!(payload, Payload::Unknown { ref kind, .. } if kind.is_empty()));
    }

    #[test]
    fn test_error_kind_keeps_message() {
        let payload = Payload::from_value(json!({"kind": "error", "message": "quota"})).unwrap();
        assert_eq!(
            payload,
            Payload::Error {
                message: Some("quota".to_string())
            }
        );
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        assert!(matches!(
            Payload::from_json("[1, 2, 3]"),
            Err(ChatError::MalformedBody(_))
        ));
        assert!(matches!(
            Payload::from_json("<html>502</html>"),
            Err(ChatError::MalformedBody(_))
        ));
    }
}
