//! Offline stand-in for the chat backend.
//!
//! Routes a query to a canned answer using keyword heuristics. The keyword
//! lists are illustrative, not a routing contract.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use uuid::Uuid;

use crate::error::ChatResult;
use crate::payload::{
    Chart, ChartType, Confidence, Dataset, Evidence, NavigatorPayload, Payload, Step, Table,
    TrustbotPayload,
};
use crate::pipeline::Pipeline;
use crate::responder::Responder;

/// Simulated network latency for demo answers.
pub const DEMO_LATENCY: Duration = Duration::from_millis(600);

const DATA_TERMS: &str = r"\b(budget|spend|spending|procurement|vendors?|invoices?|payments?|salary|hr|headcount|leave|trend|average|median|mean|percent|sum|count|compare|q[1-4]|quarter|fy|table|chart|top|outliers?|anomaly)\b";

const BEREAVEMENT_TERMS: &str = r"\b(die|dies|died|dying|death|deceased|passed away|funeral|bereave\w*|widow\w*|someone close)\b";

fn data_terms() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATA_TERMS).expect("data term pattern is valid"))
}

fn bereavement_terms() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BEREAVEMENT_TERMS).expect("bereavement pattern is valid"))
}

pub fn looks_like_data_query(query: &str) -> bool {
    data_terms().is_match(&query.to_lowercase())
}

pub fn looks_like_bereavement(query: &str) -> bool {
    bereavement_terms().is_match(&query.to_lowercase())
}

/// Pick a canned payload for `query`. A forced pipeline always wins.
pub fn classify(query: &str, pipeline: Pipeline) -> Payload {
    let audit_id = new_audit_id();
    match pipeline {
        Pipeline::Trustbot => spending_answer(audit_id),
        Pipeline::Navigator => navigator_answer(query, audit_id),
        Pipeline::Auto => {
            if !looks_like_bereavement(query) && looks_like_data_query(query) {
                spending_answer(audit_id)
            } else {
                navigator_answer(query, audit_id)
            }
        }
    }
}

/// Twelve hex characters of a random UUID.
pub fn new_audit_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

fn navigator_answer(query: &str, audit_id: String) -> Payload {
    if looks_like_bereavement(query) {
        bereavement_answer(audit_id)
    } else {
        services_answer(audit_id)
    }
}

fn step(title: &str, link: Option<&str>, deadline: Option<&str>) -> Step {
    Step {
        title: title.to_string(),
        link: link.map(str::to_string),
        deadline: deadline.map(str::to_string),
    }
}

fn evidence(title: &str, url: &str, updated: &str, score: f64, snippet: &str) -> Evidence {
    Evidence {
        title: title.to_string(),
        url: Some(url.to_string()),
        source: None,
        updated: Some(updated.to_string()),
        score: Some(score),
        snippet: Some(snippet.to_string()),
    }
}

fn bereavement_answer(audit_id: String) -> Payload {
    Payload::Navigator(NavigatorPayload {
        answer: Some(
            "I'm sorry for your loss. These are the usual first steps after someone dies in Australia."
                .to_string(),
        ),
        steps: vec![
            step(
                "Register the death",
                Some("https://www.servicesaustralia.gov.au/what-to-do-when-someone-dies"),
                Some("Usually done by the funeral director within 7 days"),
            ),
            step(
                "Tell Services Australia",
                Some("https://www.servicesaustralia.gov.au/tell-us-about-death"),
                None,
            ),
            step(
                "Check for bereavement payments",
                Some("https://www.servicesaustralia.gov.au/bereavement-payment"),
                Some("Claim within 28 days"),
            ),
            step(
                "Notify the ATO, banks and insurers",
                Some("https://www.ato.gov.au/individuals-and-families/deceased-estates"),
                None,
            ),
        ],
        evidence: vec![evidence(
            "What to do when someone dies",
            "https://www.servicesaustralia.gov.au/what-to-do-when-someone-dies",
            "2025-05-10",
            0.91,
            "Find out what to do following a death, including registering the death and payments you may be able to get.",
        )],
        confidence: Some(Confidence {
            level: "high".to_string(),
            score: Some(0.8),
        }),
        audit_id: Some(audit_id),
    })
}

fn services_answer(audit_id: String) -> Payload {
    Payload::Navigator(NavigatorPayload {
        answer: Some("Here are recommended steps based on official sources:".to_string()),
        steps: vec![
            step(
                "Check: Home Care Packages Overview",
                Some("https://www.myagedcare.gov.au/"),
                None,
            ),
            step(
                "Check: Carer Allowance",
                Some("https://www.servicesaustralia.gov.au/"),
                None,
            ),
        ],
        evidence: vec![
            evidence(
                "Home Care Packages Overview",
                "https://www.myagedcare.gov.au/",
                "2025-06-01",
                0.64,
                "Home Care Packages help older people to receive care at home. Step: contact My Aged Care to arrange an assessment.",
            ),
            evidence(
                "Carer Allowance",
                "https://www.servicesaustralia.gov.au/",
                "2025-05-10",
                0.58,
                "Carer Allowance is a fortnightly supplement for people who give daily care.",
            ),
        ],
        confidence: Some(Confidence {
            level: "high".to_string(),
            score: Some(0.7),
        }),
        audit_id: Some(audit_id),
    })
}

fn spending_answer(audit_id: String) -> Payload {
    Payload::Trustbot(TrustbotPayload {
        answer: Some("Top procurement payments for 2023-24 Q2 (demo data).".to_string()),
        table: Some(Table {
            columns: ["vendor", "amount", "date", "category"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows: vec![
                vec![json!("Acme Pty Ltd"), json!(830000), json!("2024-02-13"), json!("IT")],
                vec![json!("Koala Tech"), json!(790000), json!("2024-03-29"), json!("Services")],
                vec![json!("Wattle Solutions"), json!(670000), json!("2024-01-19"), json!("Consulting")],
            ],
        }),
        chart: Some(Chart {
            chart_type: ChartType::Bar,
            x: "vendor".to_string(),
            y: "amount".to_string(),
        }),
        sql: Some(
            "SELECT vendor, amount, paid_at as date, category FROM procurement_payments WHERE quarter='2023-24 Q2' AND amount >= 500000 ORDER BY amount DESC LIMIT 10;"
                .to_string(),
        ),
        dataset: Some(Dataset {
            name: Some("AusTender Demo".to_string()),
            period: Some("2023-07-01..2024-06-30".to_string()),
            last_updated: Some("2024-06-30T00:00:00".to_string()),
        }),
        confidence: Some(Confidence {
            level: "exact".to_string(),
            score: Some(1.0),
        }),
        audit_id: Some(audit_id),
    })
}

/// Answers queries locally after an artificial delay.
#[derive(Debug, Clone)]
pub struct DemoResponder {
    latency: Duration,
}

impl Default for DemoResponder {
    fn default() -> Self {
        Self::new(DEMO_LATENCY)
    }
}

impl DemoResponder {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Responder for DemoResponder {
    async fn respond(&self, query: &str, pipeline: Pipeline) -> ChatResult<Payload> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let payload = classify(query, pipeline);
        tracing::debug!(kind = payload.kind(), "demo responder answered");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bereavement_query_registers_death_first() {
        let payload = classify("what to do when someone dies", Pipeline::Auto);
        let Payload::Navigator(nav) = payload else {
            panic!("expected navigator");
        };
        assert!(!nav.steps.is_empty());
        assert_eq!(nav.steps[0].title, "Register the death");
    }

    #[test]
    fn test_aggregation_query_routes_to_trustbot() {
        let payload = classify("show top vendor payments this quarter", Pipeline::Auto);
        let Payload::Trustbot(tb) = payload else {
            panic!("expected trustbot");
        };
        assert!(!tb.table.unwrap().rows.is_empty());
    }

    #[test]
    fn test_general_query_defaults_to_navigator() {
        let payload = classify("how do I apply for carer allowance", Pipeline::Auto);
        let Payload::Navigator(nav) = payload else {
            panic!("expected navigator");
        };
        assert_eq!(nav.steps[0].title, "Check: Home Care Packages Overview");
    }

    #[test]
    fn test_forced_pipeline_wins() {
        assert!(matches!(
            classify("what to do when someone dies", Pipeline::Trustbot),
            Payload::Trustbot(_)
        ));
        assert!(matches!(
            classify("show top vendor payments this quarter", Pipeline::Navigator),
            Payload::Navigator(_)
        ));
    }

    #[test]
    fn test_audit_ids_are_fresh() {
        let a = classify("hello", Pipeline::Auto);
        let b = classify("hello", Pipeline::Auto);
        let (a, b) = (a.audit_id().unwrap(), b.audit_id().unwrap());
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_query_same_shape() {
        let mut a = classify("budget trend", Pipeline::Auto);
        let mut b = classify("budget trend", Pipeline::Auto);
        for p in [&mut a, &mut b] {
            if let Payload::Trustbot(tb) = p {
                tb.audit_id = None;
            }
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_data_terms_need_word_boundaries() {
        assert!(!looks_like_data_query("stopwatch"));
        assert!(looks_like_data_query("Compare Q2 spending"));
    }

    #[tokio::test]
    async fn test_responder_answers_without_latency() {
        let responder = DemoResponder::new(Duration::ZERO);
        let payload = responder.respond("funeral costs", Pipeline::Auto).await.unwrap();
        assert!(payload.is_navigator());
    }
}
