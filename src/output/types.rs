use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const SCHEMA_VERSION: &str = "ballot.v1";

/// What a command printed: the units it would scrape, or what it wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Plan(Value),
    Result(Value),
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

/// One line of stdout per command invocation. `apply` mirrors the body so
/// consumers can branch without probing keys.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub schema_version: &'static str,
    pub time: DateTime<Utc>,
    pub request_id: Uuid,
    pub op: &'static str,
    pub apply: bool,
    #[serde(flatten)]
    pub body: Body,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    fn new(op: &'static str, body: Body, meta: Option<Meta>) -> Self {
        Envelope {
            schema_version: SCHEMA_VERSION,
            time: Utc::now(),
            request_id: Uuid::new_v4(),
            op,
            apply: matches!(body, Body::Result(_)),
            body,
            meta,
        }
    }

    pub fn plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Envelope::new(op, Body::Plan(serde_json::to_value(plan)?), meta))
    }

    pub fn result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Envelope::new(op, Body::Result(serde_json::to_value(result)?), meta))
    }

    pub fn payload(&self) -> &Value {
        match &self.body {
            Body::Plan(v) | Body::Result(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_envelope_lists_units() {
        let env = Envelope::plan("stats", &json!({"years": [2022, 2023]}), None).unwrap();
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["schema_version"], "ballot.v1");
        assert_eq!(v["op"], "stats");
        assert_eq!(v["apply"], false);
        assert_eq!(v["plan"]["years"][1], 2023);
        assert!(v.get("result").is_none());
        assert!(v.get("meta").is_none());
    }

    #[test]
    fn result_envelope_carries_duration() {
        let env = Envelope::result("nc", &json!({"precinct_rows": 3}), Some(Meta { duration_ms: Some(12) })).unwrap();
        assert_eq!(env.payload()["precinct_rows"], 3);
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["apply"], true);
        assert_eq!(v["result"]["precinct_rows"], 3);
        assert_eq!(v["meta"]["duration_ms"], 12);
    }
}
