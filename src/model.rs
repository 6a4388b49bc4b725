use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `{ "items": [...] }` envelope returned by the list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Items<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "id", default, deserialize_with = "lenient_string", skip_serializing)]
    pub plain_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub merchant: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub merchant_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ip_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_fraud: bool,
}

impl Transaction {
    /// `_id`, falling back to `id`.
    pub fn identifier(&self) -> Option<&str> {
        self.id.as_deref().or(self.plain_id.as_deref())
    }

    /// Risk score with the safe default applied.
    pub fn score(&self) -> f64 {
        self.risk_score.unwrap_or(0.0)
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_level == Some(RiskLevel::High)
    }

    /// Event time, falling back to the record's creation time.
    pub fn occurred_at(&self) -> Option<&str> {
        self.timestamp.as_deref().or(self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "id", default, deserialize_with = "lenient_string", skip_serializing)]
    pub plain_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
}

impl Alert {
    pub fn identifier(&self) -> Option<&str> {
        self.id.as_deref().or(self.plain_id.as_deref())
    }

    pub fn score(&self) -> f64 {
        self.risk_score.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    pub fn parse(level: &str) -> RiskLevel {
        match level {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Unknown => write!(f, "unknown"),
        }
    }
}

/// Body of `POST /api/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTransaction {
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub merchant: String,
    pub merchant_category: String,
    pub country: String,
    pub channel: String,
    pub device_id: String,
    pub ip_address: String,
}

impl Default for NewTransaction {
    fn default() -> Self {
        Self {
            user_id: "u-1001".to_string(),
            amount: 120.25,
            currency: "USD".to_string(),
            merchant: "ShopCo".to_string(),
            merchant_category: "retail".to_string(),
            country: "US".to_string(),
            channel: "card".to_string(),
            device_id: "dev-1".to_string(),
            ip_address: "10.0.0.1".to_string(),
        }
    }
}

/// Raw simulator form fields, kept as typed so they can be echoed back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulatorForm {
    pub user_id: String,
    pub amount: String,
    pub currency: String,
    pub merchant: String,
    pub merchant_category: String,
    pub country: String,
    pub channel: String,
    pub device_id: String,
    pub ip_address: String,
}

impl Default for SimulatorForm {
    fn default() -> Self {
        let defaults = NewTransaction::default();
        Self {
            user_id: defaults.user_id,
            amount: defaults.amount.to_string(),
            currency: defaults.currency,
            merchant: defaults.merchant,
            merchant_category: defaults.merchant_category,
            country: defaults.country,
            channel: defaults.channel,
            device_id: defaults.device_id,
            ip_address: defaults.ip_address,
        }
    }
}

impl TryFrom<SimulatorForm> for NewTransaction {
    type Error = String;

    fn try_from(form: SimulatorForm) -> Result<Self, Self::Error> {
        let amount = form
            .amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .ok_or_else(|| format!("{} is not a valid amount", form.amount))?;

        Ok(NewTransaction {
            user_id: form.user_id,
            amount,
            currency: form.currency,
            merchant: form.merchant,
            merchant_category: form.merchant_category,
            country: form.country,
            channel: form.channel,
            device_id: form.device_id,
            ip_address: form.ip_address,
        })
    }
}

/// What the scoring API said about a simulated transaction.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SubmitOutcome {
    Scored {
        risk_score: f64,
        risk_level: Option<RiskLevel>,
    },
    Rejected {
        error: String,
    },
}

#[derive(Deserialize)]
struct ScoredBody {
    #[serde(default, deserialize_with = "lenient_number")]
    risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_level")]
    risk_level: Option<RiskLevel>,
}

impl SubmitOutcome {
    /// Interprets a submission response. Error payloads (`error` or `detail`)
    /// and non-success statuses are rejections; anything else is a score.
    pub fn from_response(success: bool, body: Value) -> SubmitOutcome {
        if let Some(message) = error_message(&body) {
            return SubmitOutcome::Rejected { error: message };
        }
        if !success {
            return SubmitOutcome::Rejected {
                error: match body {
                    Value::Null => "submission failed".to_string(),
                    Value::String(text) => text,
                    other => other.to_string(),
                },
            };
        }
        match serde_json::from_value::<ScoredBody>(body) {
            Ok(scored) => SubmitOutcome::Scored {
                risk_score: scored.risk_score.unwrap_or(0.0),
                risk_level: scored.risk_level,
            },
            Err(e) => SubmitOutcome::Rejected {
                error: e.to_string(),
            },
        }
    }
}

fn error_message(body: &Value) -> Option<String> {
    ["error", "detail"].iter().find_map(|key| match body.get(key)? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    })
}

/// Accepts numbers and numeric strings; everything else becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// Strings pass through and numbers are stringified (ids, epoch timestamps);
/// anything else becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Keeps string and numeric tags, dropping anything else.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(tags) => tags
            .into_iter()
            .filter_map(|tag| match tag {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_level<'de, D>(deserializer: D) -> Result<Option<RiskLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(level) => Some(RiskLevel::parse(&level)),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_deserializes_from_api_payload() {
        let transaction: Transaction = serde_json::from_str(r#"{"_id":"66b1","user_id":"u-1001","amount":120.25,"currency":"USD","merchant":"ShopCo","merchant_category":"retail","country":"US","channel":"card","device_id":"dev-1","ip_address":"10.0.0.1","timestamp":"2024-08-06T10:00:00Z","risk_score":87.5,"risk_level":"high","is_fraud":true}"#).expect("Error deserializing the transaction");

        assert_eq!(Some("66b1"), transaction.id.as_deref());
        assert_eq!(Some(120.25), transaction.amount);
        assert_eq!(87.5, transaction.score());
        assert!(transaction.is_high_risk());
        assert!(transaction.is_fraud);
    }

    #[test]
    fn malformed_numbers_fall_back_to_absent() {
        let transaction: Transaction =
            serde_json::from_value(json!({"risk_score": "oops", "amount": null, "is_fraud": "yes"}))
                .expect("Error deserializing the transaction");

        assert_eq!(None, transaction.risk_score);
        assert_eq!(0.0, transaction.score());
        assert_eq!(None, transaction.amount);
        assert!(!transaction.is_fraud);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let transaction: Transaction = serde_json::from_value(json!({"risk_score": " 42.5 "}))
            .expect("Error deserializing the transaction");

        assert_eq!(Some(42.5), transaction.risk_score);
    }

    #[test]
    fn unknown_risk_level_is_kept_as_unknown() {
        let alert: Alert = serde_json::from_value(json!({"risk_level": "critical", "tags": null}))
            .expect("Error deserializing the alert");

        assert_eq!(Some(RiskLevel::Unknown), alert.risk_level);
        assert!(alert.tags.is_empty());
    }

    #[test]
    fn numeric_ids_are_read_as_strings() {
        let transaction: Transaction = serde_json::from_value(json!({"_id": 17, "user_id": 1001}))
            .expect("Error deserializing the transaction");

        assert_eq!(Some("17"), transaction.id.as_deref());
        assert_eq!(Some("1001"), transaction.user_id.as_deref());
    }

    #[test]
    fn plain_id_is_used_when_underscore_id_is_missing() {
        let transaction: Transaction =
            serde_json::from_str(r#"{"id":"tx-42"}"#).expect("Error deserializing the transaction");
        assert_eq!(Some("tx-42"), transaction.identifier());

        let alert: Alert = serde_json::from_str(r#"{"_id":"a-1","id":"a-legacy"}"#)
            .expect("Error deserializing the alert");
        assert_eq!(Some("a-1"), alert.identifier());
    }

    #[test]
    fn odd_field_types_do_not_fail_the_list() {
        let transactions: Items<Transaction> = serde_json::from_value(json!({"items": [
            {"_id": "t1", "timestamp": "2024-08-06T10:00:00Z", "merchant": "ShopCo"},
            {"_id": "t2", "timestamp": 1723000000, "merchant": {"name": "Nested"}, "country": 840}
        ]}))
        .expect("Error deserializing items");

        assert_eq!(2, transactions.items.len());
        assert_eq!(Some("1723000000"), transactions.items[1].occurred_at());
        assert_eq!(None, transactions.items[1].merchant);
        assert_eq!(Some("840"), transactions.items[1].country.as_deref());

        let alerts: Items<Alert> = serde_json::from_value(json!({"items": [
            {"reason": "Velocity", "tags": ["geo", 7, null]},
            {"reason": 12, "tags": "geo"}
        ]}))
        .expect("Error deserializing items");

        assert_eq!(vec!["geo".to_string(), "7".to_string()], alerts.items[0].tags);
        assert_eq!(Some("12"), alerts.items[1].reason.as_deref());
        assert!(alerts.items[1].tags.is_empty());
    }

    #[test]
    fn created_at_is_used_when_timestamp_is_missing() {
        let transaction: Transaction =
            serde_json::from_value(json!({"created_at": "2024-08-06T10:00:00Z"}))
                .expect("Error deserializing the transaction");

        assert_eq!(Some("2024-08-06T10:00:00Z"), transaction.occurred_at());
    }

    #[test]
    fn missing_items_read_as_empty() {
        let items: Items<Alert> = serde_json::from_str("{}").expect("Error deserializing items");
        assert!(items.items.is_empty());

        let items: Items<Alert> =
            serde_json::from_str(r#"{"items":null}"#).expect("Error deserializing items");
        assert!(items.items.is_empty());
    }

    #[test]
    fn submit_outcome_reads_scores_and_errors() {
        assert_eq!(
            SubmitOutcome::Scored {
                risk_score: 73.2,
                risk_level: Some(RiskLevel::Medium)
            },
            SubmitOutcome::from_response(true, json!({"risk_score": 73.2, "risk_level": "medium"}))
        );
        assert_eq!(
            SubmitOutcome::Rejected {
                error: "amount must be positive".to_string()
            },
            SubmitOutcome::from_response(true, json!({"error": "amount must be positive"}))
        );
        assert_eq!(
            SubmitOutcome::Rejected {
                error: "Unprocessable".to_string()
            },
            SubmitOutcome::from_response(false, json!({"detail": "Unprocessable"}))
        );
    }

    #[test]
    fn simulator_form_rejects_bad_amounts() {
        let form = SimulatorForm {
            amount: "twelve".to_string(),
            ..SimulatorForm::default()
        };

        assert_eq!(
            Err("twelve is not a valid amount".to_string()),
            NewTransaction::try_from(form)
        );

        let form = SimulatorForm {
            amount: " 99.5 ".to_string(),
            ..SimulatorForm::default()
        };
        assert_eq!(Ok(99.5), NewTransaction::try_from(form).map(|t| t.amount));
    }

    #[test]
    fn new_transaction_defaults_match_the_form() {
        let body = serde_json::to_value(NewTransaction::default()).expect("Error serializing");

        assert_eq!(json!("u-1001"), body["user_id"]);
        assert_eq!(json!(120.25), body["amount"]);
        assert_eq!(json!("10.0.0.1"), body["ip_address"]);
    }
}
