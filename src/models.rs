// src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder shown wherever a value could not be resolved.
pub const PLACEHOLDER: &str = "--";

/// Wire-ready representation of one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum EncodedPayload {
    /// One numeric vector per row, sent as `{"data": [[...]]}`.
    NumericMatrix(Vec<Vec<f64>>),
    /// Newline separated CSV rows, sent as the multipart field `data`.
    DelimitedText(String),
    /// Flat form fields, sent as a JSON object.
    FieldMap(BTreeMap<String, String>),
}

impl EncodedPayload {
    pub fn is_empty(&self) -> bool {
        match self {
            EncodedPayload::NumericMatrix(rows) => rows.is_empty(),
            EncodedPayload::DelimitedText(text) => text.trim().is_empty(),
            EncodedPayload::FieldMap(fields) => fields.is_empty(),
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            EncodedPayload::NumericMatrix(rows) => rows.len(),
            EncodedPayload::DelimitedText(text) => text.lines().count(),
            EncodedPayload::FieldMap(_) => 1,
        }
    }
}

/// A loosely typed JSON scalar as the backend sends it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Scalar {
    /// Strict scalar conversion: `null`, arrays and objects are absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Scalar::Number),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            _ => None,
        }
    }

    /// Conversion for list slots, which must keep their position.
    fn from_value_lossy(value: &Value) -> Self {
        Scalar::from_value(value).unwrap_or_else(|| match value {
            Value::Null => Scalar::Text(PLACEHOLDER.to_string()),
            other => Scalar::Text(other.to_string()),
        })
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Lenient integer reading, accepting numeric strings like `"3"`.
    pub fn as_count(&self) -> Option<usize> {
        let n = match self {
            Scalar::Number(n) => *n,
            Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
            Scalar::Bool(_) => return None,
        };
        (n.is_finite() && n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
    }

    /// The label text, or `None` when it is empty or only whitespace.
    pub fn non_blank_label(&self) -> Option<String> {
        Some(self.as_label()).filter(|l| !l.trim().is_empty())
    }

    /// Text used when the scalar is shown as a label.
    pub fn as_label(&self) -> String {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
            Scalar::Number(n) => format_score(*n),
            Scalar::Text(s) => s.clone(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", format_score(*n)),
            other => write!(f, "{}", other.as_label()),
        }
    }
}

/// Scores are always shown with three decimals.
pub fn format_score(value: f64) -> String {
    format!("{:.3}", value)
}

/// `predictions` is either one value or one value per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Predictions {
    Single(Scalar),
    PerRow(Vec<Scalar>),
}

impl Predictions {
    pub fn first(&self) -> Option<&Scalar> {
        match self {
            Predictions::Single(s) => Some(s),
            Predictions::PerRow(list) => list.first(),
        }
    }

    pub fn per_row(&self) -> Option<&[Scalar]> {
        match self {
            Predictions::PerRow(list) => Some(list),
            Predictions::Single(_) => None,
        }
    }
}

/// One fully resolved row from the `results` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultEntry {
    pub class: Option<Scalar>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub value: Option<f64>,
}

impl ResultEntry {
    fn from_value(value: &Value) -> Self {
        ResultEntry {
            class: value.get("class").and_then(Scalar::from_value),
            label: value
                .get("label")
                .and_then(Scalar::from_value)
                .map(|s| s.as_label())
                .filter(|l| !l.trim().is_empty()),
            color: value
                .get("color")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            value: value
                .get("value")
                .and_then(Scalar::from_value)
                .and_then(|s| s.as_f64()),
        }
    }
}

/// The backend's response. Every field is optional and parsing never fails,
/// whatever JSON arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawResult {
    pub predictions: Option<Predictions>,
    pub probabilities: Option<Vec<Scalar>>,
    pub labels: Option<Vec<Scalar>>,
    pub results: Option<Vec<ResultEntry>>,
    pub predicted_label: Option<Scalar>,
    pub label: Option<Scalar>,
    pub predicted: Option<Scalar>,
    pub n_rows: Option<Scalar>,
    pub score: Option<Scalar>,
    pub probability: Option<Scalar>,
    pub error: Option<String>,
    pub traceback: Option<String>,
}

fn scalar_list(value: Option<&Value>) -> Option<Vec<Scalar>> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(Scalar::from_value_lossy).collect())
}

impl From<Value> for RawResult {
    fn from(value: Value) -> Self {
        let field = |name: &str| value.get(name).filter(|v| !v.is_null());

        let predictions = field("predictions").and_then(|v| match v {
            Value::Array(items) => Some(Predictions::PerRow(
                items.iter().map(Scalar::from_value_lossy).collect(),
            )),
            other => Scalar::from_value(other).map(Predictions::Single),
        });

        let results = field("results")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(ResultEntry::from_value).collect());

        let error = field("error").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        RawResult {
            predictions,
            probabilities: scalar_list(field("probabilities")),
            labels: scalar_list(field("labels")),
            results,
            predicted_label: field("predicted_label").and_then(Scalar::from_value),
            label: field("label").and_then(Scalar::from_value),
            predicted: field("predicted").and_then(Scalar::from_value),
            n_rows: field("n_rows").and_then(Scalar::from_value),
            score: field("score").and_then(Scalar::from_value),
            probability: field("probability").and_then(Scalar::from_value),
            error,
            traceback: field("traceback").and_then(Value::as_str).map(str::to_string),
        }
    }
}

impl RawResult {
    pub fn first_result(&self) -> Option<&ResultEntry> {
        self.results.as_ref().and_then(|r| r.first())
    }
}

/// Coarse category driving badge styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeadlineClass {
    Positive,
    Negative,
    #[default]
    Unknown,
}

impl fmt::Display for HeadlineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadlineClass::Positive => write!(f, "positive"),
            HeadlineClass::Negative => write!(f, "negative"),
            HeadlineClass::Unknown => write!(f, "unknown"),
        }
    }
}

/// One per-row line of the result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub index: usize,
    pub value: String,
    pub label: String,
    pub color_hint: String,
}

/// Canonical, renderer-facing result. Every field always carries a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayModel {
    pub headline: String,
    pub headline_class: HeadlineClass,
    pub headline_color: String,
    pub subtitle: String,
    pub rows: Vec<DisplayRow>,
    pub hidden_rows: usize,
    pub row_count: Option<usize>,
    pub is_error: bool,
}
