use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use super::task::TaskType;
use crate::error::{CoreError, Result};

/// A predicted value: a number for price/RAM/battery, a label for brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionValue {
    Number(f64),
    Label(String),
}

impl PredictionValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PredictionValue::Number(n) => Some(*n),
            PredictionValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            PredictionValue::Label(s) => Some(s),
            PredictionValue::Number(_) => None,
        }
    }
}

impl fmt::Display for PredictionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionValue::Number(n) => write!(f, "{}", n),
            PredictionValue::Label(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMetadata {
    #[serde(default, alias = "processing_time_ms", alias = "processingTime")]
    pub processing_time_ms: Option<f64>,
    #[serde(default, alias = "model_version")]
    pub model_version: Option<String>,
    /// Offset-less timestamps are read as UTC; anything unparseable is dropped.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// What the upstream service returned for a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOutput {
    pub value: PredictionValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<OutputMetadata>,
}

impl PredictionOutput {
    pub fn new(value: PredictionValue) -> Self {
        Self {
            value,
            confidence: None,
            model: None,
            metadata: None,
        }
    }

    /// Interprets an upstream response body.
    ///
    /// The value is read from `prediction` if present, otherwise from the
    /// task's own field (e.g. `price`). Numeric tasks accept numeric strings.
    pub fn from_upstream(task: TaskType, body: &Value) -> Result<Self> {
        let object = body.as_object().ok_or_else(|| {
            CoreError::InvalidResponse("upstream response is not a JSON object".to_string())
        })?;

        let raw = object
            .get("prediction")
            .or_else(|| object.get(task.response_field()))
            .ok_or_else(|| {
                CoreError::InvalidResponse(format!(
                    "upstream response has neither 'prediction' nor '{}'",
                    task.response_field()
                ))
            })?;

        let value = match raw {
            Value::Number(n) => n
                .as_f64()
                .map(PredictionValue::Number)
                .ok_or_else(|| CoreError::InvalidResponse(format!("unrepresentable number {}", n)))?,
            Value::String(s) if task.is_numeric() => s
                .trim()
                .parse::<f64>()
                .map(PredictionValue::Number)
                .map_err(|_| {
                    CoreError::InvalidResponse(format!("expected a number for {}, got '{}'", task, s))
                })?,
            Value::String(s) => PredictionValue::Label(s.clone()),
            other => {
                return Err(CoreError::InvalidResponse(format!(
                    "unsupported prediction value {}",
                    other
                )))
            }
        };

        let confidence = match object.get("confidence") {
            None | Some(Value::Null) => None,
            Some(v) => {
                let c = v.as_f64().ok_or_else(|| {
                    CoreError::InvalidResponse("confidence is not a number".to_string())
                })?;
                if !(0.0..=1.0).contains(&c) {
                    return Err(CoreError::InvalidResponse(format!(
                        "confidence {} outside [0, 1]",
                        c
                    )));
                }
                Some(c)
            }
        };

        let model = object
            .get("model")
            .or_else(|| object.get("model_used"))
            .and_then(Value::as_str)
            .map(str::to_string);

        // Malformed metadata degrades to None
        let metadata = match object.get("metadata") {
            Some(m @ Value::Object(_)) => serde_json::from_value(m.clone()).ok(),
            _ => None,
        };

        Ok(Self {
            value,
            confidence,
            model,
            metadata,
        })
    }

    pub fn numeric_value(&self) -> Result<f64> {
        self.value.as_f64().ok_or_else(|| {
            CoreError::InvalidResponse(format!("expected a numeric prediction, got '{}'", self.value))
        })
    }

    pub fn label_value(&self) -> Result<&str> {
        self.value.as_label().ok_or_else(|| {
            CoreError::InvalidResponse(format!("expected a label prediction, got {}", self.value))
        })
    }
}
