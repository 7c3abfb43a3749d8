use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// Phone attributes submitted for a prediction.
///
/// Every attribute is optional because each task consumes a different subset.
/// Attributes the gateway does not know about are kept in `extra` and passed
/// through to the upstream service untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<f64>,
    #[serde(alias = "screen", skip_serializing_if = "Option::is_none")]
    pub screen_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(alias = "company", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PredictionInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_ram(mut self, ram: f64) -> Self {
        self.ram = Some(ram);
        self
    }

    pub fn with_battery(mut self, battery: f64) -> Self {
        self.battery = Some(battery);
        self
    }

    pub fn with_storage(mut self, storage: f64) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_screen_size(mut self, screen_size: f64) -> Self {
        self.screen_size = Some(screen_size);
        self
    }

    pub fn with_camera(mut self, camera: f64) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Numeric attributes keyed by their camelCase field name.
    pub fn numeric_fields(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("price", self.price),
            ("ram", self.ram),
            ("battery", self.battery),
            ("storage", self.storage),
            ("screenSize", self.screen_size),
            ("camera", self.camera),
            ("weight", self.weight),
            ("year", self.year.map(f64::from)),
        ]
    }

    /// Whether the named attribute carries a usable value.
    pub fn is_provided(&self, field: &str) -> bool {
        if field == "brand" {
            return self
                .brand
                .as_deref()
                .map(|b| !b.trim().is_empty())
                .unwrap_or(false);
        }
        self.numeric_fields()
            .iter()
            .any(|(name, value)| *name == field && value.is_some())
    }

    /// Checks that every numeric attribute present is a positive finite number
    /// and that a present brand is not blank.
    pub fn validate(&self) -> Result<()> {
        let invalid: Vec<&str> = self
            .numeric_fields()
            .iter()
            .filter_map(|(name, value)| match value {
                Some(v) if !v.is_finite() || *v <= 0.0 => Some(*name),
                _ => None,
            })
            .collect();

        if !invalid.is_empty() {
            return Err(CoreError::Validation(format!(
                "fields must be positive numbers: {}",
                invalid.join(", ")
            )));
        }

        if let Some(brand) = &self.brand {
            if brand.trim().is_empty() {
                return Err(CoreError::Validation("brand must not be empty".to_string()));
            }
        }

        Ok(())
    }

    /// Body sent to the upstream prediction service.
    ///
    /// The upstream uses the dataset's column names (`screen`, `company`).
    pub fn to_upstream_payload(&self) -> Value {
        let mut body = Map::new();
        let named = [
            ("price", self.price.map(Value::from)),
            ("ram", self.ram.map(Value::from)),
            ("battery", self.battery.map(Value::from)),
            ("storage", self.storage.map(Value::from)),
            ("screen", self.screen_size.map(Value::from)),
            ("camera", self.camera.map(Value::from)),
            ("weight", self.weight.map(Value::from)),
            ("year", self.year.map(Value::from)),
            ("company", self.brand.clone().map(Value::from)),
        ];

        for (key, value) in named {
            if let Some(value) = value {
                body.insert(key.to_string(), value);
            }
        }

        for (key, value) in &self.extra {
            body.entry(key.clone()).or_insert_with(|| value.clone());
        }

        Value::Object(body)
    }

    /// Canonical form used to decide whether two inputs are the same request.
    ///
    /// Keys are ordered and the brand is trimmed and lowercased, so
    /// `{"company": " Apple"}` and `{"company": "apple"}` normalise identically.
    pub fn normalized(&self) -> BTreeMap<String, Value> {
        let mut normalized = BTreeMap::new();
        if let Value::Object(body) = self.to_upstream_payload() {
            for (key, value) in body {
                let value = match (key.as_str(), value) {
                    ("company", Value::String(s)) => Value::String(s.trim().to_lowercase()),
                    (_, other) => other,
                };
                normalized.insert(key, value);
            }
        }
        normalized
    }

    /// Hex-encoded SHA-256 of the normalised input.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(&self.normalized()).unwrap_or_default();
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn iphone() -> PredictionInput {
        PredictionInput::new()
            .with_ram(8.0)
            .with_battery(4000.0)
            .with_screen_size(6.1)
            .with_weight(174.0)
            .with_year(2024)
            .with_brand("Apple")
    }

    #[test]
    fn test_deserialize_accepts_dataset_aliases() {
        let input: PredictionInput = serde_json::from_value(json!({
            "ram": 8,
            "screen": 6.1,
            "company": "Apple",
            "colour": "black"
        }))
        .unwrap();

        assert_eq!(input.ram, Some(8.0));
        assert_eq!(input.screen_size, Some(6.1));
        assert_eq!(input.brand.as_deref(), Some("Apple"));
        assert_eq!(input.extra.get("colour"), Some(&json!("black")));
    }

    #[test]
    fn test_validate_rejects_non_positive_numbers() {
        let input = iphone().with_battery(0.0).with_weight(-3.0);
        let err = input.validate().unwrap_err();

        match err {
            CoreError::Validation(msg) => {
                assert!(msg.contains("battery"));
                assert!(msg.contains("weight"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_blank_brand() {
        assert!(iphone().with_brand("  ").validate().is_err());
        assert!(iphone().validate().is_ok());
    }

    #[test]
    fn test_upstream_payload_uses_dataset_names() {
        let payload = iphone().to_upstream_payload();
        assert_eq!(payload["screen"], json!(6.1));
        assert_eq!(payload["company"], json!("Apple"));
        assert!(payload.get("screenSize").is_none());
    }

    #[test]
    fn test_extra_fields_do_not_override_known_fields() {
        let mut input = iphone();
        input.extra.insert("ram".to_string(), json!(64));
        input.extra.insert("os".to_string(), json!("ios"));

        let payload = input.to_upstream_payload();
        assert_eq!(payload["ram"], json!(8.0));
        assert_eq!(payload["os"], json!("ios"));
    }

    #[test]
    fn test_fingerprint_ignores_brand_case_and_whitespace() {
        let a = iphone();
        let b = iphone().with_brand(" apple ");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), iphone().with_ram(12.0).fingerprint());
    }

    #[test]
    fn test_is_provided() {
        let input = iphone();
        assert!(input.is_provided("screenSize"));
        assert!(input.is_provided("brand"));
        assert!(!input.is_provided("price"));
    }
}
