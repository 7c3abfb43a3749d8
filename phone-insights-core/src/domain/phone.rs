use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// One row of the phone dataset as returned by the upstream search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRecord {
    #[serde(default, alias = "model", alias = "model_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "company", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
    #[serde(default, alias = "screen", skip_serializing_if = "Option::is_none")]
    pub screen_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Phone search parameters forwarded to the upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl SearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            limit: None,
            brand: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Cache identity of the query: trimmed, lowercased text plus filters.
    pub fn cache_identity(&self) -> String {
        format!(
            "{}|{}|{}",
            self.q.trim().to_lowercase(),
            self.limit.map(|l| l.to_string()).unwrap_or_default(),
            self.brand
                .as_deref()
                .map(|b| b.trim().to_lowercase())
                .unwrap_or_default()
        )
    }
}

/// Normalised search result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneSearchResults {
    pub results: Vec<PhoneRecord>,
    pub total: usize,
}

impl PhoneSearchResults {
    /// Accepts either a bare array or `{ "results": [...], "total": n }`.
    pub fn from_upstream(body: &Value) -> Result<Self> {
        let (rows, total) = match body {
            Value::Array(rows) => (rows.clone(), None),
            Value::Object(map) => {
                let rows = map
                    .get("results")
                    .or_else(|| map.get("hits"))
                    .and_then(Value::as_array)
                    .cloned()
                    .ok_or_else(|| {
                        CoreError::InvalidResponse(
                            "search response has no 'results' array".to_string(),
                        )
                    })?;
                let total = map.get("total").and_then(Value::as_u64).map(|t| t as usize);
                (rows, total)
            }
            _ => {
                return Err(CoreError::InvalidResponse(
                    "search response must be an array or object".to_string(),
                ))
            }
        };

        let results: Vec<PhoneRecord> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()?;
        let total = total.unwrap_or(results.len());

        Ok(Self { results, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_results_from_array() {
        let body = json!([{"model": "Pixel 8", "company": "Google", "price": 699}]);
        let parsed = PhoneSearchResults::from_upstream(&body).unwrap();

        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.results[0].name.as_deref(), Some("Pixel 8"));
        assert_eq!(parsed.results[0].brand.as_deref(), Some("Google"));
    }

    #[test]
    fn test_search_results_from_object_keeps_total() {
        let body = json!({"results": [{"name": "Galaxy S24"}], "total": 42});
        let parsed = PhoneSearchResults::from_upstream(&body).unwrap();
        assert_eq!(parsed.total, 42);
    }

    #[test]
    fn test_cache_identity_normalises_text() {
        let a = SearchQuery::new(" Pixel ").with_brand("Google");
        let b = SearchQuery::new("pixel").with_brand("google ");
        assert_eq!(a.cache_identity(), b.cache_identity());
    }
}
