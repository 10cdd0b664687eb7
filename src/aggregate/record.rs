//! Product record and its permissive JSON reader

use crate::state::CategoryPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for a missing name or code
pub const NOT_SPECIFIED: &str = "Not specified";

/// Placeholder for a missing description
pub const NO_DESCRIPTION: &str = "No description";

/// Placeholder for a product without images
pub const NO_IMAGES: &str = "No images";

/// One product extracted from a detail page
///
/// `url` is the identity key; every other field is best effort and carries a
/// placeholder instead of being absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub url: String,
    #[serde(rename = "categories")]
    pub category: CategoryPath,
    pub name: String,
    pub code: String,
    pub description: String,
    pub price: String,
    pub specs: Vec<String>,
    pub images: Vec<String>,
    pub timestamp: String,
}

impl ProductRecord {
    /// Creates a record for `url` with every other field set to its placeholder
    pub fn placeholder(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            category: CategoryPath::new(),
            name: NOT_SPECIFIED.to_string(),
            code: NOT_SPECIFIED.to_string(),
            description: NO_DESCRIPTION.to_string(),
            price: String::new(),
            specs: vec![NOT_SPECIFIED.to_string()],
            images: vec![NO_IMAGES.to_string()],
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Reads a product-like JSON object written by this tool or by older exports
    ///
    /// `categories` (or `category`) may be a list or a rendered string split on
    /// `category_delimiter`; `specs` and `images` may be a single value or a
    /// list. Numbers and booleans are kept as their text, anything else
    /// (null, nested objects) takes the field's placeholder. Returns `None`
    /// when the value is not an object or has no string URL.
    pub fn from_loose_json(value: serde_json::Value, category_delimiter: &str) -> Option<Self> {
        let raw: LooseRecord = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("Skipping unreadable record: {}", e);
                return None;
            }
        };

        let url = match raw.url {
            Some(Value::String(url)) if !url.trim().is_empty() => url.trim().to_string(),
            _ => return None,
        };
        let mut record = Self::placeholder(url);

        record.category = match raw.categories {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            Some(other) => scalar_text(&other)
                .map(|text| CategoryPath::parse(&text, category_delimiter))
                .unwrap_or_default(),
            None => CategoryPath::new(),
        };
        if let Some(name) = raw.name.as_ref().and_then(scalar_text) {
            record.name = name;
        }
        if let Some(code) = raw.code.as_ref().and_then(scalar_text) {
            record.code = code;
        }
        if let Some(description) = raw.description.as_ref().and_then(scalar_text) {
            record.description = description;
        }
        record.price = raw.price.as_ref().and_then(scalar_text).unwrap_or_default();
        if let Some(specs) = raw.specs.map(into_lines).filter(|s| !s.is_empty()) {
            record.specs = specs;
        }
        if let Some(images) = raw.images.map(into_lines).filter(|i| !i.is_empty()) {
            record.images = images;
        }
        if let Some(timestamp) = raw.timestamp.as_ref().and_then(scalar_text) {
            record.timestamp = timestamp;
        }

        Some(record)
    }
}

/// Field-by-field view of an exported object; field types are checked later
#[derive(Debug, Deserialize)]
struct LooseRecord {
    #[serde(default)]
    url: Option<Value>,
    #[serde(default, alias = "category")]
    categories: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    specs: Option<Value>,
    #[serde(default)]
    images: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Trimmed text of a string, number or boolean; `None` when empty or not a scalar
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    Some(text).filter(|t| !t.is_empty())
}

fn into_lines(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(&other).into_iter().collect(),
    }
}
