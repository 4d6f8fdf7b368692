//! Product catalog model as served by the remote data store.
//!
//! The store is schemaless, so products are coerced from raw JSON at the
//! boundary: missing or mistyped fields fall back to safe defaults instead of
//! failing the whole payload.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Opaque identifier used by the store for products, stock entries and
/// warehousemen. The store hands out both numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    /// Parse an id received as text (path segment, query value).
    /// Canonical integers become `Number` so they serialize back the way the
    /// store wrote them. Text such as `007` or `+7` stays `Text`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// True for the empty id given to records the store sent without one.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Number(i),
                None => Self::Text(n.to_string()),
            },
            Value::String(s) => Self::Text(s.clone()),
            _ => Self::default(),
        }
    }
}

/// `deserialize_with` helper for ids that arrive as strings (query values).
pub fn entity_id_from_text<'de, D>(deserializer: D) -> Result<EntityId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(EntityId::parse(&raw))
}

impl Default for EntityId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Geographic location of a stock entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Localisation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Quantity of a product held at one warehouse location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localisation: Option<Localisation>,
}

impl StockEntry {
    /// City of this entry, if present and non-empty.
    pub fn city(&self) -> Option<&str> {
        self.localisation
            .as_ref()
            .and_then(|l| l.city.as_deref())
            .filter(|c| !c.is_empty())
    }

    fn from_value(value: &Value) -> Self {
        let localisation = value.get("localisation").filter(|l| l.is_object()).map(|l| {
            Localisation {
                city: l.get("city").and_then(lenient_string),
                latitude: l.get("latitude").and_then(lenient_f64),
                longitude: l.get("longitude").and_then(lenient_f64),
            }
        });

        Self {
            id: value.get("id").map(EntityId::from_value).unwrap_or_default(),
            name: value.get("name").and_then(lenient_string),
            quantity: value.get("quantity").and_then(lenient_i64).unwrap_or(0),
            localisation,
        }
    }
}

/// One entry of a product's edit history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    pub warehouseman_id: EntityId,
    pub at: String,
    /// Product stock total right after the edit. Older records lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_stock: Option<i64>,
}

impl EditRecord {
    /// Parse `at` into an instant. Returns `None` for unparseable values.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.at)
    }

    fn from_value(value: &Value) -> Self {
        Self {
            warehouseman_id: value
                .get("warehousemanId")
                .map(EntityId::from_value)
                .unwrap_or_default(),
            at: value.get("at").and_then(lenient_string).unwrap_or_default(),
            total_stock: value.get("totalStock").and_then(lenient_i64),
        }
    }
}

/// A catalog product with its stock locations and edit history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solde: Option<f64>,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub stocks: Vec<StockEntry>,
    #[serde(default)]
    pub edited_by: Vec<EditRecord>,
}

impl Product {
    /// Sum of quantities across all stock entries.
    pub fn total_quantity(&self) -> i64 {
        self.stocks
            .iter()
            .fold(0i64, |sum, s| sum.saturating_add(s.quantity))
    }

    /// Coerce a single raw store record. Never fails: anything that is not
    /// an object yields an empty product.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            tracing::debug!(kind = json_kind(value), "Product record is not an object, using defaults");
            return Self::default();
        }

        let list = |key: &str| value.get(key).and_then(Value::as_array);

        Self {
            id: value.get("id").map(EntityId::from_value).unwrap_or_default(),
            name: value.get("name").and_then(lenient_string).unwrap_or_default(),
            product_type: value.get("type").and_then(lenient_string).unwrap_or_default(),
            barcode: value.get("barcode").and_then(lenient_string).unwrap_or_default(),
            price: value.get("price").and_then(lenient_f64).unwrap_or(0.0),
            solde: value.get("solde").and_then(lenient_f64),
            supplier: value.get("supplier").and_then(lenient_string).unwrap_or_default(),
            image: value.get("image").and_then(lenient_string).unwrap_or_default(),
            stocks: list("stocks")
                .map(|s| s.iter().map(StockEntry::from_value).collect())
                .unwrap_or_default(),
            edited_by: list("editedBy")
                .map(|e| e.iter().map(EditRecord::from_value).collect())
                .unwrap_or_default(),
        }
    }

    /// Coerce a raw product listing. The payload itself must be an array.
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>, AppError> {
        let items = value.as_array().ok_or_else(|| {
            AppError::Validation(format!(
                "product listing must be an array, got {}",
                json_kind(value)
            ))
        })?;
        Ok(items.iter().map(Self::from_value).collect())
    }
}

/// Body for setting the quantity held at one stock location.
#[derive(Debug, Clone, Deserialize)]
pub struct SetQuantity {
    pub warehouseman_id: EntityId,
    pub quantity: i64,
}

/// Body for adding a new stock location to a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStockLocation {
    pub warehouseman_id: EntityId,
    pub name: String,
    pub city: String,
    pub quantity: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Partial update of an existing stock location.
#[derive(Debug, Clone, Deserialize)]
pub struct StockLocationPatch {
    pub warehouseman_id: EntityId,
    pub name: Option<String>,
    pub city: Option<String>,
    pub quantity: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Body for registering a new product in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub warehouseman_id: EntityId,
    pub name: String,
    #[serde(default, rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub barcode: String,
    pub price: f64,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub image: String,
}

/// Parse a store timestamp. Accepts RFC 3339, naive date-times (read as UTC)
/// and plain dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|f| f.is_finite())
}

fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
