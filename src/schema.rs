use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEALER_NAME: &str = "dealer_name";
pub const NOMENCLATURE: &str = "nomenclature";
pub const BRAND: &str = "brand";
pub const TOTAL_POWER_MW: &str = "total_power_mw";
pub const PCS_CONTAINER: &str = "pcs_container";
pub const NOMEN_GROUP_PARENT: &str = "nomen_group_parent";
pub const QUANTITY_REGISTER_UOM: &str = "quantity_register_uom";
pub const REGISTER_UOM: &str = "register_uom";
pub const TOTAL_FINAL_PRICE_CZK: &str = "total_final_price_czk";
pub const GROSS_MARGIN_CZK: &str = "gross_margin_czk";
pub const DELIVERY_DATE: &str = "delivery_date";

/// The fixed column set kept from the fetched rows, in report order.
pub const SALES_COLUMNS: [&str; 11] = [
    DEALER_NAME,
    NOMENCLATURE,
    BRAND,
    TOTAL_POWER_MW,
    PCS_CONTAINER,
    NOMEN_GROUP_PARENT,
    QUANTITY_REGISTER_UOM,
    REGISTER_UOM,
    TOTAL_FINAL_PRICE_CZK,
    GROSS_MARGIN_CZK,
    DELIVERY_DATE,
];

/// A field value as delivered by a row source, before any typing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Last-resort string form used when a column resolves to text.
    pub fn to_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::Integer(i) => Some(i.to_string()),
            RawValue::Float(f) => Some(f.to_string()),
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            RawValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Integer(i),
                None => n.as_f64().map(RawValue::Float).unwrap_or(RawValue::Null),
            },
            serde_json::Value::String(s) => RawValue::Text(s),
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

/// One fetched row: column name to raw value.
pub type RawRow = BTreeMap<String, RawValue>;

/// The single type a column resolves to after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Date,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// A typed cell. Every non-null value of a column matches the column's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnKind::Integer),
            Value::Float(_) => Some(ColumnKind::Float),
            Value::Text(_) => Some(ColumnKind::Text),
            Value::Date(_) => Some(ColumnKind::Date),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view; text, dates and nulls have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Date(d) => Some(d.format("%d/%m/%Y").to_string()),
        }
    }
}

/// The transaction date after coercion: parsed, kept verbatim, or absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryDate {
    Parsed(NaiveDate),
    Unparsed(String),
    Missing,
}

impl DeliveryDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DeliveryDate::Parsed(d) => Some(*d),
            _ => None,
        }
    }
}

/// One transaction line with the delivery date already split off.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub dealer_name: Value,
    pub nomenclature: Value,
    pub brand: Value,
    pub total_power_mw: Value,
    /// Units per container
    pub pcs_container: Value,
    /// Product group
    pub nomen_group_parent: Value,
    pub quantity_register_uom: Value,
    pub register_uom: Value,
    /// Turnover
    pub total_final_price_czk: Value,
    pub gross_margin_czk: Value,
}

impl Default for SalesRecord {
    fn default() -> Self {
        Self {
            dealer_name: Value::Null,
            nomenclature: Value::Null,
            brand: Value::Null,
            total_power_mw: Value::Null,
            pcs_container: Value::Null,
            nomen_group_parent: Value::Null,
            quantity_register_uom: Value::Null,
            register_uom: Value::Null,
            total_final_price_czk: Value::Null,
            gross_margin_czk: Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatedRecord {
    pub record: SalesRecord,
    pub delivery_date: DeliveryDate,
}

/// Grouping key for aggregate rows. Missing keys form their own bucket and sort last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GroupKey {
    Named(String),
    Missing,
}

impl GroupKey {
    pub fn from_value(value: &Value) -> Self {
        match value.as_text() {
            Some(name) => GroupKey::Named(name),
            None => GroupKey::Missing,
        }
    }
}

/// Heading shown for the bucket of rows without a key.
pub const MISSING_KEY_LABEL: &str = "(missing)";

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // A real name spelled like the label is quoted so the two never read the same.
            GroupKey::Named(name) if name == MISSING_KEY_LABEL => write!(f, "\"{}\"", name),
            GroupKey::Named(name) => f.write_str(name),
            GroupKey::Missing => f.write_str(MISSING_KEY_LABEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_from_json() {
        assert_eq!(RawValue::from(serde_json::json!(null)), RawValue::Null);
        assert_eq!(RawValue::from(serde_json::json!(12)), RawValue::Integer(12));
        assert_eq!(RawValue::from(serde_json::json!(1.5)), RawValue::Float(1.5));
        assert_eq!(
            RawValue::from(serde_json::json!("Acme")),
            RawValue::Text("Acme".to_string())
        );
        assert_eq!(
            RawValue::from(serde_json::json!([1, 2])),
            RawValue::Text("[1,2]".to_string())
        );
    }

    #[test]
    fn test_group_key_ordering_puts_missing_last() {
        let mut keys = vec![
            GroupKey::Missing,
            GroupKey::Named("Zeta".to_string()),
            GroupKey::Named("Acme".to_string()),
        ];
        keys.sort();
        assert_eq!(keys[0], GroupKey::Named("Acme".to_string()));
        assert_eq!(keys[2], GroupKey::Missing);
        assert_eq!(GroupKey::Missing.to_string(), "(missing)");
    }

    #[test]
    fn test_dealer_named_like_missing_label_stays_distinct() {
        let named = GroupKey::from_value(&Value::Text("(missing)".to_string()));
        let missing = GroupKey::from_value(&Value::Null);

        assert_ne!(named, missing);
        assert_ne!(named.to_string(), missing.to_string());
        assert_eq!(named.to_string(), "\"(missing)\"");
    }
}
