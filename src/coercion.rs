//! Column-wide type resolution for loosely typed rows.
//!
//! Every column is resolved to exactly one [`ColumnKind`]. Candidates are tried
//! in order and a single unconvertible value moves the whole column to the next
//! candidate, ending at text which always succeeds.

use crate::schema::{
    ColumnKind, DatedRecord, DeliveryDate, RawRow, RawValue, SalesRecord, Value, BRAND,
    DEALER_NAME, DELIVERY_DATE, GROSS_MARGIN_CZK, NOMENCLATURE, NOMEN_GROUP_PARENT,
    PCS_CONTAINER, QUANTITY_REGISTER_UOM, REGISTER_UOM, SALES_COLUMNS, TOTAL_FINAL_PRICE_CZK,
    TOTAL_POWER_MW,
};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct TypedColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

/// Outcome of resolving one column: the kind it landed on and the candidates it fell through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnResolution {
    pub column: String,
    pub kind: ColumnKind,
    pub rejected: Vec<ColumnKind>,
}

impl ColumnResolution {
    pub fn fell_back(&self) -> bool {
        !self.rejected.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    pub resolutions: Vec<ColumnResolution>,
}

impl CoercionReport {
    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.resolutions
            .iter()
            .find(|r| r.column == column)
            .map(|r| r.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedTable {
    columns: Vec<TypedColumn>,
    len: usize,
}

impl TypedTable {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(|c| c.kind)
    }

    fn cell(&self, name: &str, row: usize) -> Value {
        self.column(name)
            .and_then(|c| c.values.get(row))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Row view of the table, delivery date split from the rest of the record.
    pub fn records(&self) -> Vec<DatedRecord> {
        (0..self.len)
            .map(|row| {
                let record = SalesRecord {
                    dealer_name: self.cell(DEALER_NAME, row),
                    nomenclature: self.cell(NOMENCLATURE, row),
                    brand: self.cell(BRAND, row),
                    total_power_mw: self.cell(TOTAL_POWER_MW, row),
                    pcs_container: self.cell(PCS_CONTAINER, row),
                    nomen_group_parent: self.cell(NOMEN_GROUP_PARENT, row),
                    quantity_register_uom: self.cell(QUANTITY_REGISTER_UOM, row),
                    register_uom: self.cell(REGISTER_UOM, row),
                    total_final_price_czk: self.cell(TOTAL_FINAL_PRICE_CZK, row),
                    gross_margin_czk: self.cell(GROSS_MARGIN_CZK, row),
                };
                let delivery_date = match self.cell(DELIVERY_DATE, row) {
                    Value::Date(d) => DeliveryDate::Parsed(d),
                    Value::Null => DeliveryDate::Missing,
                    other => other
                        .as_text()
                        .map(DeliveryDate::Unparsed)
                        .unwrap_or(DeliveryDate::Missing),
                };
                DatedRecord {
                    record,
                    delivery_date,
                }
            })
            .collect()
    }
}

/// Projects every row onto the fixed sales column set. Absent columns become null.
pub fn select_columns(rows: &[RawRow]) -> Vec<RawRow> {
    rows.iter()
        .map(|row| {
            SALES_COLUMNS
                .iter()
                .map(|&name| {
                    let value = row.get(name).cloned().unwrap_or(RawValue::Null);
                    (name.to_string(), value)
                })
                .collect()
        })
        .collect()
}

pub struct TypeCoercer {
    date_column: String,
    date_format: String,
}

impl TypeCoercer {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_column: DELIVERY_DATE.to_string(),
            date_format: date_format.into(),
        }
    }

    /// Coerces the sales column set of `rows`.
    pub fn coerce(&self, rows: &[RawRow]) -> (TypedTable, CoercionReport) {
        self.coerce_columns(rows, &SALES_COLUMNS)
    }

    pub fn coerce_columns(&self, rows: &[RawRow], names: &[&str]) -> (TypedTable, CoercionReport) {
        let mut columns = Vec::with_capacity(names.len());
        let mut report = CoercionReport::default();

        for &name in names {
            let raw: Vec<RawValue> = rows
                .iter()
                .map(|row| row.get(name).cloned().unwrap_or(RawValue::Null))
                .collect();
            let (column, resolution) = self.coerce_column(name, &raw);
            columns.push(column);
            report.resolutions.push(resolution);
        }

        (
            TypedTable {
                columns,
                len: rows.len(),
            },
            report,
        )
    }

    pub fn coerce_column(&self, name: &str, raw: &[RawValue]) -> (TypedColumn, ColumnResolution) {
        let candidates: &[ColumnKind] = if name == self.date_column {
            &[ColumnKind::Date]
        } else {
            &[ColumnKind::Integer, ColumnKind::Float]
        };

        let mut rejected = Vec::new();
        for &kind in candidates {
            let converted = match kind {
                ColumnKind::Date => convert_all(raw, |v| to_date(v, &self.date_format)),
                ColumnKind::Integer => convert_all(raw, to_integer),
                ColumnKind::Float => convert_all(raw, to_float),
                ColumnKind::Text => None,
            };
            match converted {
                Some(values) => {
                    return (
                        TypedColumn {
                            name: name.to_string(),
                            kind,
                            values,
                        },
                        ColumnResolution {
                            column: name.to_string(),
                            kind,
                            rejected,
                        },
                    );
                }
                None => rejected.push(kind),
            }
        }

        let values = raw
            .iter()
            .map(|v| v.to_text().map(Value::Text).unwrap_or(Value::Null))
            .collect();
        (
            TypedColumn {
                name: name.to_string(),
                kind: ColumnKind::Text,
                values,
            },
            ColumnResolution {
                column: name.to_string(),
                kind: ColumnKind::Text,
                rejected,
            },
        )
    }
}

impl Default for TypeCoercer {
    fn default() -> Self {
        Self::new("%d/%m/%Y")
    }
}

/// Converts every value or none. Nulls pass through under any kind.
fn convert_all(raw: &[RawValue], convert: impl Fn(&RawValue) -> Option<Value>) -> Option<Vec<Value>> {
    raw.iter()
        .map(|v| if v.is_null() { Some(Value::Null) } else { convert(v) })
        .collect()
}

fn to_integer(value: &RawValue) -> Option<Value> {
    match value {
        RawValue::Integer(i) => Some(Value::Integer(*i)),
        RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            Some(Value::Integer(*f as i64))
        }
        RawValue::Text(s) => s.trim().parse::<i64>().ok().map(Value::Integer),
        _ => None,
    }
}

fn to_float(value: &RawValue) -> Option<Value> {
    match value {
        RawValue::Integer(i) => Some(Value::Float(*i as f64)),
        RawValue::Float(f) if f.is_finite() => Some(Value::Float(*f)),
        RawValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float),
        _ => None,
    }
}

fn to_date(value: &RawValue, format: &str) -> Option<Value> {
    match value {
        RawValue::Date(d) => Some(Value::Date(*d)),
        RawValue::DateTime(dt) => Some(Value::Date(dt.date())),
        RawValue::Text(s) => NaiveDate::parse_from_str(s.trim(), format)
            .ok()
            .map(Value::Date),
        _ => None,
    }
}
