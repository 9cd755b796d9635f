//! Tagged cell values.
//!
//! Row values cross the wire as untyped JSON. The column's declared
//! [`FieldType`] drives the interpretation exactly once, here, instead of
//! ad-hoc type sniffing at every use site.

use crate::column::FieldType;
use crate::dates;
use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;

/// A single cell, interpreted through its column's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Numeric(f64),
    Date(NaiveDate),
    Null,
}

impl CellValue {
    /// Interpret a raw JSON value under the given declared type.
    ///
    /// Empty strings and the literal `"nan"` count as null (the upload
    /// pipeline emits both for missing cells). A value that does not parse
    /// under its declared type also becomes null rather than an error:
    /// rows are display data, not input to validate.
    pub fn from_raw(raw: &Value, field_type: FieldType) -> Self {
        match raw {
            Value::Null => CellValue::Null,
            Value::String(s) if s.is_empty() || s == "nan" => CellValue::Null,
            _ => match field_type {
                FieldType::Text => match raw {
                    Value::String(s) => CellValue::Text(s.clone()),
                    other => CellValue::Text(other.to_string()),
                },
                FieldType::Numeric => match raw {
                    Value::Number(n) => n.as_f64().map(CellValue::Numeric).unwrap_or(CellValue::Null),
                    Value::String(s) => s
                        .trim()
                        .parse::<f64>()
                        .map(CellValue::Numeric)
                        .unwrap_or(CellValue::Null),
                    _ => CellValue::Null,
                },
                FieldType::Date => match raw {
                    Value::String(s) => dates::parse_wire(s).map(CellValue::Date).unwrap_or(CellValue::Null),
                    _ => CellValue::Null,
                },
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Compare two cells of the same column for ascending order.
    ///
    /// Null sorts after everything; callers flipping to descending order
    /// must keep nulls last (see the view-model's comparator). Mixed
    /// variants (possible when a column was retyped mid-page) fall back to
    /// equal, leaving the incoming order untouched.
    pub fn cmp_ascending(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => Ordering::Equal,
            (CellValue::Null, _) => Ordering::Greater,
            (_, CellValue::Null) => Ordering::Less,
            (CellValue::Numeric(a), CellValue::Numeric(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }

    /// Display form: dates render dd-mm-yyyy, nulls render as "-".
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Numeric(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Date(d) => dates::format_ui(*d),
            CellValue::Null => "-".to_string(),
        }
    }
}
