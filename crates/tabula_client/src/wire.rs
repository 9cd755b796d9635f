//! Request/response DTOs for the REST surface.
//!
//! Field names follow the backend's camelCase JSON exactly; everything else
//! in the workspace uses the model types from `tabula_schema`. Dates cross
//! this boundary in wire form (`yyyy-mm-dd`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tabula_schema::{dates, ColumnSchema, FieldType, SchemaSnapshot};

/// One column as `GET /schema` returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub id: String,
}

impl WireColumn {
    pub fn into_column(self) -> ColumnSchema {
        ColumnSchema::remote(self.id, self.name, self.field_type)
    }
}

/// Assemble the authoritative snapshot from the wire column list.
pub fn snapshot_from_wire(columns: Vec<WireColumn>) -> SchemaSnapshot {
    SchemaSnapshot::new(columns.into_iter().map(WireColumn::into_column).collect())
}

/// Body for `POST /schema/columns` and `PUT /schema/columns/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnBody {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Response of `POST /schema/columns`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewColumnResponse {
    pub new_id: String,
}

/// One row: an opaque id plus a flat name-to-value map.
///
/// The display serial number is never stored here; it is computed from the
/// page position. Mutations address rows by `id` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Absent only on a locally-created row the store has not seen yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub values: serde_json::Map<String, Value>,
}

impl Row {
    /// Blank row over the given headers, for the Adding session.
    pub fn blank(headers: &[String]) -> Self {
        let mut values = serde_json::Map::new();
        for header in headers {
            values.insert(header.clone(), Value::String(String::new()));
        }
        Self { id: None, values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }
}

/// Column names grouped by declared type, as the row endpoint reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeIndex {
    #[serde(default)]
    pub numeric: Vec<String>,
    #[serde(default)]
    pub date: Vec<String>,
    #[serde(default)]
    pub text: Vec<String>,
}

impl FieldTypeIndex {
    pub fn classify(&self, field: &str) -> FieldType {
        if self.numeric.iter().any(|f| f == field) {
            FieldType::Numeric
        } else if self.date.iter().any(|f| f == field) {
            FieldType::Date
        } else {
            FieldType::Text
        }
    }
}

/// Response of `GET /contracts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowPage {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default, rename = "totalPages")]
    pub total_pages: u32,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default, rename = "fieldTypes")]
    pub field_types: FieldTypeIndex,
}

impl RowPage {
    /// Whether the backend supplied the metadata the table depends on.
    pub fn has_metadata(&self) -> bool {
        !self.headers.is_empty()
    }
}

/// Sort direction, `asc`/`desc` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized filter in wire terms. Exactly one shape applies, selected by
/// the filtered field's declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireFilter {
    /// Substring match on a text field
    Value { field: String, value: String },

    /// Inclusive numeric range; open ends omitted. An inverted range is
    /// forwarded as-is and simply matches nothing.
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },

    /// Inclusive date range, wire format on the query string
    Dates {
        field: String,
        from: NaiveDate,
        to: NaiveDate,
    },
}

impl WireFilter {
    /// Query-string pairs for `GET /contracts` and `GET /export`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        match self {
            WireFilter::Value { field, value } => {
                pairs.push(("filterField".into(), field.clone()));
                pairs.push(("filterValue".into(), value.clone()));
            }
            WireFilter::Range { field, min, max } => {
                pairs.push(("filterField".into(), field.clone()));
                if let Some(min) = min {
                    pairs.push(("minRange".into(), min.to_string()));
                }
                if let Some(max) = max {
                    pairs.push(("maxRange".into(), max.to_string()));
                }
            }
            WireFilter::Dates { field, from, to } => {
                pairs.push(("filterField".into(), field.clone()));
                pairs.push(("fromDate".into(), dates::format_wire(*from)));
                pairs.push(("toDate".into(), dates::format_wire(*to)));
            }
        }
        pairs
    }
}

/// Query for one page of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub filter: Option<WireFilter>,
}

impl RowQuery {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("sortField".to_string(), self.sort_field.clone()),
            ("sortDirection".to_string(), self.sort_direction.to_string()),
        ];
        if let Some(filter) = &self.filter {
            pairs.extend(filter.query_pairs());
        }
        pairs
    }
}

/// Export target format. The binary encoding is the backend's job; the
/// client only names the format and ships the blob back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            _ => Err(format!("Invalid export format: '{}'", s)),
        }
    }
}

/// Query for `GET /export`: the active view state plus format and the
/// selected column subset.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub selected_fields: Vec<String>,
    pub filter: Option<WireFilter>,
}

impl ExportRequest {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("format".to_string(), self.format.to_string()),
            ("sortField".to_string(), self.sort_field.clone()),
            ("sortDirection".to_string(), self.sort_direction.to_string()),
            ("selectedFields".to_string(), self.selected_fields.join(",")),
        ];
        if let Some(filter) = &self.filter {
            pairs.extend(filter.query_pairs());
        }
        pairs
    }
}
