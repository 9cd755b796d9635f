//! Column definition types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Name of the fixed serial column.
///
/// Exactly one column carries this role: it renders the computed row
/// sequence number and is exempt from every admin edit (rename, retype,
/// delete, reorder). The flag lives on [`ColumnSchema::system`]; this
/// constant exists only for the single place that sets it at ingest.
pub const SERIAL_COLUMN: &str = "SL No";

/// Declared type of a column - governs parsing, the sort comparator and
/// which filter input the presentation layer offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text (default/fallback)
    #[default]
    Text,

    /// Parsed as 64-bit float for comparison and range filters
    Numeric,

    /// Calendar date, yyyy-mm-dd on the wire
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Numeric => "numeric",
            FieldType::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "numeric" => Ok(FieldType::Numeric),
            "date" => Ok(FieldType::Date),
            _ => Err(format!("Invalid field type: '{}'", s)),
        }
    }
}

/// Stable column identifier.
///
/// The remote store assigns the real id. A column created locally carries a
/// placeholder until the create round-trip returns the assigned id, because
/// the final reorder call needs real ids for every column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnId {
    /// Assigned by the remote store; opaque, never interpreted
    Remote(String),

    /// Local placeholder awaiting store assignment
    Pending(Uuid),
}

impl ColumnId {
    /// Fresh placeholder for a locally-created column.
    pub fn pending() -> Self {
        ColumnId::Pending(Uuid::new_v4())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ColumnId::Pending(_))
    }

    /// The store-assigned id, if this column has one.
    pub fn remote(&self) -> Option<&str> {
        match self {
            ColumnId::Remote(id) => Some(id),
            ColumnId::Pending(_) => None,
        }
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnId::Remote(id) => write!(f, "{}", id),
            ColumnId::Pending(uuid) => write!(f, "pending:{}", uuid),
        }
    }
}

/// One column definition in the ordered schema sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Stable identifier (see [`ColumnId`])
    pub id: ColumnId,

    /// Display/key name, unique case-insensitively across the schema
    pub name: String,

    /// Declared type
    pub field_type: FieldType,

    /// Fixed serial column marker - set once at ingest, checked everywhere
    /// an edit could touch the column, never re-derived from the name
    pub system: bool,
}

impl ColumnSchema {
    /// Column as described by the remote store. The system flag is derived
    /// here, at the single ingest point.
    pub fn remote(id: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let system = name == SERIAL_COLUMN;
        Self {
            id: ColumnId::Remote(id.into()),
            name,
            field_type,
            system,
        }
    }

    /// Locally-created column with a pending placeholder id.
    pub fn pending(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: ColumnId::pending(),
            name: name.into(),
            field_type,
            system: false,
        }
    }
}
