//! Schema snapshots and the editable working copy.
//!
//! Two snapshots of the ordered column sequence exist at any time: the
//! last-fetched authoritative state (a plain [`SchemaSnapshot`]) and the
//! in-progress edited state ([`WorkingSchema`]). Every edit validates
//! locally before mutating the working copy; nothing here touches the
//! network.

use crate::column::{ColumnId, ColumnSchema, FieldType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local, pre-network validation failures. Surfaced immediately to the
/// caller; never sent to the remote store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Column name cannot be empty")]
    EmptyName,

    #[error("A column named '{0}' already exists")]
    DuplicateName(String),

    #[error("The serial column '{0}' cannot be modified")]
    SystemColumn(String),

    #[error("No column named '{0}'")]
    UnknownColumn(String),

    #[error("Column position {0} is out of range")]
    PositionOutOfRange(usize),

    #[error("'{0}' is not a valid number")]
    BadNumber(String),

    #[error("Filter input does not match the declared type of '{0}'")]
    FilterMismatch(String),

    #[error("'{0}' is not a valid date (expected dd-mm-yyyy)")]
    BadDate(String),
}

/// An ordered, immutable view of the column sequence.
///
/// Order is display order. Produced from the remote store's `GET /schema`
/// response or from simulating a plan (tests).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    columns: Vec<ColumnSchema>,
}

impl SchemaSnapshot {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Look a column up by (exact) name.
    pub fn by_name(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn by_id(&self, id: &ColumnId) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| &c.id == id)
    }

    /// Declared type of a column, if it exists.
    pub fn field_type_of(&self, name: &str) -> Option<FieldType> {
        self.by_name(name).map(|c| c.field_type)
    }

    /// Column names in display order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column ids in display order.
    pub fn id_order(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|c| c.id.clone()).collect()
    }
}

/// The in-progress edited state of the column sequence.
///
/// Holds the remote snapshot it was forked from plus the edited sequence.
/// All pending changes are committed or discarded atomically at save time
/// by the reconciler; this type only guarantees that the working copy is
/// locally valid at every step.
#[derive(Debug, Clone)]
pub struct WorkingSchema {
    remote: SchemaSnapshot,
    columns: Vec<ColumnSchema>,
}

impl WorkingSchema {
    /// Fork a working copy from the last-fetched remote snapshot.
    pub fn from_remote(remote: SchemaSnapshot) -> Self {
        let columns = remote.columns().to_vec();
        Self { remote, columns }
    }

    /// The snapshot this working copy was forked from.
    pub fn remote(&self) -> &SchemaSnapshot {
        &self.remote
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Current working state as a snapshot.
    pub fn snapshot(&self) -> SchemaSnapshot {
        SchemaSnapshot::new(self.columns.clone())
    }

    /// Whether any pending edit exists.
    pub fn is_dirty(&self) -> bool {
        self.columns != self.remote.columns()
    }

    /// Discard all pending edits, optionally resynchronising to a freshly
    /// fetched snapshot.
    pub fn reset_to(&mut self, remote: SchemaSnapshot) {
        self.columns = remote.columns().to_vec();
        self.remote = remote;
    }

    fn index_of(&self, name: &str) -> Result<usize, ValidationError> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| ValidationError::UnknownColumn(name.to_string()))
    }

    fn check_name_free(&self, name: &str, ignoring: Option<usize>) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let clash = self.columns.iter().enumerate().any(|(i, c)| {
            Some(i) != ignoring && c.name.eq_ignore_ascii_case(name)
        });
        if clash {
            return Err(ValidationError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Rename a column. The serial column is immutable; the new name must be
    /// non-empty and case-insensitively unique.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), ValidationError> {
        let idx = self.index_of(old_name)?;
        if self.columns[idx].system {
            return Err(ValidationError::SystemColumn(old_name.to_string()));
        }
        if self.columns[idx].name == new_name {
            return Ok(());
        }
        self.check_name_free(new_name, Some(idx))?;
        self.columns[idx].name = new_name.to_string();
        Ok(())
    }

    /// Change a column's declared type.
    pub fn retype(&mut self, name: &str, field_type: FieldType) -> Result<(), ValidationError> {
        let idx = self.index_of(name)?;
        if self.columns[idx].system {
            return Err(ValidationError::SystemColumn(name.to_string()));
        }
        self.columns[idx].field_type = field_type;
        Ok(())
    }

    /// Append a locally-new column with a pending placeholder id.
    pub fn add_column(&mut self, name: &str, field_type: FieldType) -> Result<(), ValidationError> {
        self.check_name_free(name, None)?;
        self.columns.push(ColumnSchema::pending(name, field_type));
        Ok(())
    }

    /// Remove a column from the working copy. Deleting the serial column is
    /// rejected here, before any plan is built.
    pub fn delete_column(&mut self, name: &str) -> Result<(), ValidationError> {
        let idx = self.index_of(name)?;
        if self.columns[idx].system {
            return Err(ValidationError::SystemColumn(name.to_string()));
        }
        self.columns.remove(idx);
        Ok(())
    }

    /// Drag-reorder: move the column at `from` to position `to`.
    ///
    /// The identity move is a no-op (idempotent under repeated application).
    /// The serial column cannot move, and nothing can be dropped onto its
    /// position; the UI already excludes those drags, this defends the
    /// invariant anyway.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        if from >= self.columns.len() {
            return Err(ValidationError::PositionOutOfRange(from));
        }
        if to >= self.columns.len() {
            return Err(ValidationError::PositionOutOfRange(to));
        }
        if from == to {
            return Ok(());
        }
        if self.columns[from].system {
            return Err(ValidationError::SystemColumn(self.columns[from].name.clone()));
        }
        if self.columns[to].system {
            return Err(ValidationError::SystemColumn(self.columns[to].name.clone()));
        }
        let col = self.columns.remove(from);
        self.columns.insert(to, col);
        Ok(())
    }

    /// Replace a pending placeholder id with the store-assigned one.
    /// Called by the reconciler after each create round-trip.
    pub fn assign_remote_id(&mut self, placeholder: &ColumnId, assigned: impl Into<String>) {
        if let Some(col) = self.columns.iter_mut().find(|c| &c.id == placeholder) {
            col.id = ColumnId::Remote(assigned.into());
        }
    }
}
