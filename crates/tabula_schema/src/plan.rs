//! Schema diffing and the ordered operation plan.
//!
//! [`SchemaPlan::diff`] turns a (remote, working) snapshot pair into the
//! minimal ordered set of remote operations. Execution order is fixed:
//! deletes, then creates, then updates, then a single reorder. Deletes go
//! first so a newly-added column may reuse a just-deleted name; updates go
//! after creates so renames never collide with an about-to-be-deleted name;
//! the reorder goes last because it needs the final, store-assigned id of
//! every column.

use crate::column::{ColumnId, ColumnSchema, FieldType};
use crate::snapshot::{SchemaSnapshot, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Create operation: a locally-new column awaiting a store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCreate {
    /// Placeholder id in the working copy, substituted once the store
    /// returns the real id
    pub placeholder: ColumnId,
    pub name: String,
    pub field_type: FieldType,
}

/// Update operation, keyed by the original remote id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnUpdate {
    pub id: String,
    pub name: String,
    pub field_type: FieldType,
}

/// The ordered set of remote operations that transforms the remote schema
/// into the working copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaPlan {
    /// Remote ids to delete, issued first
    pub deletes: Vec<String>,

    /// Columns to create, in working order
    pub creates: Vec<ColumnCreate>,

    /// Name/type updates keyed by remote id
    pub updates: Vec<ColumnUpdate>,

    /// Full final id sequence, present only when the order actually moved.
    /// May still contain pending placeholders at plan time; the reconciler
    /// substitutes assigned ids before issuing the call.
    pub reorder: Option<Vec<ColumnId>>,
}

impl SchemaPlan {
    /// Compute the plan that turns `remote` into `working`.
    ///
    /// Re-validates the working copy's invariants even though every edit
    /// path already enforces them: the serial column must survive with its
    /// name and type intact, names must be non-empty and unique. A
    /// violation here is a [`ValidationError`] raised before any network
    /// call.
    pub fn diff(remote: &SchemaSnapshot, working: &SchemaSnapshot) -> Result<Self, ValidationError> {
        validate_working(remote, working)?;

        let working_ids: HashSet<&ColumnId> = working.columns().iter().map(|c| &c.id).collect();

        let mut deletes = Vec::new();
        for col in remote.columns() {
            if !working_ids.contains(&col.id) {
                if col.system {
                    return Err(ValidationError::SystemColumn(col.name.clone()));
                }
                match col.id.remote() {
                    Some(id) => deletes.push(id.to_string()),
                    // A pending column in the remote snapshot would be a
                    // bookkeeping bug; there is nothing to delete remotely.
                    None => {}
                }
            }
        }

        let mut creates = Vec::new();
        let mut updates = Vec::new();
        for col in working.columns() {
            match col.id.remote() {
                None => creates.push(ColumnCreate {
                    placeholder: col.id.clone(),
                    name: col.name.clone(),
                    field_type: col.field_type,
                }),
                Some(id) => {
                    if let Some(before) = remote.by_id(&col.id) {
                        if before.name != col.name || before.field_type != col.field_type {
                            if before.system {
                                return Err(ValidationError::SystemColumn(before.name.clone()));
                            }
                            updates.push(ColumnUpdate {
                                id: id.to_string(),
                                name: col.name.clone(),
                                field_type: col.field_type,
                            });
                        }
                    }
                }
            }
        }

        // Baseline order: remote order minus deletions, new columns
        // appended. Only a genuine repositioning emits a reorder call.
        let mut baseline: Vec<ColumnId> = remote
            .columns()
            .iter()
            .filter(|c| working_ids.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();
        baseline.extend(creates.iter().map(|c| c.placeholder.clone()));

        let final_order = working.id_order();
        let reorder = if final_order != baseline {
            Some(final_order)
        } else {
            None
        };

        Ok(Self {
            deletes,
            creates,
            updates,
            reorder,
        })
    }

    /// Whether the plan contains no remote operations at all.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty()
            && self.creates.is_empty()
            && self.updates.is_empty()
            && self.reorder.is_none()
    }

    /// Simulate applying the plan to `remote`, without a store.
    ///
    /// Created columns keep their placeholder ids, so the result matches
    /// the working snapshot modulo id substitution. Used by tests to prove
    /// the round-trip property.
    pub fn apply_to(&self, remote: &SchemaSnapshot) -> Result<SchemaSnapshot, ValidationError> {
        let mut columns: Vec<ColumnSchema> = remote
            .columns()
            .iter()
            .filter(|c| c.id.remote().map_or(true, |id| !self.deletes.iter().any(|d| d == id)))
            .cloned()
            .collect();

        for create in &self.creates {
            columns.push(ColumnSchema {
                id: create.placeholder.clone(),
                name: create.name.clone(),
                field_type: create.field_type,
                system: false,
            });
        }

        for update in &self.updates {
            let target = ColumnId::Remote(update.id.clone());
            let col = columns
                .iter_mut()
                .find(|c| c.id == target)
                .ok_or_else(|| ValidationError::UnknownColumn(update.name.clone()))?;
            col.name = update.name.clone();
            col.field_type = update.field_type;
        }

        if let Some(order) = &self.reorder {
            let mut reordered = Vec::with_capacity(columns.len());
            for id in order {
                let col = columns
                    .iter()
                    .find(|c| &c.id == id)
                    .cloned()
                    .ok_or_else(|| ValidationError::UnknownColumn(id.to_string()))?;
                reordered.push(col);
            }
            columns = reordered;
        }

        Ok(SchemaSnapshot::new(columns))
    }
}

fn validate_working(remote: &SchemaSnapshot, working: &SchemaSnapshot) -> Result<(), ValidationError> {
    for (i, col) in working.columns().iter().enumerate() {
        if col.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let dup = working.columns()[..i]
            .iter()
            .any(|other| other.name.eq_ignore_ascii_case(&col.name));
        if dup {
            return Err(ValidationError::DuplicateName(col.name.clone()));
        }
    }

    // The serial column must survive unchanged.
    if let Some(serial) = remote.columns().iter().find(|c| c.system) {
        match working.by_id(&serial.id) {
            None => return Err(ValidationError::SystemColumn(serial.name.clone())),
            Some(col) if col.name != serial.name || col.field_type != serial.field_type => {
                return Err(ValidationError::SystemColumn(serial.name.clone()));
            }
            Some(_) => {}
        }
    }

    Ok(())
}
