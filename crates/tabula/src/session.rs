//! Row edit sessions and the optimistic delete.
//!
//! At most one row mutation is in progress at a time. The machine moves
//! `Viewing -> Editing | Adding -> Viewing` around a save, and
//! `Viewing -> ConfirmingDelete -> Viewing` around a delete. A delete is
//! applied optimistically: the row leaves the grid before the call, and the
//! captured (index, row) pair puts it back in place if the store refuses.

use crate::view::TabularViewModel;
use serde_json::Value;
use tabula_client::{RemoteError, Row, RowStore};
use tabula_schema::{dates, FieldType, SchemaSnapshot, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No edit is in progress")]
    NoActiveEdit,

    #[error("Another edit is already in progress")]
    Busy,

    #[error("Row has no identifier yet")]
    MissingRowId,

    #[error("No row at index {0}")]
    RowOutOfRange(usize),
}

/// Where the session machine currently sits.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditState {
    #[default]
    Viewing,

    /// An existing row's draft; `id` is the store id the save will address.
    Editing { id: String, draft: Row },

    /// A locally-new row that has never been sent.
    Adding { draft: Row },

    /// A save round-trip is in flight.
    Saving,

    /// Awaiting confirmation before the optimistic delete of the row at
    /// this index on the current page.
    ConfirmingDelete { index: usize },
}

/// Single-row edit session over the current page.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_viewing(&self) -> bool {
        matches!(self.state, EditState::Viewing)
    }

    pub fn draft(&self) -> Option<&Row> {
        match &self.state {
            EditState::Editing { draft, .. } | EditState::Adding { draft } => Some(draft),
            _ => None,
        }
    }

    /// Start editing the row at `index` on the current page.
    pub fn begin_edit(
        &mut self,
        view: &TabularViewModel,
        index: usize,
    ) -> Result<(), SessionError> {
        if !self.is_viewing() {
            return Err(SessionError::Busy);
        }
        let row = view
            .rows()
            .get(index)
            .ok_or(SessionError::RowOutOfRange(index))?;
        let id = row.id.clone().ok_or(SessionError::MissingRowId)?;
        self.state = EditState::Editing { id, draft: row.clone() };
        Ok(())
    }

    /// Start a new row, blank over every non-system column.
    pub fn begin_add(&mut self, view: &TabularViewModel) -> Result<(), SessionError> {
        if !self.is_viewing() {
            return Err(SessionError::Busy);
        }
        let headers: Vec<String> = view
            .schema()
            .columns()
            .iter()
            .filter(|c| !c.system)
            .map(|c| c.name.clone())
            .collect();
        self.state = EditState::Adding { draft: Row::blank(&headers) };
        Ok(())
    }

    /// Overwrite one field of the draft.
    pub fn set_field(&mut self, column: &str, value: Value) -> Result<(), SessionError> {
        match &mut self.state {
            EditState::Editing { draft, .. } | EditState::Adding { draft } => {
                draft.values.insert(column.to_string(), value);
                Ok(())
            }
            _ => Err(SessionError::NoActiveEdit),
        }
    }

    /// Abandon the draft or the pending delete confirmation.
    pub fn cancel(&mut self) {
        self.state = EditState::Viewing;
    }

    /// Validate the draft against the schema, normalise dates to wire form
    /// and send it. Success lands back in `Viewing`; on failure nothing was
    /// written, the draft survives and the caller surfaces the error.
    pub async fn save(
        &mut self,
        schema: &SchemaSnapshot,
        store: &impl RowStore,
    ) -> Result<(), SessionError> {
        let state = std::mem::replace(&mut self.state, EditState::Saving);
        let result = match &state {
            EditState::Editing { id, draft } => match normalize_draft(schema, draft.clone()) {
                Ok(draft) => {
                    tracing::debug!(id = %id, "updating row");
                    store.update_row(id, &draft).await.map_err(SessionError::from)
                }
                Err(err) => Err(err),
            },
            EditState::Adding { draft } => match normalize_draft(schema, draft.clone()) {
                Ok(draft) => {
                    tracing::debug!("creating row");
                    store.create_row(&draft).await.map_err(SessionError::from)
                }
                Err(err) => Err(err),
            },
            _ => {
                self.state = state;
                return Err(SessionError::NoActiveEdit);
            }
        };

        match result {
            Ok(()) => {
                self.state = EditState::Viewing;
                Ok(())
            }
            Err(err) => {
                self.state = state;
                Err(err)
            }
        }
    }

    /// Ask for confirmation before deleting the row at `index`.
    pub fn request_delete(
        &mut self,
        view: &TabularViewModel,
        index: usize,
    ) -> Result<(), SessionError> {
        if !self.is_viewing() {
            return Err(SessionError::Busy);
        }
        if index >= view.rows().len() {
            return Err(SessionError::RowOutOfRange(index));
        }
        self.state = EditState::ConfirmingDelete { index };
        Ok(())
    }

    /// Execute the confirmed delete optimistically.
    ///
    /// The row is removed from the page before the call; if the store
    /// refuses, the captured copy goes back at its exact former index.
    pub async fn confirm_delete(
        &mut self,
        view: &mut TabularViewModel,
        store: &impl RowStore,
    ) -> Result<(), SessionError> {
        let index = match std::mem::take(&mut self.state) {
            EditState::ConfirmingDelete { index } => index,
            other => {
                self.state = other;
                return Err(SessionError::NoActiveEdit);
            }
        };

        let row = view
            .rows()
            .get(index)
            .ok_or(SessionError::RowOutOfRange(index))?;
        let id = row.id.clone().ok_or(SessionError::MissingRowId)?;

        let removed = view
            .remove_row(index)
            .ok_or(SessionError::RowOutOfRange(index))?;

        if let Err(err) = store.delete_row(&id).await {
            tracing::warn!(id = %id, error = %err, "row delete refused, restoring");
            view.restore_row(index, removed);
            return Err(err.into());
        }

        tracing::info!(id = %id, "row deleted");
        Ok(())
    }
}

/// Parse every cell under its declared type and rewrite dates from the UI
/// form to the wire form. Empty cells pass through untouched.
fn normalize_draft(schema: &SchemaSnapshot, mut draft: Row) -> Result<Row, SessionError> {
    for col in schema.columns() {
        if col.system {
            continue;
        }
        let Some(Value::String(raw)) = draft.get(&col.name).cloned() else {
            continue;
        };
        let raw = raw.trim().to_string();
        if raw.is_empty() {
            continue;
        }
        match col.field_type {
            FieldType::Text => {}
            FieldType::Numeric => {
                raw.parse::<f64>()
                    .map_err(|_| ValidationError::BadNumber(raw.clone()))?;
            }
            FieldType::Date => {
                let date = dates::parse_ui(&raw).or_else(|_| dates::parse_wire(&raw))?;
                draft
                    .values
                    .insert(col.name.clone(), Value::String(dates::format_wire(date)));
            }
        }
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tabula_client::{ExportRequest, RowPage, RowQuery};
    use tabula_schema::{ColumnSchema, SERIAL_COLUMN};

    #[derive(Default)]
    struct ScriptedRows {
        fail_delete: bool,
        fail_update: bool,
        created: Mutex<Vec<Row>>,
        updated: Mutex<Vec<(String, Row)>>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RowStore for ScriptedRows {
        async fn fetch_rows(&self, _query: &RowQuery) -> Result<RowPage, RemoteError> {
            Ok(RowPage::default())
        }

        async fn create_row(&self, row: &Row) -> Result<(), RemoteError> {
            self.created.lock().unwrap().push(row.clone());
            Ok(())
        }

        async fn update_row(&self, id: &str, row: &Row) -> Result<(), RemoteError> {
            if self.fail_update {
                return Err(RemoteError::Api { status: 422, message: "rejected".into() });
            }
            self.updated.lock().unwrap().push((id.to_string(), row.clone()));
            Ok(())
        }

        async fn delete_row(&self, id: &str) -> Result<(), RemoteError> {
            if self.fail_delete {
                return Err(RemoteError::Api { status: 500, message: "nope".into() });
            }
            self.deleted.lock().unwrap().push(id.to_string());
            Ok(())
        }

        async fn export(&self, _request: &ExportRequest) -> Result<Vec<u8>, RemoteError> {
            Ok(Vec::new())
        }
    }

    fn schema() -> SchemaSnapshot {
        SchemaSnapshot::new(vec![
            ColumnSchema::remote("c0", SERIAL_COLUMN, FieldType::Numeric),
            ColumnSchema::remote("c1", "Name", FieldType::Text),
            ColumnSchema::remote("c2", "Amount", FieldType::Numeric),
            ColumnSchema::remote("c3", "Start Date", FieldType::Date),
        ])
    }

    fn view_with_rows(rows: Vec<Row>) -> TabularViewModel {
        let mut vm = TabularViewModel::new(10);
        vm.sync_schema(schema());
        vm.set_rows_for_tests(rows);
        vm
    }

    fn row(values: serde_json::Value) -> Row {
        serde_json::from_value(values).unwrap()
    }

    #[tokio::test]
    async fn add_session_creates_row_with_wire_dates() {
        let store = ScriptedRows::default();
        let vm = view_with_rows(vec![]);
        let mut session = EditSession::new();

        session.begin_add(&vm).unwrap();
        // Blank drafts skip the serial column entirely
        assert!(session.draft().unwrap().get(SERIAL_COLUMN).is_none());

        session.set_field("Name", json!("Pipeline survey")).unwrap();
        session.set_field("Amount", json!("1250.5")).unwrap();
        session.set_field("Start Date", json!("15-01-2024")).unwrap();
        session.save(&schema(), &store).await.unwrap();

        assert!(session.is_viewing());
        let created = store.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].get("Start Date"), Some(&json!("2024-01-15")));
    }

    #[tokio::test]
    async fn draft_validation_runs_before_the_network() {
        let store = ScriptedRows::default();
        let vm = view_with_rows(vec![]);
        let mut session = EditSession::new();

        session.begin_add(&vm).unwrap();
        session.set_field("Amount", json!("lots")).unwrap();
        let err = session.save(&schema(), &store).await.unwrap_err();
        assert_eq!(err, SessionError::Validation(ValidationError::BadNumber("lots".into())));
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_session_addresses_row_by_id() {
        let store = ScriptedRows::default();
        let vm = view_with_rows(vec![row(json!({"id": "r1", "Name": "Survey", "Amount": 100}))]);
        let mut session = EditSession::new();

        session.begin_edit(&vm, 0).unwrap();
        session.set_field("Amount", json!(250)).unwrap();
        session.save(vm.schema(), &store).await.unwrap();

        let updated = store.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, "r1");
        assert_eq!(updated[0].1.get("Amount"), Some(&json!(250)));
    }

    #[tokio::test]
    async fn failed_save_keeps_the_draft() {
        let store = ScriptedRows { fail_update: true, ..Default::default() };
        let vm = view_with_rows(vec![row(json!({"id": "r1", "Name": "Survey"}))]);
        let mut session = EditSession::new();

        session.begin_edit(&vm, 0).unwrap();
        session.set_field("Name", json!("Resurvey")).unwrap();
        let err = session.save(vm.schema(), &store).await.unwrap_err();
        assert!(matches!(err, SessionError::Remote(RemoteError::Api { status: 422, .. })));

        // The draft survives for a retry or a cancel
        assert!(!session.is_viewing());
        assert_eq!(session.draft().unwrap().get("Name"), Some(&json!("Resurvey")));
    }

    #[tokio::test]
    async fn only_one_session_at_a_time() {
        let vm = view_with_rows(vec![row(json!({"id": "r1", "Name": "Survey"}))]);
        let mut session = EditSession::new();

        session.begin_edit(&vm, 0).unwrap();
        assert_eq!(session.begin_add(&vm), Err(SessionError::Busy));
        assert_eq!(session.request_delete(&vm, 0), Err(SessionError::Busy));

        session.cancel();
        session.begin_add(&vm).unwrap();
    }

    #[tokio::test]
    async fn confirmed_delete_removes_then_commits() {
        let store = ScriptedRows::default();
        let mut vm = view_with_rows(vec![
            row(json!({"id": "r1", "Name": "A"})),
            row(json!({"id": "r2", "Name": "B"})),
        ]);
        let mut session = EditSession::new();

        session.request_delete(&vm, 1).unwrap();
        session.confirm_delete(&mut vm, &store).await.unwrap();

        assert_eq!(vm.rows().len(), 1);
        assert_eq!(store.deleted.lock().unwrap().as_slice(), &["r2".to_string()]);
    }

    #[tokio::test]
    async fn failed_delete_restores_the_exact_row() {
        let store = ScriptedRows { fail_delete: true, ..Default::default() };
        let mut vm = view_with_rows(vec![
            row(json!({"id": "r1", "Name": "A"})),
            row(json!({"id": "r2", "Name": "B"})),
            row(json!({"id": "r3", "Name": "C"})),
        ]);
        let before = vm.rows().to_vec();
        let mut session = EditSession::new();

        session.request_delete(&vm, 1).unwrap();
        let err = session.confirm_delete(&mut vm, &store).await.unwrap_err();
        assert!(matches!(err, SessionError::Remote(_)));

        // Same rows, same order, same index
        assert_eq!(vm.rows(), before.as_slice());
    }

    #[tokio::test]
    async fn cancelled_delete_touches_nothing() {
        let store = ScriptedRows::default();
        let mut vm = view_with_rows(vec![row(json!({"id": "r1", "Name": "A"}))]);
        let mut session = EditSession::new();

        session.request_delete(&vm, 0).unwrap();
        session.cancel();
        assert_eq!(session.confirm_delete(&mut vm, &store).await, Err(SessionError::NoActiveEdit));
        assert_eq!(vm.rows().len(), 1);
        assert!(store.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsaved_local_row_cannot_be_edited_by_id() {
        let vm = view_with_rows(vec![row(json!({"Name": "no id yet"}))]);
        let mut session = EditSession::new();
        assert_eq!(session.begin_edit(&vm, 0), Err(SessionError::MissingRowId));
    }
}
