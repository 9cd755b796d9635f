//! End-to-end reconciler runs against an in-memory schema backend.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tabula::{ReconcileError, SchemaReconciler};
use tabula_client::{RemoteError, SchemaStore};
use tabula_schema::{
    ColumnSchema, FieldType, SchemaSnapshot, ValidationError, SERIAL_COLUMN,
};

/// In-memory stand-in for the remote schema store. Applies every call to
/// its own column list, records the call order, and can be told to refuse
/// classes of operation ("refetch" refuses every fetch after the first) or
/// to stall one forever.
struct InMemorySchema {
    columns: Mutex<Vec<(String, String, FieldType)>>,
    log: Mutex<Vec<String>>,
    next_id: Mutex<u32>,
    fetches: Mutex<u32>,
    fail_on: Vec<&'static str>,
    stall_on: Option<&'static str>,
}

impl InMemorySchema {
    fn new() -> Self {
        Self {
            columns: Mutex::new(vec![
                ("c0".into(), SERIAL_COLUMN.into(), FieldType::Numeric),
                ("c1".into(), "Name".into(), FieldType::Text),
                ("c2".into(), "Amount".into(), FieldType::Numeric),
            ]),
            log: Mutex::new(Vec::new()),
            next_id: Mutex::new(10),
            fetches: Mutex::new(0),
            fail_on: Vec::new(),
            stall_on: None,
        }
    }

    fn failing_on(ops: &[&'static str]) -> Self {
        Self { fail_on: ops.to_vec(), ..Self::new() }
    }

    fn stalling_on(op: &'static str) -> Self {
        Self { stall_on: Some(op), ..Self::new() }
    }

    fn log_entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn refuse(&self, op: &str) -> Result<(), RemoteError> {
        if self.fail_on.contains(&op) {
            return Err(RemoteError::Api { status: 500, message: format!("{} refused", op) });
        }
        Ok(())
    }

    async fn stall(&self, op: &'static str) {
        if self.stall_on == Some(op) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl SchemaStore for InMemorySchema {
    async fn fetch_schema(&self) -> Result<SchemaSnapshot, RemoteError> {
        {
            let mut fetches = self.fetches.lock().unwrap();
            if *fetches > 0 {
                self.refuse("refetch")?;
            }
            *fetches += 1;
        }
        let columns = self.columns.lock().unwrap();
        Ok(SchemaSnapshot::new(
            columns
                .iter()
                .map(|(id, name, ft)| ColumnSchema::remote(id.clone(), name.clone(), *ft))
                .collect(),
        ))
    }

    async fn create_column(&self, name: &str, field_type: FieldType) -> Result<String, RemoteError> {
        self.refuse("create")?;
        let mut next = self.next_id.lock().unwrap();
        let id = format!("c{}", *next);
        *next += 1;
        self.columns.lock().unwrap().push((id.clone(), name.to_string(), field_type));
        self.log.lock().unwrap().push(format!("create {}", name));
        Ok(id)
    }

    async fn update_column(&self, id: &str, name: &str, field_type: FieldType) -> Result<(), RemoteError> {
        self.refuse("update")?;
        let mut columns = self.columns.lock().unwrap();
        let col = columns
            .iter_mut()
            .find(|(cid, _, _)| cid == id)
            .ok_or_else(|| RemoteError::Api { status: 404, message: format!("no column {}", id) })?;
        col.1 = name.to_string();
        col.2 = field_type;
        self.log.lock().unwrap().push(format!("update {}", id));
        Ok(())
    }

    async fn delete_column(&self, id: &str) -> Result<(), RemoteError> {
        self.stall("delete").await;
        self.refuse("delete")?;
        self.columns.lock().unwrap().retain(|(cid, _, _)| cid != id);
        self.log.lock().unwrap().push(format!("delete {}", id));
        Ok(())
    }

    async fn reorder_columns(&self, ids: &[String]) -> Result<(), RemoteError> {
        self.refuse("reorder")?;
        let mut columns = self.columns.lock().unwrap();
        let mut reordered = Vec::with_capacity(columns.len());
        for id in ids {
            let col = columns
                .iter()
                .find(|(cid, _, _)| cid == id)
                .cloned()
                .ok_or_else(|| RemoteError::Api { status: 404, message: format!("no column {}", id) })?;
            reordered.push(col);
        }
        *columns = reordered;
        self.log.lock().unwrap().push(format!("reorder {}", ids.join(",")));
        Ok(())
    }
}

#[tokio::test]
async fn commit_runs_deletes_creates_updates_reorder_in_order() {
    let mut reconciler = SchemaReconciler::load(InMemorySchema::new()).await.unwrap();

    let working = reconciler.working_mut();
    working.delete_column("Amount").unwrap();
    working.rename("Name", "Title").unwrap();
    working.add_column("Start Date", FieldType::Date).unwrap();
    working.move_column(2, 1).unwrap(); // Start Date before Title

    let summary = reconciler.commit().await.unwrap();
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert!(summary.reordered);

    // After resync the working copy forks from the store's new truth
    assert!(!reconciler.is_dirty());
    assert_eq!(reconciler.remote().names(), vec![SERIAL_COLUMN, "Start Date", "Title"]);

    // Strict operation order, with the assigned id in the reorder call
    let log = reconciler_log(&reconciler);
    assert_eq!(log, vec!["delete c2", "create Start Date", "update c1", "reorder c0,c10,c1"]);
}

#[tokio::test]
async fn clean_commit_is_a_noop() {
    let mut reconciler = SchemaReconciler::load(InMemorySchema::new()).await.unwrap();
    let summary = reconciler.commit().await.unwrap();
    assert!(summary.is_noop());
    assert!(reconciler_log(&reconciler).is_empty());
}

#[tokio::test]
async fn partial_failure_resyncs_to_what_actually_applied() {
    let mut reconciler = SchemaReconciler::load(InMemorySchema::failing_on(&["update"]))
        .await
        .unwrap();

    let working = reconciler.working_mut();
    working.delete_column("Amount").unwrap();
    working.rename("Name", "Title").unwrap();

    let err = reconciler.commit().await.unwrap_err();
    assert!(matches!(err, ReconcileError::Remote(RemoteError::Api { status: 500, .. })));

    // The delete landed before the update failed; the refetch shows it and
    // the rename is gone from the working copy.
    assert!(!reconciler.is_dirty());
    assert_eq!(reconciler.remote().names(), vec![SERIAL_COLUMN, "Name"]);
}

#[tokio::test]
async fn serial_column_edits_never_reach_the_store() {
    let mut reconciler = SchemaReconciler::load(InMemorySchema::new()).await.unwrap();

    assert_eq!(
        reconciler.working_mut().delete_column(SERIAL_COLUMN),
        Err(ValidationError::SystemColumn(SERIAL_COLUMN.into()))
    );
    assert_eq!(
        reconciler.working_mut().rename(SERIAL_COLUMN, "Serial"),
        Err(ValidationError::SystemColumn(SERIAL_COLUMN.into()))
    );

    // Nothing dirty, nothing sent
    assert!(!reconciler.is_dirty());
    let summary = reconciler.commit().await.unwrap();
    assert!(summary.is_noop());
    assert!(reconciler_log(&reconciler).is_empty());
}

#[tokio::test]
async fn discard_drops_pending_edits_without_network() {
    let mut reconciler = SchemaReconciler::load(InMemorySchema::new()).await.unwrap();
    reconciler.working_mut().rename("Name", "Title").unwrap();
    assert!(reconciler.is_dirty());

    reconciler.discard();
    assert!(!reconciler.is_dirty());
    assert!(reconciler_log(&reconciler).is_empty());
}

#[tokio::test]
async fn append_only_commit_skips_the_reorder_call() {
    let mut reconciler = SchemaReconciler::load(InMemorySchema::new()).await.unwrap();
    reconciler.working_mut().add_column("Remarks", FieldType::Text).unwrap();

    let summary = reconciler.commit().await.unwrap();
    assert_eq!(summary.created, 1);
    assert!(!summary.reordered);
    assert_eq!(reconciler_log(&reconciler), vec!["create Remarks"]);
    assert_eq!(
        reconciler.remote().names(),
        vec![SERIAL_COLUMN, "Name", "Amount", "Remarks"]
    );
}

#[tokio::test]
async fn created_column_can_be_dragged_in_the_same_commit() {
    // The reorder must carry the store-assigned id for a column that was
    // still a placeholder at plan time.
    let mut reconciler = SchemaReconciler::load(InMemorySchema::new()).await.unwrap();

    let working = reconciler.working_mut();
    working.add_column("Start Date", FieldType::Date).unwrap();
    working.move_column(3, 1).unwrap();

    let summary = reconciler.commit().await.unwrap();
    assert_eq!(summary.created, 1);
    assert!(summary.reordered);

    assert_eq!(
        reconciler_log(&reconciler),
        vec!["create Start Date", "reorder c0,c10,c1,c2"]
    );
    assert_eq!(
        reconciler.remote().names(),
        vec![SERIAL_COLUMN, "Start Date", "Name", "Amount"]
    );
}

#[tokio::test]
async fn failed_refetch_after_failed_commit_keeps_the_old_baseline() {
    let store = InMemorySchema::failing_on(&["update", "refetch"]);
    let mut reconciler = SchemaReconciler::load(store).await.unwrap();
    reconciler.working_mut().rename("Name", "Title").unwrap();

    let err = reconciler.commit().await.unwrap_err();
    assert!(matches!(err, ReconcileError::Remote(_)));

    // The rename never reached the store; it must not be promoted into the
    // baseline. The old remote stands and nothing is silently replayable.
    assert_eq!(reconciler.remote().names(), vec![SERIAL_COLUMN, "Name", "Amount"]);
    assert!(!reconciler.is_dirty());
    assert!(reconciler.pending_plan().unwrap().is_empty());
}

#[tokio::test]
async fn interrupted_commit_blocks_saves_until_refresh() {
    let mut reconciler = SchemaReconciler::load(InMemorySchema::stalling_on("delete"))
        .await
        .unwrap();
    reconciler.working_mut().delete_column("Amount").unwrap();

    // Drop the commit future mid-flight, as a cancelled UI action would.
    let interrupted = tokio::time::timeout(Duration::from_millis(10), reconciler.commit()).await;
    assert!(interrupted.is_err());
    assert!(reconciler.is_committing());

    let err = reconciler.commit().await.unwrap_err();
    assert!(matches!(err, ReconcileError::SaveInProgress));

    // A refresh resynchronises and lifts the guard.
    reconciler.refresh().await.unwrap();
    assert!(!reconciler.is_committing());

    reconciler.working_mut().rename("Name", "Title").unwrap();
    let summary = reconciler.commit().await.unwrap();
    assert_eq!(summary.updated, 1);
}

fn reconciler_log(reconciler: &SchemaReconciler<InMemorySchema>) -> Vec<String> {
    reconciler.store().log_entries()
}
