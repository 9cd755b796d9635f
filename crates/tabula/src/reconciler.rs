//! Schema reconciliation against the remote store.
//!
//! [`SchemaReconciler`] owns the (remote, working) snapshot pair, delegates
//! edits to the working copy and, on commit, diffs the pair into a
//! [`SchemaPlan`] and executes it against a [`SchemaStore`] in the fixed
//! order: deletes, creates, updates, reorder. Whatever the outcome, the
//! reconciler resynchronises to a fresh remote fetch so local state never
//! drifts from the store after a partial failure.

use std::collections::HashMap;
use tabula_client::{RemoteError, SchemaStore};
use tabula_schema::{
    ColumnId, SchemaPlan, SchemaSnapshot, ValidationError, WorkingSchema,
};
use thiserror::Error;

/// Failure modes of [`SchemaReconciler::commit`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    /// The working copy violates a local invariant; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A remote call failed. The plan may have partially applied; the
    /// reconciler has already resynchronised to the store's actual state.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A previous commit was interrupted mid-flight (its future dropped
    /// before completion). The store's state is unknown until a
    /// [`SchemaReconciler::refresh`].
    #[error("A schema save is already in progress")]
    SaveInProgress,
}

/// What a successful commit actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub deleted: usize,
    pub created: usize,
    pub updated: usize,
    pub reordered: bool,
}

impl CommitSummary {
    pub fn is_noop(&self) -> bool {
        self.deleted == 0 && self.created == 0 && self.updated == 0 && !self.reordered
    }
}

/// Drives the edit-diff-commit lifecycle for the column schema.
pub struct SchemaReconciler<S> {
    store: S,
    working: WorkingSchema,
    in_flight: bool,
}

impl<S: SchemaStore> SchemaReconciler<S> {
    /// Fetch the authoritative schema and fork a clean working copy.
    pub async fn load(store: S) -> Result<Self, RemoteError> {
        let remote = store.fetch_schema().await?;
        Ok(Self {
            store,
            working: WorkingSchema::from_remote(remote),
            in_flight: false,
        })
    }

    /// The last-fetched authoritative snapshot.
    pub fn remote(&self) -> &SchemaSnapshot {
        self.working.remote()
    }

    /// The store this reconciler drives.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read access to the working copy.
    pub fn working(&self) -> &WorkingSchema {
        &self.working
    }

    /// Edit access to the working copy. All edits validate locally inside
    /// [`WorkingSchema`] before mutating anything.
    pub fn working_mut(&mut self) -> &mut WorkingSchema {
        &mut self.working
    }

    /// Whether any pending edit exists.
    pub fn is_dirty(&self) -> bool {
        self.working.is_dirty()
    }

    /// Whether a commit was started and never ran to completion.
    pub fn is_committing(&self) -> bool {
        self.in_flight
    }

    /// The plan a commit would execute right now.
    pub fn pending_plan(&self) -> Result<SchemaPlan, ValidationError> {
        SchemaPlan::diff(self.working.remote(), &self.working.snapshot())
    }

    /// Drop all pending edits, keeping the current remote snapshot.
    pub fn discard(&mut self) {
        let remote = self.working.remote().clone();
        self.working.reset_to(remote);
    }

    /// Refetch the remote schema and reset the working copy to it. Also
    /// clears the in-flight guard left behind by an interrupted commit.
    pub async fn refresh(&mut self) -> Result<(), RemoteError> {
        let remote = self.store.fetch_schema().await?;
        self.working.reset_to(remote);
        self.in_flight = false;
        Ok(())
    }

    /// Diff the working copy against the remote snapshot and execute the
    /// resulting plan.
    ///
    /// Validation failures surface before any network call. Remote calls run
    /// strictly in plan order and stop at the first failure; the store is
    /// then refetched so the next working copy forks from whatever actually
    /// applied. The exclusive borrow serializes completed commits; the
    /// `in_flight` guard additionally catches a commit whose future was
    /// dropped mid-flight, in which case every further commit returns
    /// [`ReconcileError::SaveInProgress`] until a [`Self::refresh`].
    pub async fn commit(&mut self) -> Result<CommitSummary, ReconcileError> {
        if self.in_flight {
            return Err(ReconcileError::SaveInProgress);
        }
        let plan = self.pending_plan()?;
        if plan.is_empty() {
            tracing::debug!("schema commit requested with no pending changes");
            return Ok(CommitSummary::default());
        }

        self.in_flight = true;
        let result = self.execute(&plan).await;
        self.in_flight = false;

        match result {
            Ok(summary) => {
                self.resync_after_success().await;
                tracing::info!(
                    deleted = summary.deleted,
                    created = summary.created,
                    updated = summary.updated,
                    reordered = summary.reordered,
                    "schema commit applied"
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(error = %err, "schema commit failed, resynchronising");
                self.resync_after_failure().await;
                Err(err)
            }
        }
    }

    async fn execute(&mut self, plan: &SchemaPlan) -> Result<CommitSummary, ReconcileError> {
        let mut summary = CommitSummary::default();

        for id in &plan.deletes {
            self.store.delete_column(id).await?;
            summary.deleted += 1;
        }

        // The reorder sequence needs a real id for every created column, so
        // record each placeholder's assignment as the creates come back.
        let mut assigned: HashMap<ColumnId, String> = HashMap::new();
        for create in &plan.creates {
            let id = self.store.create_column(&create.name, create.field_type).await?;
            self.working.assign_remote_id(&create.placeholder, id.clone());
            assigned.insert(create.placeholder.clone(), id);
            summary.created += 1;
        }

        for update in &plan.updates {
            self.store
                .update_column(&update.id, &update.name, update.field_type)
                .await?;
            summary.updated += 1;
        }

        if let Some(order) = &plan.reorder {
            let ids = resolve_order(order, &assigned)?;
            self.store.reorder_columns(&ids).await?;
            summary.reordered = true;
        }

        Ok(summary)
    }

    /// All plan steps applied; the refetch only picks up the authoritative
    /// ids and ordering. If it fails, the working snapshot (every id real by
    /// now) is the correct state to adopt.
    async fn resync_after_success(&mut self) {
        match self.store.fetch_schema().await {
            Ok(remote) => self.working.reset_to(remote),
            Err(err) => {
                tracing::warn!(error = %err, "schema refetch after commit failed");
                let snapshot = self.working.snapshot();
                self.working.reset_to(snapshot);
            }
        }
    }

    /// Some plan steps may have applied, others not. Partial local edits
    /// are discarded either way: a failed refetch falls back to the old
    /// remote baseline rather than promoting unapplied edits into it.
    async fn resync_after_failure(&mut self) {
        match self.store.fetch_schema().await {
            Ok(remote) => self.working.reset_to(remote),
            Err(err) => {
                tracing::warn!(error = %err, "schema refetch after failed commit also failed");
                self.discard();
            }
        }
    }
}

/// Substitute store-assigned ids for the placeholders in the reorder
/// sequence. Every create ran before the reorder, so an unresolved
/// placeholder here is a bookkeeping bug, not a remote failure.
fn resolve_order(
    order: &[ColumnId],
    assigned: &HashMap<ColumnId, String>,
) -> Result<Vec<String>, ReconcileError> {
    order
        .iter()
        .map(|id| match id {
            ColumnId::Remote(id) => Ok(id.clone()),
            ColumnId::Pending(_) => assigned
                .get(id)
                .cloned()
                .ok_or_else(|| ValidationError::UnknownColumn(id.to_string()).into()),
        })
        .collect()
}
