//! Tabula core: client-side state for the contract registry admin app.
//!
//! Three cooperating pieces sit on top of the REST client:
//!
//! - [`SchemaReconciler`] owns the column-schema edit lifecycle. Edits
//!   accumulate in a working copy; a commit diffs it against the last
//!   remote snapshot and executes the resulting plan in a fixed order
//!   (deletes, creates, updates, reorder).
//! - [`TabularViewModel`] holds the grid's filter, sort, pagination and
//!   column-selection state, builds the wire queries for pages and
//!   exports, and mirrors the server's sort comparator locally.
//! - [`EditSession`] is the single-row state machine around create,
//!   update and the optimistic delete.
//!
//! All network traffic goes through the `SchemaStore`/`RowStore` traits
//! from `tabula_client`; nothing here touches HTTP directly.

pub mod paging;
pub mod reconciler;
pub mod session;
pub mod view;

pub use paging::{display_sl_no, page_count, page_slice};
pub use reconciler::{CommitSummary, ReconcileError, SchemaReconciler};
pub use session::{EditSession, EditState, SessionError};
pub use view::{FilterInput, FilterState, SortState, TabularViewModel};
