//! Column Schema Model
//!
//! # Philosophy: Working Copy, then Plan
//!
//! The schema lifecycle in Tabula:
//!
//! 1. **Fetch**: the remote store returns the authoritative column list
//! 2. **Edit**: the admin renames, retypes, adds, deletes and drags columns
//!    against a local working copy; every edit is validated immediately
//! 3. **Plan**: diffing the working copy against the remote snapshot yields
//!    an ordered [`SchemaPlan`] (deletes, creates, updates, one reorder)
//! 4. **Commit**: the plan is applied against the store; on any failure the
//!    working copy is thrown away and the remote snapshot refetched
//!
//! Local edits never touch the network. The remote store is the single
//! source of truth, so a refetch is always a correct recovery.
//!
//! # Modules
//!
//! - [`column`]: `FieldType`, `ColumnId`, `ColumnSchema`
//! - [`snapshot`]: `SchemaSnapshot` and the editable `WorkingSchema`
//! - [`plan`]: schema diffing and the ordered operation plan
//! - [`value`]: tagged cell values driven by the column's declared type
//! - [`dates`]: dd-mm-yyyy (UI) / yyyy-mm-dd (wire) conversion

pub mod column;
pub mod dates;
pub mod plan;
pub mod snapshot;
pub mod value;

pub use column::{ColumnId, ColumnSchema, FieldType, SERIAL_COLUMN};
pub use plan::{ColumnCreate, ColumnUpdate, SchemaPlan};
pub use snapshot::{SchemaSnapshot, ValidationError, WorkingSchema};
pub use value::CellValue;
