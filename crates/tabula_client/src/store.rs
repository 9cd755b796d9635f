//! Store traits - the seams between the core and the network.
//!
//! The reconciler and the view-model only ever see these traits. [`HttpApi`]
//! implements both for the real backend; tests plug in scripted doubles to
//! exercise failure paths without a server.
//!
//! [`HttpApi`]: crate::http::HttpApi

use crate::error::RemoteError;
use crate::wire::{ExportRequest, Row, RowPage, RowQuery};
use async_trait::async_trait;
use tabula_schema::{FieldType, SchemaSnapshot};

/// Remote column-schema operations, in the shapes the reconciler issues
/// them: fetch, then delete/create/update/reorder in that order.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// `GET /schema` - the authoritative ordered column list.
    async fn fetch_schema(&self) -> Result<SchemaSnapshot, RemoteError>;

    /// `POST /schema/columns` - returns the store-assigned id.
    async fn create_column(&self, name: &str, field_type: FieldType) -> Result<String, RemoteError>;

    /// `PUT /schema/columns/{id}` - rename and/or retype.
    async fn update_column(
        &self,
        id: &str,
        name: &str,
        field_type: FieldType,
    ) -> Result<(), RemoteError>;

    /// `DELETE /schema/columns/{id}`.
    async fn delete_column(&self, id: &str) -> Result<(), RemoteError>;

    /// `POST /schema/reorder` with the complete final id sequence.
    async fn reorder_columns(&self, ids: &[String]) -> Result<(), RemoteError>;
}

/// Remote row operations.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// `GET /contracts` - one page plus table metadata.
    async fn fetch_rows(&self, query: &RowQuery) -> Result<RowPage, RemoteError>;

    /// `POST /contracts`.
    async fn create_row(&self, row: &Row) -> Result<(), RemoteError>;

    /// `PUT /contracts/{id}`.
    async fn update_row(&self, id: &str, row: &Row) -> Result<(), RemoteError>;

    /// `DELETE /contracts/{id}`.
    async fn delete_row(&self, id: &str) -> Result<(), RemoteError>;

    /// `GET /export` - the encoded blob for the requested format.
    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, RemoteError>;
}
