//! REST client for the remote schema and contract-row store.
//!
//! Everything remote goes through two seams: [`SchemaStore`] for the column
//! schema and [`RowStore`] for row pages, row mutation and export blobs.
//! [`HttpApi`] implements both against the backend's REST surface; tests
//! and the reconciler's failure-path coverage substitute their own doubles.
//!
//! Requests are independent request-response operations: no retry, no
//! partial rollback. Every request carries the configured timeout, so a
//! hung backend surfaces as [`RemoteError::Transport`] instead of wedging
//! the caller forever.
//!
//! # Modules
//!
//! - [`config`]: base URL, timeout and page size
//! - [`error`]: the `RemoteError` taxonomy (401 distinguished)
//! - [`wire`]: request/response DTOs and query-string building
//! - [`store`]: the `SchemaStore` / `RowStore` traits
//! - [`http`]: reqwest implementation of both traits

pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod wire;

pub use config::ClientConfig;
pub use error::RemoteError;
pub use http::HttpApi;
pub use store::{RowStore, SchemaStore};
pub use wire::{
    ExportFormat, ExportRequest, FieldTypeIndex, Row, RowPage, RowQuery, SortDirection, WireFilter,
};
