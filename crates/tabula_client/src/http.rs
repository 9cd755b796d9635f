//! reqwest implementation of the store traits.

use crate::config::ClientConfig;
use crate::error::RemoteError;
use crate::store::{RowStore, SchemaStore};
use crate::wire::{
    snapshot_from_wire, ColumnBody, ExportRequest, NewColumnResponse, Row, RowPage, RowQuery,
    WireColumn,
};
use async_trait::async_trait;
use tabula_schema::{FieldType, SchemaSnapshot};

/// HTTP client for the remote schema and row store.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpApi {
    config: ClientConfig,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(config: ClientConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Pass 2xx responses through; classify everything else.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(RemoteError::from_response(response).await)
        }
    }
}

#[async_trait]
impl SchemaStore for HttpApi {
    async fn fetch_schema(&self) -> Result<SchemaSnapshot, RemoteError> {
        tracing::debug!("Fetching schema");
        let response = self.http.get(self.url("/schema")).send().await?;
        let columns: Vec<WireColumn> = Self::check(response).await?.json().await?;
        Ok(snapshot_from_wire(columns))
    }

    async fn create_column(&self, name: &str, field_type: FieldType) -> Result<String, RemoteError> {
        tracing::info!(column = name, %field_type, "Creating column");
        let body = ColumnBody { name: name.to_string(), field_type };
        let response = self
            .http
            .post(self.url("/schema/columns"))
            .json(&body)
            .send()
            .await?;
        let created: NewColumnResponse = Self::check(response).await?.json().await?;
        Ok(created.new_id)
    }

    async fn update_column(
        &self,
        id: &str,
        name: &str,
        field_type: FieldType,
    ) -> Result<(), RemoteError> {
        tracing::info!(column_id = id, new_name = name, %field_type, "Updating column");
        let body = ColumnBody { name: name.to_string(), field_type };
        let response = self
            .http
            .put(self.url(&format!("/schema/columns/{}", id)))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_column(&self, id: &str) -> Result<(), RemoteError> {
        tracing::info!(column_id = id, "Deleting column");
        let response = self
            .http
            .delete(self.url(&format!("/schema/columns/{}", id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn reorder_columns(&self, ids: &[String]) -> Result<(), RemoteError> {
        tracing::info!(count = ids.len(), "Reordering columns");
        let response = self
            .http
            .post(self.url("/schema/reorder"))
            .json(&ids)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RowStore for HttpApi {
    async fn fetch_rows(&self, query: &RowQuery) -> Result<RowPage, RemoteError> {
        tracing::debug!(page = query.page, "Fetching rows");
        let response = self
            .http
            .get(self.url("/contracts"))
            .query(&query.query_pairs())
            .send()
            .await?;
        let page: RowPage = Self::check(response).await?.json().await?;
        Ok(page)
    }

    async fn create_row(&self, row: &Row) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.url("/contracts"))
            .json(row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_row(&self, id: &str, row: &Row) -> Result<(), RemoteError> {
        let response = self
            .http
            .put(self.url(&format!("/contracts/{}", id)))
            .json(row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_row(&self, id: &str) -> Result<(), RemoteError> {
        tracing::info!(row_id = id, "Deleting row");
        let response = self
            .http
            .delete(self.url(&format!("/contracts/{}", id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, RemoteError> {
        tracing::info!(format = %request.format, "Requesting export");
        let response = self
            .http
            .get(self.url("/export"))
            .query(&request.query_pairs())
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
