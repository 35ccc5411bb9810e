//! Resolved collection handle and the add/query data plane.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::client::ChromaClient;
use crate::entry::{AddPayload, Entry, QueryPayload, QueryRequest, QueryResponse};
use crate::error::{Error, Result};
use crate::filter::{Where, WhereDocument};

/// Wire record for a collection resource. `id` is mandatory: a record
/// without one cannot be addressed and fails the decode outright.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CollectionRecord {
    pub(crate) name: String,
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) tenant: Option<String>,
    #[serde(default)]
    pub(crate) database: Option<String>,
}

/// Handle to a resolved collection, borrowing the client that resolved it.
///
/// Obtained from [`ChromaClient::ensure_collection`]; the server-assigned
/// `id` is what add/query address on the wire.
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    pub name: String,
    pub id: String,
    pub tenant: Option<String>,
    pub database: Option<String>,
    client: &'a ChromaClient,
}

impl<'a> Collection<'a> {
    pub(crate) fn attach(record: CollectionRecord, client: &'a ChromaClient) -> Self {
        Self {
            name: record.name,
            id: record.id,
            tenant: record.tenant,
            database: record.database,
            client,
        }
    }

    /// Adds entries in one batch. The wire arrays stay index-aligned to the
    /// input order; the service answers 201 on success.
    pub async fn add(&self, entries: &[Entry]) -> Result<()> {
        let payload = AddPayload::transpose(entries);
        let url = self.client.scoped_url(&["collections", &self.id, "add"], &[]);
        debug!("POST {}", url);

        let resp = self.client.http().post(url).json(&payload).send().await?;
        let status = resp.status();
        if status != StatusCode::CREATED {
            return Err(Error::Protocol {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Runs a similarity query and flattens the first result batch into
    /// rows, nearest first. Filters are encoded up front, so an unsupported
    /// filter value never reaches the wire.
    pub async fn query(&self, request: &QueryRequest) -> Result<Vec<Entry>> {
        let where_metadata = request
            .where_metadata
            .as_ref()
            .map(Where::to_value)
            .transpose()?;
        let where_document = request.where_document.as_ref().map(WhereDocument::to_value);

        let payload = QueryPayload {
            embeddings: request.embeddings.clone(),
            n_results: request.n_results,
            where_metadata,
            where_document,
        };
        let url = self
            .client
            .scoped_url(&["collections", &self.id, "query"], &[]);
        debug!("POST {}", url);

        let resp = self.client.http().post(url).json(&payload).send().await?;
        // The body is authoritative here; the service's status codes are
        // unreliable and error replies still decode to an empty batch.
        let body = resp.text().await?;
        let batch: QueryResponse = serde_json::from_str(&body)?;
        batch.into_entries()
    }
}
