//! Row-oriented entries and their column-oriented wire forms.
//!
//! The service speaks a transposed format: one array per field, index-aligned
//! across all fields of a batch. Callers work with [`Entry`] rows; the
//! conversion in both directions lives here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::filter::{Where, WhereDocument};

/// One record in a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub embedding: Option<Vec<f64>>,
    pub document: String,
    pub metadata: Option<Map<String, Value>>,
    pub id: String,
    /// Set on query results only.
    pub distance: Option<f64>,
}

/// Parameters for [`Collection::query`](crate::Collection::query).
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    /// Query vectors. The service accepts several per call, but only the
    /// first result batch is flattened; send one vector at a time.
    pub embeddings: Vec<Vec<f64>>,
    pub n_results: Option<u32>,
    pub where_metadata: Option<Where>,
    pub where_document: Option<WhereDocument>,
}

/// Column-oriented `add` body, borrowed from the caller's rows.
#[derive(Debug, Serialize)]
pub(crate) struct AddPayload<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeddings: Vec<Option<&'a [f64]>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    documents: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    metadatas: Vec<Option<&'a Map<String, Value>>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ids: Vec<&'a str>,
}

impl<'a> AddPayload<'a> {
    pub(crate) fn transpose(entries: &'a [Entry]) -> Self {
        let mut payload = Self {
            embeddings: Vec::with_capacity(entries.len()),
            documents: Vec::with_capacity(entries.len()),
            metadatas: Vec::with_capacity(entries.len()),
            ids: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            payload.embeddings.push(entry.embedding.as_deref());
            payload.documents.push(&entry.document);
            payload.metadatas.push(entry.metadata.as_ref());
            payload.ids.push(&entry.id);
        }
        payload
    }
}

/// Wire form of a query. Filters arrive pre-encoded so that conversion
/// failures surface before a request exists.
#[derive(Debug, Serialize)]
pub(crate) struct QueryPayload {
    #[serde(rename = "query_embeddings", skip_serializing_if = "Vec::is_empty")]
    pub(crate) embeddings: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) n_results: Option<u32>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub(crate) where_metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) where_document: Option<Value>,
}

/// Batch query response: outer index per query vector, inner index per
/// ranked result, nearest first. Error replies decode too (all fields
/// default), which is how a missing batch gets noticed.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Vec<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<Map<String, Value>>>>,
    #[serde(default)]
    distances: Vec<Vec<f64>>,
}

impl QueryResponse {
    /// Flattens the first batch back into rows. The service does not return
    /// embeddings here, so `embedding` stays unset.
    pub(crate) fn into_entries(self) -> Result<Vec<Entry>> {
        let ids = self
            .ids
            .into_iter()
            .next()
            .ok_or(Error::InsufficientResults)?;
        let documents = self.documents.into_iter().next().unwrap_or_default();
        let metadatas = self.metadatas.into_iter().next().unwrap_or_default();
        let distances = self.distances.into_iter().next().unwrap_or_default();

        Ok(ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| Entry {
                embedding: None,
                document: documents.get(i).cloned().flatten().unwrap_or_default(),
                metadata: metadatas.get(i).cloned().flatten(),
                id,
                distance: distances.get(i).copied(),
            })
            .collect())
    }
}
