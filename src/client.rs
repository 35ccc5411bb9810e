// src/client.rs

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use tracing::{debug, warn};
use url::Url;

use crate::collection::{Collection, CollectionRecord};
use crate::entry::{Entry, QueryRequest};
use crate::error::{Error, Result};

/// Fixed API root appended to the configured base URL.
const API_ROOT: [&str; 2] = ["api", "v1"];

/// Body markers that mean "resource missing" whatever the status code says.
/// The service has been seen answering 500 with a not-found message.
const NOT_FOUND_MARKERS: [&str; 2] = ["not found", "does not exist"];

/// Top-level namespace resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
}

/// Second-level scope under a tenant; `id` is assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Outcome of a get-or-create pass.
enum Resolved<T> {
    Fetched(T),
    Created(reqwest::Response),
}

/// Client for one tenant/database scope of a Chroma-compatible store.
///
/// Configuration is fixed at construction; every request derives its URL
/// from a clone of the base, so a client can be shared across tasks.
#[derive(Debug, Clone)]
pub struct ChromaClient {
    base_url: Url,
    tenant: String,
    database: String,
    http: reqwest::Client,
}

impl ChromaClient {
    /// Builds a client rooted at `<base_url>/api/v1` for the given scope.
    pub fn new(
        base_url: &str,
        tenant: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| Error::MalformedConfig(format!("invalid base URL {base_url:?}: {e}")))?;
        base.path_segments_mut()
            .map_err(|_| {
                Error::MalformedConfig(format!("base URL {base_url:?} cannot carry a path"))
            })?
            .pop_if_empty()
            .extend(API_ROOT);
        debug!("store client rooted at {}", base);

        Ok(Self {
            base_url: base,
            tenant: tenant.into(),
            database: database.into(),
            http: reqwest::Client::new(),
        })
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Resolves the configured tenant, creating it if the service does not
    /// know it yet.
    pub async fn ensure_tenant(&self) -> Result<Tenant> {
        let get_url = self.scoped_url(&["tenants", &self.tenant], &[]);
        let create_url = self.scoped_url(&["tenants"], &[]);
        let wanted = Tenant {
            name: self.tenant.clone(),
        };

        match self.ensure("tenant", get_url, create_url, &wanted).await? {
            Resolved::Fetched(tenant) => Ok(tenant),
            // Create responses carry nothing worth decoding for tenants.
            Resolved::Created(_) => Ok(wanted),
        }
    }

    /// Resolves the configured database under the configured tenant,
    /// creating it if the service does not know it yet.
    pub async fn ensure_database(&self) -> Result<Database> {
        let scope = [("tenant", self.tenant.as_str())];
        let get_url = self.scoped_url(&["databases", &self.database], &scope);
        let create_url = self.scoped_url(&["databases"], &scope);
        let wanted = Database {
            name: self.database.clone(),
            tenant: Some(self.tenant.clone()),
            id: None,
        };

        match self.ensure("database", get_url, create_url, &wanted).await? {
            Resolved::Fetched(database) => Ok(database),
            Resolved::Created(_) => Ok(wanted),
        }
    }

    /// Resolves a collection in the configured scope, creating it when
    /// missing. The returned handle borrows this client.
    pub async fn ensure_collection(&self, name: &str) -> Result<Collection<'_>> {
        let scope = [
            ("tenant", self.tenant.as_str()),
            ("database", self.database.as_str()),
        ];
        let get_url = self.scoped_url(&["collections", name], &scope);
        let create_url = self.scoped_url(&["collections"], &scope);
        let create_body = json!({ "name": name });

        let record: CollectionRecord = match self
            .ensure("collection", get_url, create_url, &create_body)
            .await?
        {
            Resolved::Fetched(record) => record,
            // The service assigns the id; it only arrives in the create body.
            Resolved::Created(resp) => {
                let body = resp.text().await?;
                serde_json::from_str(&body)?
            }
        };

        Ok(Collection::attach(record, self))
    }

    /// Deletes a collection by name within the configured scope.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        let url = self.scoped_url(
            &["collections", name],
            &[
                ("tenant", self.tenant.as_str()),
                ("database", self.database.as_str()),
            ],
        );
        debug!("DELETE {}", url);

        let resp = self.http.delete(url).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::Protocol {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Round-trip smoke test: resolves the configured scope, writes one
    /// probe entry into a scratch collection, queries it back and drops the
    /// collection. Propagates the first failure.
    pub async fn check(&self) -> Result<()> {
        const PROBE_COLLECTION: &str = "test_collection";

        let tenant = self.ensure_tenant().await?;
        debug!("check: tenant {} ok", tenant.name);

        let database = self.ensure_database().await?;
        debug!("check: database {} ok", database.name);

        let collection = self.ensure_collection(PROBE_COLLECTION).await?;
        debug!("check: collection {} ({}) ok", collection.name, collection.id);

        let mut metadata = Map::new();
        metadata.insert("createdAt".to_string(), 1234.into());

        collection
            .add(&[Entry {
                embedding: Some(vec![1.0, 1.0, 1.0]),
                document: "test2".to_string(),
                metadata: Some(metadata),
                id: "baz".to_string(),
                distance: None,
            }])
            .await?;

        let results = collection
            .query(&QueryRequest {
                embeddings: vec![vec![1.0, 1.0, 0.999]],
                ..QueryRequest::default()
            })
            .await?;
        debug!("check: query returned {} entries", results.len());

        self.delete_collection(PROBE_COLLECTION).await
    }

    /// Derives a request URL from the base: extra path segments plus any
    /// scoping query parameters. The stored base is never touched.
    pub(crate) fn scoped_url(&self, segments: &[&str], params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Uniform get-or-create. A creation conflict (409 or an "already
    /// exists" body) resolves by re-reading the resource once.
    async fn ensure<T, B>(
        &self,
        kind: &'static str,
        get_url: Url,
        create_url: Url,
        create_body: &B,
    ) -> Result<Resolved<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        if let Some(found) = self.probe(kind, &get_url).await? {
            debug!("{} found", kind);
            return Ok(Resolved::Fetched(found));
        }

        debug!("POST {} (creating {})", create_url, kind);
        let resp = self.http.post(create_url).json(create_body).send().await?;
        let status = resp.status();
        if status.is_success() {
            debug!("{} created", kind);
            return Ok(Resolved::Created(resp));
        }

        let body = resp.text().await.unwrap_or_default();
        if Self::is_conflict(status, &body) {
            debug!("{} creation lost a race, re-reading", kind);
            if let Some(found) = self.probe(kind, &get_url).await? {
                return Ok(Resolved::Fetched(found));
            }
        }

        Err(Error::CreateFailed {
            kind,
            status: status.as_u16(),
        })
    }

    /// GET probe for a resource. `Ok(None)` means the service reported it
    /// missing, by plain 404 or by a not-found marker in the body.
    async fn probe<T: DeserializeOwned>(&self, kind: &'static str, url: &Url) -> Result<Option<T>> {
        debug!("GET {}", url);
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            return Ok(Some(serde_json::from_str(&body)?));
        }

        let body = resp.text().await.unwrap_or_default();
        if Self::is_not_found(status, &body) {
            if status != StatusCode::NOT_FOUND {
                warn!("{} reported missing under status {}: {}", kind, status, body);
            }
            return Ok(None);
        }

        Err(Error::Protocol {
            status: status.as_u16(),
        })
    }

    fn is_not_found(status: StatusCode, body: &str) -> bool {
        status == StatusCode::NOT_FOUND
            || NOT_FOUND_MARKERS.iter().any(|marker| body.contains(marker))
    }

    fn is_conflict(status: StatusCode, body: &str) -> bool {
        status == StatusCode::CONFLICT || body.contains("already exists")
    }
}
