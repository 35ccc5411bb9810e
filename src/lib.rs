//! Client for Chroma-compatible vector store REST APIs.
//!
//! Resolves the tenant → database → collection hierarchy with get-or-create
//! semantics, then moves row-oriented [`Entry`] values over the service's
//! column-oriented wire format. Queries can be scoped with the closed
//! [`Where`] / [`WhereDocument`] filter forms.
//!
//! ```no_run
//! use chroma_store::{ChromaClient, Entry, QueryRequest};
//!
//! # async fn demo() -> chroma_store::Result<()> {
//! let client = ChromaClient::new("http://localhost:8000", "npcs", "npc_memory")?;
//! let collection = client.ensure_collection("dialogue").await?;
//!
//! collection
//!     .add(&[Entry {
//!         id: "line-1".into(),
//!         document: "Well met, traveler.".into(),
//!         embedding: Some(vec![0.1, 0.4, 0.9]),
//!         ..Entry::default()
//!     }])
//!     .await?;
//!
//! let hits = collection
//!     .query(&QueryRequest {
//!         embeddings: vec![vec![0.1, 0.4, 0.88]],
//!         n_results: Some(3),
//!         ..QueryRequest::default()
//!     })
//!     .await?;
//! println!("nearest: {:?}", hits.first().map(|hit| &hit.document));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod collection;
pub mod entry;
pub mod error;
pub mod filter;

pub use client::{ChromaClient, Database, Tenant};
pub use collection::Collection;
pub use entry::{Entry, QueryRequest};
pub use error::{Error, Result};
pub use filter::{Operator, Where, WhereDocument};
