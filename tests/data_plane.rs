// tests/data_plane.rs — add and query against a resolved collection.

use chroma_store::{
    ChromaClient, Collection, Entry, Error, Operator, QueryRequest, Where, WhereDocument,
};
use serde_json::{Map, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ChromaClient {
    ChromaClient::new(&server.uri(), "npcs", "npc_memory").expect("client should build")
}

async fn resolved_collection<'a>(server: &MockServer, client: &'a ChromaClient) -> Collection<'a> {
    Mock::given(method("GET"))
        .and(path("/api/v1/collections/dialogue"))
        .and(query_param("tenant", "npcs"))
        .and(query_param("database", "npc_memory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "dialogue",
            "id": "c-77",
            "tenant": "npcs",
            "database": "npc_memory",
        })))
        .mount(server)
        .await;

    client
        .ensure_collection("dialogue")
        .await
        .expect("collection should resolve")
}

#[tokio::test]
async fn add_transposes_rows_in_input_order() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let collection = resolved_collection(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/collections/c-77/add"))
        .and(body_json(json!({
            "embeddings": [[0.1, 0.2], null],
            "documents": ["first", "second"],
            "metadatas": [{"speaker": "guard"}, null],
            "ids": ["e1", "e2"],
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let entries = [
        Entry {
            embedding: Some(vec![0.1, 0.2]),
            document: "first".into(),
            metadata: Some(Map::from_iter([("speaker".to_string(), json!("guard"))])),
            id: "e1".into(),
            distance: None,
        },
        Entry {
            document: "second".into(),
            id: "e2".into(),
            ..Entry::default()
        },
    ];
    collection.add(&entries).await.expect("add should succeed");
    server.verify().await;
}

#[tokio::test]
async fn add_requires_a_created_status() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let collection = resolved_collection(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/collections/c-77/add"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let err = collection
        .add(&[Entry {
            document: "orphan".into(),
            id: "e1".into(),
            ..Entry::default()
        }])
        .await
        .expect_err("200 is not an accepted add status");
    match err {
        Error::Protocol { status } => assert_eq!(status, 200),
        other => panic!("expected Protocol, got {other:?}"),
    }
    server.verify().await;
}

#[tokio::test]
async fn query_flattens_the_first_batch() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let collection = resolved_collection(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/collections/c-77/query"))
        .and(body_json(json!({
            "query_embeddings": [[0.1, 0.2]],
            "n_results": 2,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": [["e2", "e9"]],
            "documents": [["second", "ninth"]],
            "metadatas": [[{"speaker": "guard"}, null]],
            "distances": [[0.05, 0.4]],
            "embeddings": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = collection
        .query(&QueryRequest {
            embeddings: vec![vec![0.1, 0.2]],
            n_results: Some(2),
            ..QueryRequest::default()
        })
        .await
        .expect("query should succeed");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "e2");
    assert_eq!(hits[0].document, "second");
    assert_eq!(hits[0].distance, Some(0.05));
    assert_eq!(
        hits[0].metadata,
        Some(Map::from_iter([("speaker".to_string(), json!("guard"))]))
    );
    assert!(hits[0].embedding.is_none());
    assert_eq!(hits[1].id, "e9");
    assert_eq!(hits[1].distance, Some(0.4));
    server.verify().await;
}

#[tokio::test]
async fn query_sends_filters_on_the_wire() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let collection = resolved_collection(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/collections/c-77/query"))
        .and(body_json(json!({
            "query_embeddings": [[1.0]],
            "where": {"$and": [
                {"species": {"$eq": "elf"}},
                {"age": {"$gt": 100}},
            ]},
            "where_document": {"$contains": "moon"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": [["e1"]],
            "documents": [["moonlit clearing"]],
            "metadatas": [[null]],
            "distances": [[0.3]],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = collection
        .query(&QueryRequest {
            embeddings: vec![vec![1.0]],
            where_metadata: Some(Where::And(vec![
                Where::field("species", Operator::Eq, "elf"),
                Where::field("age", Operator::Gt, 100),
            ])),
            where_document: Some(WhereDocument::Contains("moon".into())),
            ..QueryRequest::default()
        })
        .await
        .expect("filtered query should succeed");
    assert_eq!(hits.len(), 1);
    server.verify().await;
}

#[tokio::test]
async fn unsupported_filter_values_never_reach_the_wire() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let collection = resolved_collection(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/collections/c-77/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = collection
        .query(&QueryRequest {
            embeddings: vec![vec![1.0]],
            where_metadata: Some(Where::Field {
                name: "alive".into(),
                operator: Operator::Eq,
                value: json!(true),
            }),
            ..QueryRequest::default()
        })
        .await
        .expect_err("bool filter values are not encodable");
    match err {
        Error::UnsupportedFilterValue(kind) => assert_eq!(kind, "bool"),
        other => panic!("expected UnsupportedFilterValue, got {other:?}"),
    }
    server.verify().await;
}

#[tokio::test]
async fn query_with_zero_batches_is_insufficient() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let collection = resolved_collection(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/collections/c-77/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "query failed"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = collection
        .query(&QueryRequest {
            embeddings: vec![vec![1.0]],
            ..QueryRequest::default()
        })
        .await
        .expect_err("a batchless reply is not a result");
    assert!(matches!(err, Error::InsufficientResults));
    server.verify().await;
}

#[tokio::test]
async fn query_trusts_the_body_over_the_status() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let collection = resolved_collection(&server, &client).await;

    // A well-formed batch under a 500 still counts.
    Mock::given(method("POST"))
        .and(path("/api/v1/collections/c-77/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "ids": [["e1"]],
            "documents": [["still here"]],
            "metadatas": [[null]],
            "distances": [[0.9]],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = collection
        .query(&QueryRequest {
            embeddings: vec![vec![1.0]],
            ..QueryRequest::default()
        })
        .await
        .expect("decodable batch should win over the status code");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document, "still here");
    server.verify().await;
}
