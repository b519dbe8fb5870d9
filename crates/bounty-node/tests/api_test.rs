use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use bounty_ledger::{BountyContract, GenesisConfig};
use bounty_node::api::{self, AppState, ErrorResponse};
use bounty_node::auth::CALLER_HEADER;
use bounty_node::{MemorySnapshotStore, SnapshotStore};
use bounty_types::{AccountAddress, ContentId, TokenAmount};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn alice() -> AccountAddress {
    AccountAddress::from_bytes([0xa1; 32])
}

fn bob() -> AccountAddress {
    AccountAddress::from_bytes([0xb0; 32])
}

fn charlie() -> AccountAddress {
    AccountAddress::from_bytes([0xc4; 32])
}

struct TestNode {
    router: Router,
    state: Arc<AppState>,
    store: MemorySnapshotStore,
}

fn test_node() -> TestNode {
    let genesis = GenesisConfig::default()
        .with_allocation(alice(), TokenAmount::new(10))
        .with_allocation(bob(), TokenAmount::new(20));
    let contract = BountyContract::with_genesis(&genesis).unwrap();
    let store = MemorySnapshotStore::new();
    let state = Arc::new(AppState::new("test-node", contract, Arc::new(store.clone())));
    TestNode {
        router: api::routes(state.clone()),
        state,
        store,
    }
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    caller: Option<AccountAddress>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller.to_bech32().unwrap());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn id_json(n: u64) -> Value {
    json!(ContentId::from_u64(n).to_string())
}

#[tokio::test]
async fn test_full_bounty_flow_over_http() {
    let node = test_node();
    let r = &node.router;

    let (status, body) = call(r, "POST", "/v1/bounties", Some(alice()), Some(json!({"id": "1", "amount": 3}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], id_json(1));
    assert_eq!(body["escrowed_amount"], json!(3));
    assert_eq!(body["status"], json!("Open"));

    let (status, _) = call(r, "POST", "/v1/bounties/1/submissions", Some(bob()), Some(json!({"submission_id": "4"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(r, "POST", "/v1/bounties/1/submissions", Some(charlie()), Some(json!({"submission_id": "5"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(r, "GET", "/v1/bounties/1/submissions", Some(alice()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submissions"], json!([id_json(4), id_json(5)]));

    let (status, body) = call(r, "GET", "/v1/bounties/1/accepted", Some(alice()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted_submission"], json!(ContentId::ZERO.to_string()));
    assert_eq!(body["settled"], json!(false));

    let (status, body) = call(r, "POST", "/v1/submissions/4/accept", Some(alice()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("Accepted"));

    let (_, body) = call(r, "GET", "/v1/bounties/1/accepted", Some(alice()), None).await;
    assert_eq!(body["accepted_submission"], id_json(4));
    assert_eq!(body["settled"], json!(true));

    let uri = format!("/v1/balance/{}", bob().to_bech32().unwrap());
    let (status, body) = call(r, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], json!(23));

    let (_, body) = call(r, "GET", "/v1/supply", None, None).await;
    assert_eq!(body["total_supply"], json!(30));
    assert_eq!(body["escrowed"], json!(0));
    assert_eq!(body["settled_bounties"], json!(1));

    let (_, body) = call(r, "GET", "/v1/events?since=1", None, None).await;
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["seq"], json!(2));
    assert_eq!(events[2]["type"], json!("SubmissionAccepted"));
    assert_eq!(events[2]["data"]["winner"], json!(bob().to_hex()));

    let saved = node.store.load().await.unwrap().unwrap();
    assert_eq!(saved.next_event_seq, 5);
    assert_eq!(saved.bounties.len(), 1);
}

#[tokio::test]
async fn test_error_kinds_map_to_statuses() {
    let node = test_node();
    let r = &node.router;

    let (status, body) = call(r, "POST", "/v1/bounties", Some(alice()), Some(json!({"id": "1", "amount": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("invalid_amount"));

    let (status, body) = call(r, "POST", "/v1/bounties", Some(alice()), Some(json!({"id": "0", "amount": 2}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("zero_id"));

    let (status, body) = call(r, "POST", "/v1/bounties", Some(alice()), Some(json!({"id": "1", "amount": 200}))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["kind"], json!("insufficient_funds"));

    let (status, _) = call(r, "POST", "/v1/bounties", Some(alice()), Some(json!({"id": "1", "amount": 3}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(r, "POST", "/v1/bounties", Some(bob()), Some(json!({"id": "1", "amount": 3}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], json!("duplicate_id"));

    let (status, body) = call(r, "GET", "/v1/bounties/9", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], json!("not_found"));

    call(r, "POST", "/v1/bounties/1/submissions", Some(bob()), Some(json!({"submission_id": "4"}))).await;

    let (status, body) = call(r, "POST", "/v1/submissions/4/accept", Some(bob()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert_eq!(error.kind, "unauthorized");

    let (status, _) = call(r, "POST", "/v1/submissions/4/reject", Some(alice()), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(r, "POST", "/v1/submissions/4/accept", Some(alice()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], json!("invalid_state"));

    let (status, _) = call(r, "GET", "/v1/bounties/zz", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_caller_header_required_for_caller_routes() {
    let node = test_node();
    let r = &node.router;

    let (status, body) = call(r, "POST", "/v1/bounties", None, Some(json!({"id": "1", "amount": 3}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], json!("unauthenticated"));

    let (status, _) = call(r, "GET", "/v1/me/bounties", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(node.state.contract.balance_of(alice()).await, TokenAmount::new(10));
}

#[tokio::test]
async fn test_rejected_listing_and_my_queries() {
    let node = test_node();
    let r = &node.router;

    call(r, "POST", "/v1/bounties", Some(alice()), Some(json!({"id": "1", "amount": 3}))).await;
    call(r, "POST", "/v1/bounties/1/submissions", Some(bob()), Some(json!({"submission_id": "4"}))).await;
    let (status, _) = call(r, "POST", "/v1/submissions/4/reject", Some(alice()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(r, "GET", "/v1/bounties/1/submissions/rejected", Some(alice()), None).await;
    assert_eq!(body["submissions"], json!([id_json(4)]));
    let (_, body) = call(r, "GET", "/v1/bounties/1/submissions", Some(alice()), None).await;
    assert_eq!(body["submissions"], json!([id_json(4)]));

    let (status, _) = call(r, "GET", "/v1/bounties/1/submissions/rejected", Some(bob()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = call(r, "GET", "/v1/me/bounties", Some(alice()), None).await;
    assert_eq!(body["bounties"], json!([id_json(1)]));
    let (_, body) = call(r, "GET", "/v1/me/submissions", Some(bob()), None).await;
    assert_eq!(body["submissions"], json!([id_json(4)]));
    let (_, body) = call(r, "GET", "/v1/me/bounties", Some(charlie()), None).await;
    assert_eq!(body["bounties"], json!([]));

    let (_, body) = call(r, "GET", "/v1/bounties", None, None).await;
    assert_eq!(body["bounties"], json!([id_json(1)]));

    let (status, body) = call(r, "GET", "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
    let (_, body) = call(r, "GET", "/health", None, None).await;
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["name"], json!("test-node"));
}

async fn raw_post(router: &Router, uri: &str, caller: AccountAddress, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CALLER_HEADER, caller.to_bech32().unwrap())
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_negative_amount_is_invalid_amount() {
    let node = test_node();
    let r = &node.router;

    let (status, body) = call(r, "POST", "/v1/bounties", Some(alice()), Some(json!({"id": "1", "amount": -1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("invalid_amount"));
    assert!(body["error"].as_str().unwrap().contains("-1"));

    assert_eq!(node.state.contract.balance_of(alice()).await, TokenAmount::new(10));
    assert!(node.state.contract.list_bounties().await.is_empty());
}

#[tokio::test]
async fn test_malformed_bodies_keep_error_shape() {
    let node = test_node();
    let r = &node.router;

    let (status, body) = raw_post(r, "/v1/bounties", alice(), "amount=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("bad_request"));

    let (status, body) = raw_post(r, "/v1/bounties", alice(), r#"{"id": "1"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("bad_request"));

    call(r, "POST", "/v1/bounties", Some(alice()), Some(json!({"id": "1", "amount": 3}))).await;
    let (status, body) = raw_post(r, "/v1/bounties/1/submissions", bob(), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert_eq!(error.kind, "bad_request");
    assert!(!error.error.is_empty());
}
