use crate::auth::Caller;
use crate::storage::SnapshotStore;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bounty_ledger::{
    Bounty, BountyContract, BountyError, ContentId, ErrorKind, LedgerEvent, Submission,
    SupplyMetrics,
};
use bounty_types::{AccountAddress, TokenAmount};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub struct AppState {
    pub name: String,
    pub contract: BountyContract,
    pub store: Arc<dyn SnapshotStore>,
    // serializes snapshot writes so a slower save never overwrites a newer one
    persist_lock: Mutex<()>,
}

impl AppState {
    pub fn new(name: impl Into<String>, contract: BountyContract, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            name: name.into(),
            contract,
            store,
            persist_lock: Mutex::new(()),
        }
    }

    /// Write the current contract state through the snapshot store.
    ///
    /// The mutation is already committed in memory, so a failed write is logged and the
    /// next successful save catches up.
    pub async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.contract.snapshot().await;
        if let Err(e) = self.store.save(&snapshot).await {
            error!(error = %e, next_event_seq = snapshot.next_event_seq, "❌ Snapshot save failed");
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Ledger(BountyError),
    BadRequest(String),
    /// Amounts that cannot even be represented as a [`TokenAmount`].
    NegativeAmount(i64),
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

impl From<BountyError> for ApiError {
    fn from(err: BountyError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ZeroId | ErrorKind::InvalidAmount => StatusCode::BAD_REQUEST,
        ErrorKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::DuplicateId | ErrorKind::InvalidState => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::Overflow | ErrorKind::Genesis | ErrorKind::Invariant => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Ledger(err) => {
                let status = status_for(err.kind());
                if status.is_server_error() {
                    error!(kind = %err.kind(), error = %err, "❌ Ledger failure");
                }
                (
                    status,
                    ErrorResponse {
                        error: err.to_string(),
                        kind: err.kind().as_str().to_string(),
                    },
                )
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    kind: "bad_request".to_string(),
                },
            ),
            ApiError::NegativeAmount(amount) => (
                status_for(ErrorKind::InvalidAmount),
                ErrorResponse {
                    error: format!("Invalid bounty amount: {}", amount),
                    kind: ErrorKind::InvalidAmount.as_str().to_string(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Ids in paths and bodies: 32-byte hex (`0x` optional) or a plain decimal number.
pub fn parse_id(raw: &str) -> ApiResult<ContentId> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.len() <= 20 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<u64>()
            .map(ContentId::from_u64)
            .map_err(|e| ApiError::BadRequest(format!("invalid id {}: {}", raw, e)));
    }
    ContentId::from_hex(raw).map_err(|e| ApiError::BadRequest(format!("invalid id {}: {}", raw, e)))
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub name: String,
}

#[derive(Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: TokenAmount,
}

#[derive(Serialize, Deserialize)]
pub struct CreateBountyRequest {
    pub id: String,
    /// Signed so that negative amounts reach the amount check instead of failing decoding.
    pub amount: i64,
}

#[derive(Serialize, Deserialize)]
pub struct CreateSubmissionRequest {
    pub submission_id: String,
}

#[derive(Serialize, Deserialize)]
pub struct BountyListResponse {
    pub bounties: Vec<ContentId>,
}

#[derive(Serialize, Deserialize)]
pub struct SubmissionListResponse {
    pub submissions: Vec<ContentId>,
}

#[derive(Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub bounty_id: ContentId,
    /// Zero id until the bounty is settled.
    pub accepted_submission: ContentId,
    pub settled: bool,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub since: Option<u64>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<LedgerEvent>,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/supply", get(get_supply))
        .route("/v1/balance/:address", get(get_balance))
        .route("/v1/bounties", get(list_bounties).post(create_bounty))
        .route("/v1/bounties/:id", get(get_bounty))
        .route(
            "/v1/bounties/:id/submissions",
            get(list_bounty_submissions).post(create_submission),
        )
        .route(
            "/v1/bounties/:id/submissions/rejected",
            get(list_rejected_submissions),
        )
        .route("/v1/bounties/:id/accepted", get(get_accepted_submission))
        .route("/v1/submissions/:id", get(get_submission))
        .route("/v1/submissions/:id/accept", post(accept_submission))
        .route("/v1/submissions/:id/reject", post(reject_submission))
        .route("/v1/me/bounties", get(list_my_bounties))
        .route("/v1/me/submissions", get(list_my_submissions))
        .route("/v1/events", get(get_events))
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve(
    router: Router,
    host: &str,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "📡 API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        name: state.name.clone(),
    })
}

async fn get_supply(State(state): State<Arc<AppState>>) -> ApiResult<Json<SupplyMetrics>> {
    Ok(Json(state.contract.supply_metrics().await?))
}

async fn get_balance(
    Path(address): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BalanceResponse>> {
    let account = AccountAddress::from_string(&address)
        .map_err(|e| ApiError::BadRequest(format!("invalid address {}: {}", address, e)))?;

    let balance = state.contract.balance_of(account).await;
    Ok(Json(BalanceResponse {
        address: account.to_string(),
        balance,
    }))
}

async fn list_bounties(State(state): State<Arc<AppState>>) -> Json<BountyListResponse> {
    Json(BountyListResponse {
        bounties: state.contract.list_bounties().await,
    })
}

async fn create_bounty(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    body: Result<Json<CreateBountyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Bounty>)> {
    let start = Instant::now();
    let Json(req) = body?;
    let id = parse_id(&req.id)?;
    let amount = u64::try_from(req.amount).map_err(|_| ApiError::NegativeAmount(req.amount))?;

    state
        .contract
        .create_bounty(id, TokenAmount::new(amount), caller)
        .await?;
    state.persist().await;

    debug!(
        bounty_id = %id.short(),
        duration_ms = start.elapsed().as_millis() as u64,
        "📡 POST /v1/bounties"
    );
    Ok((StatusCode::CREATED, Json(state.contract.get_bounty(id).await?)))
}

async fn get_bounty(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Bounty>> {
    let id = parse_id(&id)?;
    Ok(Json(state.contract.get_bounty(id).await?))
}

async fn create_submission(
    Path(bounty_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    body: Result<Json<CreateSubmissionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Submission>)> {
    let Json(req) = body?;
    let bounty_id = parse_id(&bounty_id)?;
    let submission_id = parse_id(&req.submission_id)?;

    state
        .contract
        .create_submission(bounty_id, submission_id, caller)
        .await?;
    state.persist().await;

    Ok((
        StatusCode::CREATED,
        Json(state.contract.get_submission(submission_id).await?),
    ))
}

async fn list_bounty_submissions(
    Path(bounty_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> ApiResult<Json<SubmissionListResponse>> {
    let bounty_id = parse_id(&bounty_id)?;
    let submissions = state
        .contract
        .list_bounty_submissions(bounty_id, caller)
        .await?;
    Ok(Json(SubmissionListResponse { submissions }))
}

async fn list_rejected_submissions(
    Path(bounty_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> ApiResult<Json<SubmissionListResponse>> {
    let bounty_id = parse_id(&bounty_id)?;
    let submissions = state
        .contract
        .list_bounty_rejected_submissions(bounty_id, caller)
        .await?;
    Ok(Json(SubmissionListResponse { submissions }))
}

async fn get_accepted_submission(
    Path(bounty_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> ApiResult<Json<AcceptedResponse>> {
    let bounty_id = parse_id(&bounty_id)?;
    let accepted_submission = state
        .contract
        .get_bounty_accepted_submission(bounty_id, caller)
        .await?;
    Ok(Json(AcceptedResponse {
        bounty_id,
        accepted_submission,
        settled: !accepted_submission.is_zero(),
    }))
}

async fn get_submission(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Submission>> {
    let id = parse_id(&id)?;
    Ok(Json(state.contract.get_submission(id).await?))
}

async fn accept_submission(
    Path(submission_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> ApiResult<Json<Submission>> {
    let submission_id = parse_id(&submission_id)?;
    state
        .contract
        .accept_submission(submission_id, caller)
        .await?;
    state.persist().await;

    Ok(Json(state.contract.get_submission(submission_id).await?))
}

async fn reject_submission(
    Path(submission_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> ApiResult<Json<Submission>> {
    let submission_id = parse_id(&submission_id)?;
    state
        .contract
        .reject_submission(submission_id, caller)
        .await?;
    state.persist().await;

    Ok(Json(state.contract.get_submission(submission_id).await?))
}

async fn list_my_bounties(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Json<BountyListResponse> {
    Json(BountyListResponse {
        bounties: state.contract.list_my_bounties(caller).await,
    })
}

async fn list_my_submissions(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Json<SubmissionListResponse> {
    Json(SubmissionListResponse {
        submissions: state.contract.list_my_submissions(caller).await,
    })
}

async fn get_events(
    Query(query): Query<EventsQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<EventsResponse> {
    Json(EventsResponse {
        events: state.contract.events_since(query.since.unwrap_or(0)).await,
    })
}
