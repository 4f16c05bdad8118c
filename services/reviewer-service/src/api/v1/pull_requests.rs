//! Pull request endpoints: create, merge, reassign.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use prr_id::{PullRequestId, UserId};
use serde::{Deserialize, Serialize};

use super::{required, required_key};
use crate::api::error::ApiError;
use crate::api::json::ApiJson;
use crate::api::request_context::RequestContext;
use crate::domain::{PullRequest, PullRequestStatus};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: Option<String>,
    pub pull_request_name: Option<String>,
    pub author_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MergePullRequestRequest {
    pub pull_request_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReassignRequest {
    pub pull_request_id: Option<String>,
    pub old_reviewer_id: Option<String>,
}

/// A pull request with its reviewers.
#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    pub assigned_reviewers: Vec<String>,

    /// Set once the pull request is merged.
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,

    /// Set only in reassignment responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<String>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id.into_inner(),
            pull_request_name: pr.title,
            author_id: pr.author_id.into_inner(),
            status: pr.state.status(),
            merged_at: pr.state.merged_at(),
            assigned_reviewers: pr.reviewers.into_iter().map(UserId::into_inner).collect(),
            replaced_by: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PullRequestEnvelope {
    pub pr: PullRequestResponse,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a pull request and assign reviewers.
///
/// POST /pullRequest/create
async fn create_pull_request(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(req): ApiJson<CreatePullRequestRequest>,
) -> Result<Response, ApiError> {
    let request_id = ctx.request_id;

    let id: PullRequestId = required_key("pull_request_id", req.pull_request_id, &request_id)?;
    let author_id: UserId = required_key("author_id", req.author_id, &request_id)?;
    let title = required("pull_request_name", req.pull_request_name, &request_id)?;

    let pr = state
        .services()
        .reviews
        .create(id, title, author_id)
        .await
        .map_err(|e| ApiError::from_service(e, &request_id))?;

    Ok((
        StatusCode::CREATED,
        Json(PullRequestEnvelope { pr: pr.into() }),
    )
        .into_response())
}

/// Merge a pull request. Repeated calls return the same state.
///
/// POST /pullRequest/merge
async fn merge_pull_request(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(req): ApiJson<MergePullRequestRequest>,
) -> Result<Json<PullRequestEnvelope>, ApiError> {
    let request_id = ctx.request_id;
    let id: PullRequestId = required_key("pull_request_id", req.pull_request_id, &request_id)?;

    let pr = state
        .services()
        .reviews
        .merge(&id)
        .await
        .map_err(|e| ApiError::from_service(e, &request_id))?;

    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// Replace one reviewer.
///
/// POST /pullRequest/reassign
async fn reassign_reviewer(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(req): ApiJson<ReassignRequest>,
) -> Result<Json<PullRequestEnvelope>, ApiError> {
    let request_id = ctx.request_id;
    let id: PullRequestId = required_key("pull_request_id", req.pull_request_id, &request_id)?;
    let old: UserId = required_key("old_reviewer_id", req.old_reviewer_id, &request_id)?;

    let out = state
        .services()
        .reviews
        .reassign(&id, &old)
        .await
        .map_err(|e| ApiError::from_service(e, &request_id))?;

    let mut pr = PullRequestResponse::from(out.pull_request);
    pr.replaced_by = Some(out.replaced_by.into_inner());

    Ok(Json(PullRequestEnvelope { pr }))
}
