//! User endpoints.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use prr_id::UserId;
use serde::{Deserialize, Serialize};

use super::{required, required_key};
use crate::api::error::ApiError;
use crate::api::json::ApiJson;
use crate::api::request_context::RequestContext;
use crate::domain::{PullRequestStatus, PullRequestSummary, User};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct SetIsActiveRequest {
    pub user_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct GetReviewQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id.into_inner(),
            username: user.username,
            team_name: user.team.map(|t| t.into_inner()),
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SetIsActiveResponse {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct PullRequestShortResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}

impl From<PullRequestSummary> for PullRequestShortResponse {
    fn from(pr: PullRequestSummary) -> Self {
        Self {
            pull_request_id: pr.id.into_inner(),
            pull_request_name: pr.title,
            author_id: pr.author_id.into_inner(),
            status: pr.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetReviewResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShortResponse>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /users/setIsActive
async fn set_is_active(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(req): ApiJson<SetIsActiveRequest>,
) -> Result<Json<SetIsActiveResponse>, ApiError> {
    let request_id = ctx.request_id;
    let user_id: UserId = required_key("user_id", req.user_id, &request_id)?;
    let is_active = required("is_active", req.is_active, &request_id)?;

    let user = state
        .services()
        .users
        .set_is_active(&user_id, is_active)
        .await
        .map_err(|e| ApiError::from_service(e, &request_id))?;

    Ok(Json(SetIsActiveResponse { user: user.into() }))
}

/// Pull requests the user reviews.
///
/// GET /users/getReview?user_id=
async fn get_review(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<GetReviewQuery>,
) -> Result<Json<GetReviewResponse>, ApiError> {
    let request_id = ctx.request_id;
    let user_id: UserId = required_key("user_id", query.user_id, &request_id)?;

    let reviews = state
        .services()
        .users
        .reviews(&user_id)
        .await
        .map_err(|e| ApiError::from_service(e, &request_id))?;

    Ok(Json(GetReviewResponse {
        user_id: user_id.into_inner(),
        pull_requests: reviews.into_iter().map(Into::into).collect(),
    }))
}
