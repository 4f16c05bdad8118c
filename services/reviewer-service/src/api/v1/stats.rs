//! Assignment statistics endpoint.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::domain::AssignmentStatsPage;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats/users", get(user_stats))
}

/// Unparseable values fall back to the defaults, so both are kept as text.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserStatResponse {
    pub user_id: String,
    pub username: String,
    pub assignments_count: u64,
}

#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub items: Vec<UserStatResponse>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl From<AssignmentStatsPage> for UserStatsResponse {
    fn from(page: AssignmentStatsPage) -> Self {
        Self {
            items: page
                .items
                .into_iter()
                .map(|s| UserStatResponse {
                    user_id: s.user_id.into_inner(),
                    username: s.username,
                    assignments_count: s.assignments,
                })
                .collect(),
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// GET /stats/users?limit=&offset=
async fn user_stats(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<StatsQuery>,
) -> Result<Json<UserStatsResponse>, ApiError> {
    let limit = query.limit.and_then(|v| v.trim().parse::<i64>().ok());
    let offset = query.offset.and_then(|v| v.trim().parse::<i64>().ok());

    let page = state
        .services()
        .stats
        .user_assignment_stats(limit, offset)
        .await
        .map_err(|e| ApiError::from_service(e, &ctx.request_id))?;

    Ok(Json(page.into()))
}
