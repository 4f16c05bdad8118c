//! Team endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prr_id::{TeamName, UserId};
use serde::{Deserialize, Serialize};

use super::{required, required_key};
use crate::api::error::ApiError;
use crate::api::json::ApiJson;
use crate::api::request_context::RequestContext;
use crate::domain::{NewMember, Team};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct TeamMemberRequest {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AddTeamRequest {
    pub team_name: Option<String>,
    pub members: Option<Vec<TeamMemberRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct GetTeamQuery {
    pub team_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TeamMemberResponse {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team_name: String,
    pub members: Vec<TeamMemberResponse>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            team_name: team.name.into_inner(),
            members: team
                .members
                .into_iter()
                .map(|m| TeamMemberResponse {
                    user_id: m.user_id.into_inner(),
                    username: m.username,
                    is_active: m.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddTeamResponse {
    pub team: TeamResponse,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a team or replace its roster.
///
/// POST /team/add
async fn add_team(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(req): ApiJson<AddTeamRequest>,
) -> Result<Response, ApiError> {
    let request_id = ctx.request_id;

    let name: TeamName = required_key("team_name", req.team_name, &request_id)?;
    let members = required("members", req.members, &request_id)?
        .into_iter()
        .map(|m| {
            Ok(NewMember {
                user_id: required_key::<UserId>("members.user_id", m.user_id, &request_id)?,
                username: required("members.username", m.username, &request_id)?,
                is_active: required("members.is_active", m.is_active, &request_id)?,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let (_, team) = state
        .services()
        .teams
        .add_team(name, members)
        .await
        .map_err(|e| ApiError::from_service(e, &request_id))?;

    Ok((
        StatusCode::CREATED,
        Json(AddTeamResponse { team: team.into() }),
    )
        .into_response())
}

/// GET /team/get?team_name=
async fn get_team(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<GetTeamQuery>,
) -> Result<Json<TeamResponse>, ApiError> {
    let request_id = ctx.request_id;
    let name: TeamName = required_key("team_name", query.team_name, &request_id)?;

    let team = state
        .services()
        .teams
        .get_team(&name)
        .await
        .map_err(|e| ApiError::from_service(e, &request_id))?;

    Ok(Json(team.into()))
}
