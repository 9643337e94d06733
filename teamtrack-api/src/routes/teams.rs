/// Team and membership endpoints
///
/// # Endpoints
///
/// - `GET    /v1/teams` - List the caller's teams with members and projects
/// - `POST   /v1/teams` - Create a team (caller becomes its admin member)
/// - `GET    /v1/teams/:team_id/members` - List members
/// - `POST   /v1/teams/:team_id/members` - Add a member by id or email
/// - `DELETE /v1/teams/:team_id/members/:user_id` - Remove a member
///
/// All endpoints require authentication; the member endpoints additionally
/// require the caller to be a member of the team.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teamtrack_shared::{
    auth::{access, middleware::AuthContext},
    models::{
        membership::{MemberProfile, MemberRole, Membership},
        project::Project,
        team::Team,
        user::User,
    },
};
use uuid::Uuid;

/// Create team request
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    /// Team name (required, non-empty after trimming)
    pub name: String,
}

/// Add member request
///
/// Exactly one of `user_id` or `email` identifies the user to add.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to add, by id
    pub user_id: Option<Uuid>,

    /// User to add, by email lookup
    pub email: Option<String>,

    /// Role to assign (defaults to member)
    #[serde(default)]
    pub role: MemberRole,
}

/// A team with its members and projects, as returned by listings
#[derive(Debug, Serialize)]
pub struct TeamDetail {
    /// Team ID
    pub id: Uuid,

    /// Team name
    pub name: String,

    /// When the team was created
    pub created_at: DateTime<Utc>,

    /// All members with display fields
    pub members: Vec<MemberProfile>,

    /// All projects of the team, newest first
    pub projects: Vec<Project>,
}

/// Member list response
#[derive(Debug, Serialize)]
pub struct MemberListResponse {
    /// All members with display fields
    pub members: Vec<MemberProfile>,
}

/// Lists the caller's teams
///
/// Each team is returned with its full member list and projects so the
/// dashboard can render without follow-up requests.
pub async fn list_teams(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TeamDetail>>> {
    let teams = Team::list_for_user(&state.db, auth.user_id).await?;

    let mut details = Vec::with_capacity(teams.len());
    for team in teams {
        let members = Membership::list_members(&state.db, team.id).await?;
        let projects = Project::list_by_team(&state.db, team.id).await?;
        details.push(TeamDetail {
            id: team.id,
            name: team.name,
            created_at: team.created_at,
            members,
            projects,
        });
    }

    Ok(Json(details))
}

/// Creates a team
///
/// The team and the creator's admin membership are written in one
/// transaction, so a team can never exist with zero members.
///
/// # Errors
///
/// - `400 Bad Request`: Empty name (after trimming)
pub async fn create_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<TeamDetail>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Team name is required".to_string()));
    }

    let (team, _membership) = Team::create_with_admin(&state.db, name, auth.user_id).await?;

    let members = Membership::list_members(&state.db, team.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamDetail {
            id: team.id,
            name: team.name,
            created_at: team.created_at,
            members,
            projects: Vec::new(),
        }),
    ))
}

/// Lists the members of a team
///
/// # Errors
///
/// - `404 Not Found`: Team doesn't exist
/// - `403 Forbidden`: Caller is not a member
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<MemberListResponse>> {
    access::require_membership(&state.db, team_id, auth.user_id).await?;

    let members = Membership::list_members(&state.db, team_id).await?;

    Ok(Json(MemberListResponse { members }))
}

/// Adds a member to a team
///
/// The user is identified by id or email. Any current member may add
/// members; the role defaults to `member`.
///
/// # Errors
///
/// - `400 Bad Request`: Neither `user_id` nor `email` given
/// - `404 Not Found`: Team or user doesn't exist
/// - `403 Forbidden`: Caller is not a member
/// - `409 Conflict`: User is already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    access::require_membership(&state.db, team_id, auth.user_id).await?;

    let user = match (req.user_id, req.email.as_deref()) {
        (Some(user_id), _) => User::find_by_id(&state.db, user_id).await?,
        (None, Some(email)) => User::find_by_email(&state.db, email).await?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either user_id or email is required".to_string(),
            ))
        }
    }
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if Membership::exists(&state.db, team_id, user.id).await? {
        return Err(ApiError::Conflict(
            "User is already a member of this team".to_string(),
        ));
    }

    let membership = Membership::create(&state.db, team_id, user.id, req.role).await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// Removes a member from a team
///
/// Any current member may remove any member, including the last admin and
/// themselves; no role check is applied.
///
/// # Errors
///
/// - `404 Not Found`: Team doesn't exist, or no such membership
/// - `403 Forbidden`: Caller is not a member
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    access::require_membership(&state.db, team_id, auth.user_id).await?;

    let removed = Membership::delete(&state.db, team_id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "Member not found in this team".to_string(),
        ));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
