/// Project endpoints
///
/// # Endpoints
///
/// - `GET    /v1/projects?team_id=` - List projects of a team
/// - `POST   /v1/projects` - Create a project
/// - `DELETE /v1/projects/:project_id` - Delete a project and its tasks
///
/// Every operation is gated on membership of the owning team.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use teamtrack_shared::{
    auth::{access, middleware::AuthContext},
    models::project::{CreateProject, Project},
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning team
    pub team_id: Uuid,
}

/// Query parameters for the project listing
#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    /// Team whose projects to list
    pub team_id: Uuid,
}

/// Lists the projects of a team, newest first
///
/// # Errors
///
/// - `404 Not Found`: Team doesn't exist
/// - `403 Forbidden`: Caller is not a member
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    access::require_membership(&state.db, query.team_id, auth.user_id).await?;

    let projects = Project::list_by_team(&state.db, query.team_id).await?;

    Ok(Json(projects))
}

/// Creates a project under a team
///
/// # Errors
///
/// - `404 Not Found`: Team doesn't exist
/// - `403 Forbidden`: Caller is not a member of the team
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate()?;

    access::require_membership(&state.db, req.team_id, auth.user_id).await?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            team_id: req.team_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Deletes a project and all of its tasks
///
/// Tasks are removed first, then the project, inside one transaction.
/// Querying tasks by the deleted project id afterwards returns an empty
/// list, not an error.
///
/// # Errors
///
/// - `404 Not Found`: Project doesn't exist
/// - `403 Forbidden`: Caller is not a member of the owning team
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    access::require_project_access(&state.db, project_id, auth.user_id).await?;

    let deleted = Project::delete_with_tasks(&state.db, project_id).await?;
    if !deleted {
        // Gate passed but the project vanished in between
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
