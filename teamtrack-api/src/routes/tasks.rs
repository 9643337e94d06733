/// Task endpoints
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create a task
/// - `PATCH  /v1/tasks/:task_id` - Partial update
/// - `DELETE /v1/tasks/:task_id` - Delete a task
/// - `POST   /v1/tasks/assign` - Assign a task to a user
/// - `GET    /v1/tasks/me` - Tasks assigned to the caller
/// - `GET    /v1/projects/:project_id/tasks` - Tasks of a project
///
/// Every task operation resolves the ownership chain Task -> Project -> Team
/// through the access-control gate and requires membership in the owning
/// team. Assignees are validated against the same team: Create and Update
/// reject a non-member assignee with `400`, the dedicated Assign endpoint
/// with `403`. Both codes are pinned by tests.

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
use serde::{Deserialize, Deserializer};
use teamtrack_shared::{
    auth::{access, middleware::AuthContext},
    models::{
        membership::Membership,
        task::{CreateTask, Task, TaskPriority, TaskStatus, TaskWithAssignee, TaskWithProject, UpdateTask},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Deserializes a field that distinguishes "absent" from "null"
///
/// With `#[serde(default, deserialize_with = "double_option")]` an omitted
/// field stays `None`, an explicit `null` becomes `Some(None)`, and a value
/// becomes `Some(Some(value))`. PATCH handlers rely on this to tell "leave
/// unchanged" apart from "clear".
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning project
    pub project_id: Uuid,

    /// Optional initial assignee (must be a member of the project's team)
    pub assignee_id: Option<Uuid>,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional due date (invalid date strings are rejected at parse time)
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial task update request
///
/// Omitted fields are left unchanged. For the nullable fields an explicit
/// `null` clears the value: `{"assignee_id": null}` unassigns the task,
/// while omitting `assignee_id` keeps the current assignee.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// New title
    pub title: Option<String>,

    /// New description (null clears)
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date (null clears; invalid date strings are rejected)
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// New assignee (null unassigns)
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

/// Assign task request
#[derive(Debug, Deserialize)]
pub struct AssignTaskRequest {
    /// Task to assign
    pub task_id: Uuid,

    /// User to assign it to (must be a member of the task's team)
    pub assignee_id: Uuid,
}

/// Creates a task under a project
///
/// Status always starts as `todo`; priority defaults to `medium`.
///
/// # Errors
///
/// - `404 Not Found`: Project doesn't exist
/// - `403 Forbidden`: Caller is not a member of the owning team
/// - `400 Bad Request`: Assignee is not a member of the owning team
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let team_id = access::require_project_access(&state.db, req.project_id, auth.user_id).await?;

    if let Some(assignee_id) = req.assignee_id {
        if !Membership::exists(&state.db, team_id, assignee_id).await? {
            return Err(ApiError::BadRequest(
                "Assignee is not a member of the team".to_string(),
            ));
        }
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            project_id: req.project_id,
            assignee_id: req.assignee_id,
            priority: req.priority,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Partially updates a task
///
/// Any subset of {status, assignee_id, title, description, priority,
/// due_date} may be sent. A non-null assignee is re-validated against the
/// owning team's membership.
///
/// # Errors
///
/// - `404 Not Found`: Task doesn't exist
/// - `403 Forbidden`: Caller is not a member of the owning team
/// - `400 Bad Request`: Assignee is not a member of the owning team
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let team_id = access::require_task_access(&state.db, task_id, auth.user_id).await?;

    if let Some(Some(assignee_id)) = req.assignee_id {
        if !Membership::exists(&state.db, team_id, assignee_id).await? {
            return Err(ApiError::BadRequest(
                "Assignee is not a member of the team".to_string(),
            ));
        }
    }

    let task = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            assignee_id: req.assignee_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes a task
///
/// # Errors
///
/// - `404 Not Found`: Task doesn't exist
/// - `403 Forbidden`: Caller is not a member of the owning team
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    access::require_task_access(&state.db, task_id, auth.user_id).await?;

    let deleted = Task::delete(&state.db, task_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Assigns a task to a user
///
/// Dedicated assignment operation. Unlike Create/Update, a non-member
/// assignee is rejected with `403 Forbidden` here.
///
/// # Errors
///
/// - `404 Not Found`: Task doesn't exist
/// - `403 Forbidden`: Caller or assignee is not a member of the owning team
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AssignTaskRequest>,
) -> ApiResult<Json<Task>> {
    let team_id = access::require_task_access(&state.db, req.task_id, auth.user_id).await?;

    if !Membership::exists(&state.db, team_id, req.assignee_id).await? {
        return Err(ApiError::Forbidden(
            "Assignee is not a member of the team".to_string(),
        ));
    }

    let task = Task::assign(&state.db, req.task_id, req.assignee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Lists the tasks assigned to the caller, newest first
pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskWithProject>>> {
    let tasks = Task::list_by_assignee(&state.db, auth.user_id).await?;

    Ok(Json(tasks))
}

/// Lists the tasks of a project with assignee display fields, newest first
///
/// # Errors
///
/// - `404 Not Found`: Project doesn't exist
/// - `403 Forbidden`: Caller is not a member of the owning team
pub async fn tasks_by_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskWithAssignee>>> {
    access::require_project_access(&state.db, project_id, auth.user_id).await?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;

    Ok(Json(tasks))
}
