/// The access-control gate
///
/// Every team-scoped operation goes through this module instead of repeating
/// its own membership lookup: given an authenticated user and a target
/// entity, the gate resolves the entity up the ownership chain
/// (Task → Project → Team) and permits the operation iff a membership row
/// exists for (team, user).
///
/// # Policy
///
/// - `NotFound` is reported only for entities that genuinely do not exist,
///   and is checked BEFORE membership so a missing id never turns into a
///   misleading `Forbidden`.
/// - `Forbidden` (`NotMember`) is reported for entities that exist but whose
///   team the caller does not belong to.
/// - Roles are never consulted: `admin` and `member` have identical
///   permissions everywhere.
///
/// The gate is a pure query layer; it never mutates anything.
///
/// # Example
///
/// ```no_run
/// use teamtrack_shared::auth::access;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, task_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Resolves the task's team and checks the caller's membership in it.
/// let team_id = access::require_task_access(&pool, task_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::Membership;
use crate::models::team::Team;

/// Error type for access-control decisions
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The target team does not exist
    #[error("Team {0} not found")]
    TeamNotFound(Uuid),

    /// The target project does not exist
    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    /// The target task does not exist
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    /// The caller is not a member of the owning team
    #[error("Not a member of team {0}")]
    NotMember(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks that a user is a member of a team
///
/// Reports `TeamNotFound` when the team itself is missing, `NotMember`
/// when it exists but the caller holds no membership.
pub async fn require_membership(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<(), AccessError> {
    if Membership::exists(pool, team_id, user_id).await? {
        return Ok(());
    }

    if Team::find_by_id(pool, team_id).await?.is_none() {
        return Err(AccessError::TeamNotFound(team_id));
    }

    Err(AccessError::NotMember(team_id))
}

/// Resolves a project to its owning team
pub async fn team_for_project(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    let team_id: Option<Uuid> =
        sqlx::query_scalar("SELECT team_id FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(pool)
            .await?;

    Ok(team_id)
}

/// Resolves a task to its owning team through the project
pub async fn team_for_task(pool: &PgPool, task_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    let team_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT p.team_id
        FROM tasks t
        JOIN projects p ON p.id = t.project_id
        WHERE t.id = $1
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await?;

    Ok(team_id)
}

/// Checks that a user may act on a project
///
/// Resolves the project's team and tests membership there.
///
/// # Returns
///
/// The owning team's id, so callers that need it for follow-up checks
/// (e.g. assignee validation) don't resolve the chain twice.
pub async fn require_project_access(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Uuid, AccessError> {
    let team_id = team_for_project(pool, project_id)
        .await?
        .ok_or(AccessError::ProjectNotFound(project_id))?;

    if !Membership::exists(pool, team_id, user_id).await? {
        return Err(AccessError::NotMember(team_id));
    }

    Ok(team_id)
}

/// Checks that a user may act on a task
///
/// Resolves the task's team through its project and tests membership there.
///
/// # Returns
///
/// The owning team's id
pub async fn require_task_access(
    pool: &PgPool,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Uuid, AccessError> {
    let team_id = team_for_task(pool, task_id)
        .await?
        .ok_or(AccessError::TaskNotFound(task_id))?;

    if !Membership::exists(pool, team_id, user_id).await? {
        return Err(AccessError::NotMember(team_id));
    }

    Ok(team_id)
}
