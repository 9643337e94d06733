/// Task model and database operations
///
/// Tasks are the leaf of the ownership chain Task → Project → Team. Any
/// authorization check on a task resolves up to its team through the owning
/// project; the assignee, when set, must hold a membership in that team
/// (enforced by the handlers at write time, not by the schema).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in-progress', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     project_id UUID NOT NULL REFERENCES projects(id),
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use teamtrack_shared::models::task::{Task, CreateTask, TaskPriority};
/// use teamtrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Write spec".to_string(),
///     description: None,
///     project_id,
///     assignee_id: None,
///     priority: TaskPriority::Medium,
///     due_date: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet (default for new tasks)
    Todo,

    /// Someone is working on it
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Converts priority to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Task model representing a unit of work within a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Project that owns this task
    pub project_id: Uuid,

    /// Assigned user, if any
    ///
    /// Must reference a member of the owning team; validated at write time.
    pub assignee_id: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning project
    pub project_id: Uuid,

    /// Optional initial assignee (must be a member of the project's team)
    pub assignee_id: Option<Uuid>,

    /// Priority (defaults to Medium)
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for partially updating an existing task
///
/// The outer `Option` distinguishes "field omitted, leave unchanged" from
/// "field present"; for nullable columns the inner `Option` carries the new
/// value, with `None` meaning "clear". `Some(None)` on `assignee_id`
/// therefore unassigns the task, while a plain `None` leaves the assignee
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description (Some(None) clears it)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date (Some(None) clears it)
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// New assignee (Some(None) unassigns)
    pub assignee_id: Option<Option<Uuid>>,
}

impl UpdateTask {
    /// Returns true when no field is set (nothing to write)
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assignee_id.is_none()
    }
}

/// A task joined with its assignee's display fields
///
/// Returned by project task listings so clients can render assignee names
/// without a second lookup.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskWithAssignee {
    /// The task itself
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,

    /// Assignee display name (None when unassigned or name unset)
    pub assignee_name: Option<String>,

    /// Assignee email (None when unassigned)
    pub assignee_email: Option<String>,
}

/// A task joined with its project's display fields
///
/// Returned by the "my tasks" listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskWithProject {
    /// The task itself
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,

    /// Name of the owning project
    pub project_name: String,
}

impl Task {
    /// Creates a new task in the database
    ///
    /// Status always starts as `todo`; priority and assignee come from the
    /// caller (membership of the assignee is the caller's responsibility).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The project doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, project_id, assignee_id, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, status, priority, due_date,
                      project_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.project_id)
        .bind(data.assignee_id)
        .bind(data.priority)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   project_id, assignee_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Partially updates an existing task
    ///
    /// Only fields set in `data` are written; the `updated_at` timestamp is
    /// always refreshed. Nullable fields with `Some(None)` are set to NULL.
    ///
    /// # Returns
    ///
    /// The updated task if found, None if the task doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, priority, due_date, \
             project_id, assignee_id, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Sets the assignee of a task
    ///
    /// # Returns
    ///
    /// The updated task if found, None if the task doesn't exist
    pub async fn assign(
        pool: &PgPool,
        id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET assignee_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, priority, due_date,
                      project_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(assignee_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task by ID
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all tasks of a project with assignee display fields, newest first
    ///
    /// Querying a nonexistent (or just-deleted) project id returns an empty
    /// list, not an error.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<TaskWithAssignee>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskWithAssignee>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date,
                   t.project_id, t.assignee_id, t.created_at, t.updated_at,
                   u.name AS assignee_name, u.email AS assignee_email
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assignee_id
            WHERE t.project_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists all tasks assigned to a user with project display fields, newest first
    pub async fn list_by_assignee(
        pool: &PgPool,
        assignee_id: Uuid,
    ) -> Result<Vec<TaskWithProject>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskWithProject>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date,
                   t.project_id, t.assignee_id, t.created_at, t.updated_at,
                   p.name AS project_name
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.assignee_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(assignee_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}
