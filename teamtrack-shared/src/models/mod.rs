/// Database models for TeamTrack
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and authentication
/// - `team`: Teams owning projects and memberships
/// - `membership`: User-team relationships with roles
/// - `project`: Projects nested under teams
/// - `task`: Tasks nested under projects
///
/// # Example
///
/// ```no_run
/// use teamtrack_shared::models::user::{User, CreateUser};
/// use teamtrack_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: Some("John Doe".to_string()),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod project;
pub mod task;
pub mod team;
pub mod user;
