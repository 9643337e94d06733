/// Team model and database operations
///
/// Teams are the unit of multi-tenant isolation: projects and memberships
/// hang off a team, and every authorization decision resolves to "is this
/// user a member of this team".
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use teamtrack_shared::models::team::Team;
/// use teamtrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(creator_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// // Creates the team and the creator's admin membership atomically.
/// let (team, membership) = Team::create_with_admin(&pool, "Engineering", creator_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::membership::{MemberRole, Membership};

/// Team model representing a team of users
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Unique team ID (UUID v4)
    pub id: Uuid,

    /// Team name
    pub name: String,

    /// When the team was created
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a team together with the creator's admin membership
    ///
    /// Both rows are written in a single transaction. A team must never
    /// exist with zero members, even under partial failure, so plain team
    /// creation without a first member is deliberately not exposed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The creator user does not exist (foreign key violation)
    /// - Database connection fails (nothing is written)
    pub async fn create_with_admin(
        pool: &PgPool,
        name: &str,
        creator_id: Uuid,
    ) -> Result<(Self, Membership), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (team_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING team_id, user_id, role, created_at
            "#,
        )
        .bind(team.id)
        .bind(creator_id)
        .bind(MemberRole::Admin)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((team, membership))
    }

    /// Finds a team by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, created_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(team)
    }

    /// Lists all teams the given user is a member of
    ///
    /// Ordered by membership creation time, oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.name, t.created_at
            FROM teams t
            JOIN memberships m ON m.team_id = t.id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(teams)
    }
}
