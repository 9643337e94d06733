/// Membership model and database operations
///
/// This module provides the Membership model for user-team relationships.
/// A membership is the sole unit of authorization in TeamTrack: a user may
/// act on a team-scoped resource iff a membership row exists for them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('admin', 'member');
///
/// CREATE TABLE memberships (
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (team_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// The role is stored and returned to clients, but both roles currently
/// carry identical permissions: no handler consults it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Team creator role; stored but not differentially enforced
    Admin,

    /// Default role for added members
    Member,
}

impl MemberRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }
}

impl Default for MemberRole {
    fn default() -> Self {
        MemberRole::Member
    }
}

/// Membership model representing a user-team relationship with role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Team ID
    pub team_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the team
    pub role: MemberRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// A membership joined with the member's display fields
///
/// Returned by member listings so clients can render names and emails
/// without a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberProfile {
    /// User ID
    pub id: Uuid,

    /// Member display name
    pub name: Option<String>,

    /// Member email
    pub email: String,

    /// Role within the team
    pub role: MemberRole,
}

impl Membership {
    /// Creates a new membership (adds user to team)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Membership already exists (unique constraint violation)
    /// - Team or user doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (team_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING team_id, user_id, role, created_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds a specific membership by team and user
    pub async fn find(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT team_id, user_id, role, created_at
            FROM memberships
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Checks whether a membership row exists for (team, user)
    ///
    /// This is the primitive the access-control gate is built on.
    pub async fn exists(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM memberships
                WHERE team_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Deletes a membership (removes user from team)
    ///
    /// Any current member may remove any other member, including the last
    /// admin and themselves; no role check is applied.
    ///
    /// # Returns
    ///
    /// True if membership was deleted, false if membership didn't exist
    pub async fn delete(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM memberships WHERE team_id = $1 AND user_id = $2")
                .bind(team_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of a team with their display fields
    ///
    /// Ordered by membership creation time (insertion order).
    pub async fn list_members(
        pool: &PgPool,
        team_id: Uuid,
    ) -> Result<Vec<MemberProfile>, sqlx::Error> {
        let members = sqlx::query_as::<_, MemberProfile>(
            r#"
            SELECT u.id, u.name, u.email, m.role
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.team_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Counts members in a team
    pub async fn count_by_team(pool: &PgPool, team_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE team_id = $1")
                .bind(team_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
