/// User search endpoint
///
/// # Endpoints
///
/// - `GET /v1/users?search=&team_id=` - Search users for member pickers
///
/// Matches case-insensitively on email or name and returns at most 10
/// results; when `team_id` is given, users already in that team are
/// excluded. Requires an authenticated caller but is otherwise not
/// security-sensitive (only display fields are returned).

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use teamtrack_shared::{
    auth::middleware::AuthContext,
    models::user::{User, UserProfile},
};
use uuid::Uuid;

/// Maximum number of search results; there is no pagination.
const SEARCH_LIMIT: i64 = 10;

/// Query parameters for the user search
#[derive(Debug, Deserialize)]
pub struct SearchUsersQuery {
    /// Partial email or name to match (defaults to empty = match all)
    #[serde(default)]
    pub search: String,

    /// Exclude users who already belong to this team
    pub team_id: Option<Uuid>,
}

/// Searches users by partial email or name
pub async fn search_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(query): Query<SearchUsersQuery>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = User::search(&state.db, &query.search, query.team_id, SEARCH_LIMIT).await?;

    Ok(Json(users))
}
