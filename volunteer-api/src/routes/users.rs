/// User endpoints
///
/// - `GET /api/users` - page through users, optionally filtered by `query`
/// - `GET /api/users/me` - the authenticated caller
/// - `GET /api/users/me/registrations` - the caller's event registrations
/// - `GET /api/users/:user_id` - public profile of any user
///
/// All require a bearer token. Responses never include credential data.

use super::paging;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use volunteer_shared::{
    auth::Identity,
    models::{
        registration::{Registration, RegistrationQuery},
        user::{UserId, UserQuery},
    },
    store::{CredentialStore, EventStore},
};

/// User listing parameters
#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,

    /// Case-insensitive match against email, first name or last name
    pub query: Option<String>,
}

/// Paging for the caller's registrations
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Lists users ordered by ID
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> ApiResult<Json<Vec<Identity>>> {
    let (offset, limit) = paging::resolve(params.skip, params.limit)?;

    let users = state
        .store
        .list_users(&UserQuery {
            search: params.query.filter(|q| !q.is_empty()),
            limit,
            offset,
        })
        .await?;

    Ok(Json(users.into_iter().map(Identity::from).collect()))
}

/// Returns the caller as re-read by the guard
pub async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

/// Lists the caller's registrations, newest first
pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<RegistrationListParams>,
) -> ApiResult<Json<Vec<Registration>>> {
    let (offset, limit) = paging::resolve(params.skip, params.limit)?;

    let registrations = state
        .store
        .list_registrations(&RegistrationQuery {
            user_id: Some(identity.user_id),
            limit,
            offset,
            ..Default::default()
        })
        .await?;

    Ok(Json(registrations))
}

/// Looks up a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<Identity>> {
    let user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
