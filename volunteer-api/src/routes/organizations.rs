/// Organization and membership endpoints
///
/// Listing is public; everything else needs a bearer token.
///
/// | Route | Who may call |
/// |-------|--------------|
/// | `GET /api/organization` | anyone |
/// | `POST /api/organization` | any user; becomes admin |
/// | `PUT /api/organization/:id` | admins |
/// | `DELETE /api/organization/:id` | the creator |
/// | `GET /api/organization/:id/users` | members |
/// | `POST /api/organization/:id/users` | admins; others may add themselves as volunteer |
/// | `PUT /api/organization/:id/users/:user_id` | admins |
/// | `DELETE /api/organization/:id/users/:user_id` | admins, or the member themself |
///
/// The creator can never be removed from their organization.

use super::paging;
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
use validator::Validate;
use volunteer_shared::{
    auth::{AuthError, Identity},
    models::{
        organization::{
            NewOrganization, Organization, OrganizationId, OrganizationQuery, UpdateOrganization,
        },
        role::{Member, PermissionLevel, Role},
        user::UserId,
    },
    store::{CredentialStore, RoleStore, StoreError},
};

const ADMIN: &[PermissionLevel] = &[PermissionLevel::Admin];
const MEMBER: &[PermissionLevel] = &[PermissionLevel::Admin, PermissionLevel::Volunteer];

/// Listing parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,

    /// Case-insensitive match on name or description
    pub query: Option<String>,
}

/// New organization body
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Partial organization update body
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// New member body
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: UserId,

    #[serde(default)]
    pub permission_level: PermissionLevel,
}

/// Role change body
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub permission_level: PermissionLevel,
}

/// Turns a `Forbidden` from the guard into a 403 with a specific message
pub(crate) fn forbidden(message: &'static str) -> impl FnOnce(AuthError) -> ApiError {
    move |err| match err {
        AuthError::Forbidden => ApiError::Forbidden(message.to_string()),
        other => other.into(),
    }
}

pub(crate) async fn find_organization(
    state: &AppState,
    organization_id: OrganizationId,
) -> ApiResult<Organization> {
    state
        .store
        .find_organization(organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))
}

async fn find_member(
    state: &AppState,
    organization_id: OrganizationId,
    user_id: UserId,
) -> ApiResult<Member> {
    state
        .store
        .list_members(organization_id)
        .await?
        .into_iter()
        .find(|m| m.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Lists organizations with paging and optional search
///
/// # Errors
///
/// - `400 Bad Request`: negative `skip` or `limit` below 1
pub async fn list_organizations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Organization>>> {
    let (offset, limit) = paging::resolve(params.skip, params.limit)?;

    let query = OrganizationQuery {
        search: params.query.filter(|q| !q.trim().is_empty()),
        limit,
        offset,
    };

    Ok(Json(state.store.list_organizations(&query).await?))
}

/// Creates an organization with the caller as its admin
pub async fn create_organization(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    req.validate()?;

    let organization = state
        .store
        .create_organization(&NewOrganization {
            name: req.name,
            description: req.description,
            created_by_user_id: identity.user_id,
        })
        .await?;

    tracing::info!(
        organization_id = organization.organization_id,
        user_id = identity.user_id,
        "Organization created"
    );

    Ok((StatusCode::CREATED, Json(organization)))
}

/// Updates name and/or description; admins only
pub async fn update_organization(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(organization_id): Path<OrganizationId>,
    Json(req): Json<UpdateOrganizationRequest>,
) -> ApiResult<Json<Organization>> {
    req.validate()?;
    find_organization(&state, organization_id).await?;

    state
        .guard
        .require_role(&identity, organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can update this organization"))?;

    let updated = state
        .store
        .update_organization(
            organization_id,
            &UpdateOrganization {
                name: req.name,
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes an organization and all its roles; creator only
pub async fn delete_organization(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(organization_id): Path<OrganizationId>,
) -> ApiResult<Json<Organization>> {
    let organization = find_organization(&state, organization_id).await?;

    if organization.created_by_user_id != identity.user_id {
        return Err(ApiError::Forbidden(
            "Only the organization creator can delete this organization".to_string(),
        ));
    }

    state.store.delete_organization(organization_id).await?;

    tracing::info!(organization_id, user_id = identity.user_id, "Organization deleted");
    Ok(Json(organization))
}

/// Lists members with their roles; members only
pub async fn list_members(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(organization_id): Path<OrganizationId>,
) -> ApiResult<Json<Vec<Member>>> {
    find_organization(&state, organization_id).await?;

    state
        .guard
        .require_role(&identity, organization_id, MEMBER)
        .await
        .map_err(forbidden("Only organization members can view its members"))?;

    Ok(Json(state.store.list_members(organization_id).await?))
}

/// Adds a member
///
/// Admins may add anyone at any level. Anyone else may only join as a
/// volunteer themself.
///
/// # Errors
///
/// - `403 Forbidden`: not allowed to grant this role
/// - `404 Not Found`: unknown organization or user
/// - `409 Conflict`: the user already has a role here
pub async fn add_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(organization_id): Path<OrganizationId>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    find_organization(&state, organization_id).await?;

    let self_join =
        req.user_id == identity.user_id && req.permission_level == PermissionLevel::Volunteer;

    if !self_join {
        state
            .guard
            .require_role(&identity, organization_id, ADMIN)
            .await
            .map_err(forbidden(
                "Only organization admins can add other members or grant admin",
            ))?;
    }

    let user = state
        .store
        .find_by_id(req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let role = state
        .store
        .insert_role(&Role {
            user_id: user.user_id,
            organization_id,
            permission_level: req.permission_level,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                ApiError::Conflict("User already has a role in this organization".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(
        organization_id,
        user_id = user.user_id,
        level = role.permission_level.as_str(),
        added_by = identity.user_id,
        "Member added"
    );

    Ok((
        StatusCode::CREATED,
        Json(Member {
            user_id: user.user_id,
            organization_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            permission_level: role.permission_level,
        }),
    ))
}

/// Changes a member's permission level; admins only
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((organization_id, user_id)): Path<(OrganizationId, UserId)>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Member>> {
    let organization = find_organization(&state, organization_id).await?;

    state
        .guard
        .require_role(&identity, organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can change member roles"))?;

    if user_id == organization.created_by_user_id
        && req.permission_level != PermissionLevel::Admin
    {
        return Err(ApiError::Forbidden(
            "The organization creator must remain an admin".to_string(),
        ));
    }

    state
        .store
        .update_role(user_id, organization_id, req.permission_level)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(find_member(&state, organization_id, user_id).await?))
}

/// Removes a member; admins, or the member themself
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((organization_id, user_id)): Path<(OrganizationId, UserId)>,
) -> ApiResult<Json<Member>> {
    let organization = find_organization(&state, organization_id).await?;

    state
        .guard
        .require_self_or_role(&identity, user_id, organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can remove other members"))?;

    if user_id == organization.created_by_user_id {
        return Err(ApiError::Forbidden(
            "The organization creator cannot be removed".to_string(),
        ));
    }

    let member = find_member(&state, organization_id, user_id).await?;
    state.store.delete_role(user_id, organization_id).await?;

    tracing::info!(organization_id, user_id, removed_by = identity.user_id, "Member removed");
    Ok(Json(member))
}
