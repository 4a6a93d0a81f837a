/// Event and registration endpoints
///
/// | Route | Who may call |
/// |-------|--------------|
/// | `GET /api/events` | anyone |
/// | `GET /api/events/:id` | anyone |
/// | `POST /api/events` | admins of the event's organization |
/// | `PUT /api/events/:id` | admins of the event's organization |
/// | `DELETE /api/events/:id` | admins of the event's organization |
/// | `GET /api/events/:id/registrations` | admins of the event's organization |
/// | `POST /api/events/:id/registrations` | admins; members may register themselves |
/// | `DELETE /api/events/:id/registrations/:user_id` | admins, or the registrant themself |
///
/// Only members of the organization can be registered for its events.

use super::{
    organizations::{find_organization, forbidden},
    paging,
};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;
use volunteer_shared::{
    auth::Identity,
    models::{
        event::{Event, EventId, EventQuery, NewEvent, UpdateEvent},
        organization::OrganizationId,
        registration::{Registration, RegistrationQuery},
        role::PermissionLevel,
        user::UserId,
    },
    store::{CredentialStore, EventStore, RoleStore, StoreError},
};

const ADMIN: &[PermissionLevel] = &[PermissionLevel::Admin];

/// Event listing parameters
#[derive(Debug, Default, Deserialize)]
pub struct EventListParams {
    pub organization_id: Option<OrganizationId>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Registration listing parameters
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// New event body
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    pub organization_id: OrganizationId,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    /// RFC 3339 timestamp
    pub starts_at: DateTime<Utc>,
}

/// Partial event update body
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    pub starts_at: Option<DateTime<Utc>>,
}

/// Registration body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_id: UserId,
}

async fn find_event(state: &AppState, event_id: EventId) -> ApiResult<Event> {
    state
        .store
        .find_event(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// Lists events, optionally for one organization
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventListParams>,
) -> ApiResult<Json<Vec<Event>>> {
    let (offset, limit) = paging::resolve(params.skip, params.limit)?;

    let events = state
        .store
        .list_events(&EventQuery {
            organization_id: params.organization_id,
            limit,
            offset,
        })
        .await?;

    Ok(Json(events))
}

/// Gets one event
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Json<Event>> {
    Ok(Json(find_event(&state, event_id).await?))
}

/// Creates an event for an organization the caller administers
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin of the organization
/// - `404 Not Found`: unknown organization
/// - `422 Unprocessable Entity`: invalid fields
pub async fn create_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    req.validate()?;
    find_organization(&state, req.organization_id).await?;

    state
        .guard
        .require_role(&identity, req.organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can create events"))?;

    let event = state
        .store
        .create_event(&NewEvent {
            organization_id: req.organization_id,
            name: req.name,
            description: req.description,
            location: req.location,
            starts_at: req.starts_at,
        })
        .await?;

    tracing::info!(
        event_id = event.event_id,
        organization_id = event.organization_id,
        user_id = identity.user_id,
        "Event created"
    );

    Ok((StatusCode::CREATED, Json(event)))
}

/// Updates the given fields of an event; admins only
pub async fn update_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<EventId>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    req.validate()?;
    let event = find_event(&state, event_id).await?;

    state
        .guard
        .require_role(&identity, event.organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can update events"))?;

    let updated = state
        .store
        .update_event(
            event_id,
            &UpdateEvent {
                name: req.name,
                description: req.description,
                location: req.location,
                starts_at: req.starts_at,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes an event and its registrations; admins only
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<EventId>,
) -> ApiResult<StatusCode> {
    let event = find_event(&state, event_id).await?;

    state
        .guard
        .require_role(&identity, event.organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can delete events"))?;

    state.store.delete_event(event_id).await?;

    tracing::info!(event_id, user_id = identity.user_id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Lists who registered for an event, newest first; admins only
pub async fn list_registrations(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<EventId>,
    Query(params): Query<RegistrationListParams>,
) -> ApiResult<Json<Vec<Registration>>> {
    let (offset, limit) = paging::resolve(params.skip, params.limit)?;
    let event = find_event(&state, event_id).await?;

    state
        .guard
        .require_role(&identity, event.organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can view registrations"))?;

    let registrations = state
        .store
        .list_registrations(&RegistrationQuery {
            event_id: Some(event_id),
            limit,
            offset,
            ..Default::default()
        })
        .await?;

    Ok(Json(registrations))
}

/// Registers a member for an event
///
/// # Errors
///
/// - `403 Forbidden`: registering someone else without being admin, or the
///   user is not a member of the organization
/// - `404 Not Found`: unknown event or user
/// - `409 Conflict`: already registered
pub async fn register(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<EventId>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    let event = find_event(&state, event_id).await?;

    state
        .guard
        .require_self_or_role(&identity, req.user_id, event.organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can register other users"))?;

    state
        .store
        .find_by_id(req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if state
        .store
        .get_role(req.user_id, event.organization_id)
        .await?
        .is_none()
    {
        return Err(ApiError::Forbidden(
            "Only organization members can register for its events".to_string(),
        ));
    }

    let registration = state
        .store
        .insert_registration(req.user_id, event_id)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::Conflict("Registration already exists".to_string()),
            other => other.into(),
        })?;

    tracing::info!(
        event_id,
        user_id = req.user_id,
        registered_by = identity.user_id,
        "Registered for event"
    );

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Cancels a registration; admins, or the registrant themself
pub async fn unregister(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((event_id, user_id)): Path<(EventId, UserId)>,
) -> ApiResult<Json<Registration>> {
    let event = find_event(&state, event_id).await?;

    state
        .guard
        .require_self_or_role(&identity, user_id, event.organization_id, ADMIN)
        .await
        .map_err(forbidden("Only organization admins can cancel other registrations"))?;

    let registration = state
        .store
        .delete_registration(user_id, event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

    tracing::info!(event_id, user_id, removed_by = identity.user_id, "Registration cancelled");
    Ok(Json(registration))
}
