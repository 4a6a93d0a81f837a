/// Integration tests for event and registration endpoints
///
/// Events are public to read and admin-only to change. Members register
/// themselves; admins may register or remove anyone in their organization.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_create_event_admin_only() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner@example.com").await;
    let (vol_id, volunteer) = ctx.register("vol@example.com").await;
    let org_id = ctx.create_organization(&owner, "Food Bank").await;
    ctx.join(&volunteer, org_id, vol_id).await;

    let body = json!({
        "organization_id": org_id,
        "name": "Saturday sort",
        "starts_at": "2026-06-06T09:00:00Z",
    });

    let anonymous = ctx.json(Method::POST, "/api/events", None, body.clone()).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let by_volunteer = ctx
        .json(Method::POST, "/api/events", Some(&volunteer), body.clone())
        .await;
    assert_eq!(by_volunteer.status, StatusCode::FORBIDDEN);
    assert_eq!(
        by_volunteer.body["message"],
        "Only organization admins can create events"
    );

    let created = ctx.json(Method::POST, "/api/events", Some(&owner), body).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["organization_id"], org_id);
    assert_eq!(created.body["name"], "Saturday sort");
    assert_eq!(created.body["starts_at"], "2026-06-06T09:00:00Z");
    assert!(created.body["location"].is_null());
}

#[tokio::test]
async fn test_create_event_validation() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner@example.com").await;
    let org_id = ctx.create_organization(&owner, "Food Bank").await;

    let empty_name = ctx
        .json(
            Method::POST,
            "/api/events",
            Some(&owner),
            json!({ "organization_id": org_id, "name": "", "starts_at": "2026-06-06T09:00:00Z" }),
        )
        .await;
    assert_eq!(empty_name.status, StatusCode::UNPROCESSABLE_ENTITY);

    let unknown_org = ctx
        .json(
            Method::POST,
            "/api/events",
            Some(&owner),
            json!({ "organization_id": 9999, "name": "Drive", "starts_at": "2026-06-06T09:00:00Z" }),
        )
        .await;
    assert_eq!(unknown_org.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_org.body["message"], "Organization not found");
}

#[tokio::test]
async fn test_events_are_public_to_read() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner@example.com").await;
    let food = ctx.create_organization(&owner, "Food Bank").await;
    let shelter = ctx.create_organization(&owner, "Shelter").await;

    let first = ctx.create_event(&owner, food, "Saturday sort").await;
    ctx.create_event(&owner, food, "Sunday sort").await;
    ctx.create_event(&owner, shelter, "Bed count").await;

    let all = ctx.empty(Method::GET, "/api/events", None).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body.as_array().unwrap().len(), 3);

    let filtered = ctx
        .empty(Method::GET, &format!("/api/events?organization_id={}", food), None)
        .await;
    let names: Vec<&str> = filtered
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Saturday sort", "Sunday sort"]);

    let paged = ctx.empty(Method::GET, "/api/events?skip=2&limit=5", None).await;
    assert_eq!(paged.body.as_array().unwrap().len(), 1);
    assert_eq!(paged.body[0]["name"], "Bed count");

    let bad_limit = ctx.empty(Method::GET, "/api/events?limit=0", None).await;
    assert_eq!(bad_limit.status, StatusCode::BAD_REQUEST);

    let one = ctx.empty(Method::GET, &format!("/api/events/{}", first), None).await;
    assert_eq!(one.status, StatusCode::OK);
    assert_eq!(one.body["location"], "Community hall");

    let missing = ctx.empty(Method::GET, "/api/events/9999", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Event not found");
}

#[tokio::test]
async fn test_update_and_delete_event_admin_only() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner@example.com").await;
    let (vol_id, volunteer) = ctx.register("vol@example.com").await;
    let org_id = ctx.create_organization(&owner, "Food Bank").await;
    ctx.join(&volunteer, org_id, vol_id).await;
    let event_id = ctx.create_event(&owner, org_id, "Saturday sort").await;
    let uri = format!("/api/events/{}", event_id);

    let denied = ctx
        .json(Method::PUT, &uri, Some(&volunteer), json!({ "name": "Renamed" }))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let updated = ctx
        .json(
            Method::PUT,
            &uri,
            Some(&owner),
            json!({ "name": "Renamed", "starts_at": "2026-07-01T10:30:00Z" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "Renamed");
    assert_eq!(updated.body["location"], "Community hall");
    assert_eq!(updated.body["starts_at"], "2026-07-01T10:30:00Z");

    let not_deleted = ctx.empty(Method::DELETE, &uri, Some(&volunteer)).await;
    assert_eq!(not_deleted.status, StatusCode::FORBIDDEN);

    let deleted = ctx.empty(Method::DELETE, &uri, Some(&owner)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = ctx.empty(Method::GET, &uri, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_rules() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner@example.com").await;
    let (vol_id, volunteer) = ctx.register("vol@example.com").await;
    let (other_id, other) = ctx.register("other@example.com").await;
    let (outsider_id, outsider) = ctx.register("out@example.com").await;
    let org_id = ctx.create_organization(&owner, "Food Bank").await;
    ctx.join(&volunteer, org_id, vol_id).await;
    ctx.join(&other, org_id, other_id).await;
    let event_id = ctx.create_event(&owner, org_id, "Saturday sort").await;
    let uri = format!("/api/events/{}/registrations", event_id);

    let anonymous = ctx.json(Method::POST, &uri, None, json!({ "user_id": vol_id })).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let non_member = ctx
        .json(Method::POST, &uri, Some(&outsider), json!({ "user_id": outsider_id }))
        .await;
    assert_eq!(non_member.status, StatusCode::FORBIDDEN);
    assert_eq!(
        non_member.body["message"],
        "Only organization members can register for its events"
    );

    let someone_else = ctx
        .json(Method::POST, &uri, Some(&volunteer), json!({ "user_id": other_id }))
        .await;
    assert_eq!(someone_else.status, StatusCode::FORBIDDEN);
    assert_eq!(
        someone_else.body["message"],
        "Only organization admins can register other users"
    );

    let own = ctx
        .json(Method::POST, &uri, Some(&volunteer), json!({ "user_id": vol_id }))
        .await;
    assert_eq!(own.status, StatusCode::CREATED);
    assert_eq!(own.body["user_id"], vol_id);
    assert_eq!(own.body["event_id"], event_id);
    assert_eq!(own.body["organization_id"], org_id);

    let duplicate = ctx
        .json(Method::POST, &uri, Some(&volunteer), json!({ "user_id": vol_id }))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["message"], "Registration already exists");

    let by_admin = ctx
        .json(Method::POST, &uri, Some(&owner), json!({ "user_id": other_id }))
        .await;
    assert_eq!(by_admin.status, StatusCode::CREATED);

    let unknown_user = ctx
        .json(Method::POST, &uri, Some(&owner), json!({ "user_id": 9999 }))
        .await;
    assert_eq!(unknown_user.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_user.body["message"], "User not found");

    let unknown_event = ctx
        .json(
            Method::POST,
            "/api/events/9999/registrations",
            Some(&volunteer),
            json!({ "user_id": vol_id }),
        )
        .await;
    assert_eq!(unknown_event.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_registrations() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner@example.com").await;
    let (vol_id, volunteer) = ctx.register("vol@example.com").await;
    let org_id = ctx.create_organization(&owner, "Food Bank").await;
    ctx.join(&volunteer, org_id, vol_id).await;
    let saturday = ctx.create_event(&owner, org_id, "Saturday sort").await;
    let sunday = ctx.create_event(&owner, org_id, "Sunday sort").await;

    for event_id in [saturday, sunday] {
        let registered = ctx
            .json(
                Method::POST,
                &format!("/api/events/{}/registrations", event_id),
                Some(&volunteer),
                json!({ "user_id": vol_id }),
            )
            .await;
        assert_eq!(registered.status, StatusCode::CREATED);
    }

    let uri = format!("/api/events/{}/registrations", saturday);
    let denied = ctx.empty(Method::GET, &uri, Some(&volunteer)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(
        denied.body["message"],
        "Only organization admins can view registrations"
    );

    let listed = ctx.empty(Method::GET, &uri, Some(&owner)).await;
    assert_eq!(listed.status, StatusCode::OK);
    let rows = listed.body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_id"], vol_id);

    let mine = ctx
        .empty(Method::GET, "/api/users/me/registrations", Some(&volunteer))
        .await;
    assert_eq!(mine.status, StatusCode::OK);
    let mut events: Vec<i64> = mine
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["event_id"].as_i64().unwrap())
        .collect();
    events.sort_unstable();
    assert_eq!(events, vec![saturday, sunday]);

    let owner_has_none = ctx
        .empty(Method::GET, "/api/users/me/registrations", Some(&owner))
        .await;
    assert_eq!(owner_has_none.body, json!([]));
}

#[tokio::test]
async fn test_unregister_rules() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner@example.com").await;
    let (vol_id, volunteer) = ctx.register("vol@example.com").await;
    let (other_id, other) = ctx.register("other@example.com").await;
    let org_id = ctx.create_organization(&owner, "Food Bank").await;
    ctx.join(&volunteer, org_id, vol_id).await;
    ctx.join(&other, org_id, other_id).await;
    let event_id = ctx.create_event(&owner, org_id, "Saturday sort").await;
    let uri = format!("/api/events/{}/registrations", event_id);

    for (token, user_id) in [(&volunteer, vol_id), (&other, other_id)] {
        let registered = ctx
            .json(Method::POST, &uri, Some(token), json!({ "user_id": user_id }))
            .await;
        assert_eq!(registered.status, StatusCode::CREATED);
    }

    let vol_uri = format!("{}/{}", uri, vol_id);
    let by_peer = ctx.empty(Method::DELETE, &vol_uri, Some(&other)).await;
    assert_eq!(by_peer.status, StatusCode::FORBIDDEN);

    let by_self = ctx.empty(Method::DELETE, &vol_uri, Some(&volunteer)).await;
    assert_eq!(by_self.status, StatusCode::OK);
    assert_eq!(by_self.body["user_id"], vol_id);

    let again = ctx.empty(Method::DELETE, &vol_uri, Some(&volunteer)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.body["message"], "Registration not found");

    let by_admin = ctx
        .empty(Method::DELETE, &format!("{}/{}", uri, other_id), Some(&owner))
        .await;
    assert_eq!(by_admin.status, StatusCode::OK);

    let listed = ctx.empty(Method::GET, &uri, Some(&owner)).await;
    assert_eq!(listed.body, json!([]));
}

#[tokio::test]
async fn test_deleting_organization_removes_its_events() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner@example.com").await;
    let (vol_id, volunteer) = ctx.register("vol@example.com").await;
    let org_id = ctx.create_organization(&owner, "Food Bank").await;
    ctx.join(&volunteer, org_id, vol_id).await;
    let event_id = ctx.create_event(&owner, org_id, "Saturday sort").await;

    let registered = ctx
        .json(
            Method::POST,
            &format!("/api/events/{}/registrations", event_id),
            Some(&volunteer),
            json!({ "user_id": vol_id }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);

    let deleted = ctx
        .empty(Method::DELETE, &format!("/api/organization/{}", org_id), Some(&owner))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let event = ctx
        .empty(Method::GET, &format!("/api/events/{}", event_id), None)
        .await;
    assert_eq!(event.status, StatusCode::NOT_FOUND);

    let mine = ctx
        .empty(Method::GET, "/api/users/me/registrations", Some(&volunteer))
        .await;
    assert_eq!(mine.body, json!([]));
}
