mod common;

use axum::http::{StatusCode, header};
use common::{TestApp, delete, get, json, send, spawn_app};
use serde_json::json as body;

async fn add_member(app: &TestApp, name: &str, role: &str, year: &str) -> StatusCode {
    send(
        app,
        json(
            "POST",
            "/api/roster/members",
            body!({
                "name": name,
                "email": format!("{name}@example.com"),
                "role": role,
                "department": "CSE",
                "profileLink": format!("https://example.com/{name}"),
                "yearRange": year,
                "image": "data:image/png;base64,iVBORw0KGgo=",
            }),
        ),
    )
    .await
    .status
}

#[tokio::test]
async fn test_year_ranges_newest_first() {
    let app = spawn_app().await;

    let res = send(&app, get("/api/roster/year-ranges")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["yearRanges"], body!([]));
    assert!(res.body["defaultRange"].is_null());

    for year in ["2022-2023", "2023-2024", "2021-2022", "2023-2024"] {
        assert_eq!(add_member(&app, "m", "Member", year).await, StatusCode::CREATED);
    }

    let res = send(&app, get("/api/roster/year-ranges")).await;
    assert_eq!(
        res.body["yearRanges"],
        body!(["2023-2024", "2022-2023", "2021-2022"])
    );
    assert_eq!(res.body["defaultRange"], "2023-2024");
}

#[tokio::test]
async fn test_members_ordered_by_rank() {
    let app = spawn_app().await;

    add_member(&app, "zed", "Volunteer", "2023-2024").await;
    add_member(&app, "mia", "Member", "2023-2024").await;
    add_member(&app, "ana", "President", "2023-2024").await;
    add_member(&app, "ben", "Member", "2023-2024").await;
    add_member(&app, "old", "President", "2022-2023").await;

    let res = send(&app, get("/api/roster/members?yearRange=2023-2024")).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["yearRange"], "2023-2024");
    assert_eq!(res.body["hidden"], false);
    assert_eq!(res.body["showToggleDelete"], true);

    let names: Vec<&str> = res.body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ana", "mia", "ben", "zed"]);
    assert_eq!(res.body["users"][0]["rank"], 1);
    assert!(res.body["users"][3]["rank"].is_null());
    assert_eq!(res.body["users"][0]["imageUrl"], "https://img.test/3.png");
}

#[tokio::test]
async fn test_members_query_validation() {
    let app = spawn_app().await;

    let res = send(&app, get("/api/roster/members")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, get("/api/roster/members?yearRange=2023")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, get("/api/roster/members?yearRange=2019-2020")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_year_is_not_persisted() {
    let app = spawn_app().await;

    assert_eq!(
        add_member(&app, "bad", "Member", "2023").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(app.images.uploads(), 0);

    let res = send(&app, get("/api/roster/year-ranges")).await;
    assert_eq!(res.body["yearRanges"], body!([]));
}

#[tokio::test]
async fn test_member_requires_fields() {
    let app = spawn_app().await;

    let res = send(
        &app,
        json(
            "POST",
            "/api/roster/members",
            body!({ "name": "x", "yearRange": "2023-2024" }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.images.uploads(), 0);
}

#[tokio::test]
async fn test_delete_member() {
    let app = spawn_app().await;
    add_member(&app, "kim", "Member", "2023-2024").await;

    let res = send(&app, get("/api/roster/members?yearRange=2023-2024")).await;
    let id = res.body["users"][0]["id"].as_i64().unwrap();

    let res = send(&app, delete(&format!("/api/roster/members/{id}"))).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&app, delete(&format!("/api/roster/members/{id}"))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(&app, get("/api/roster/members?yearRange=2023-2024")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_year_visibility() {
    let app = spawn_app().await;
    add_member(&app, "lee", "Member", "2022-2023").await;

    let res = send(
        &app,
        json(
            "POST",
            "/api/roster/year-visibility",
            body!({ "yearRange": "2022-2023", "hidden": true }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&app, get("/api/roster/members?yearRange=2022-2023")).await;
    assert_eq!(res.body["hidden"], true);
    assert_eq!(res.body["showToggleDelete"], true);

    let res = send(&app, get("/api/roster/hidden-years")).await;
    assert_eq!(
        res.body["hiddenYears"],
        body!([{ "yearRange": "2022-2023", "showToggleDelete": true }])
    );

    let res = send(
        &app,
        json(
            "POST",
            "/api/roster/toggle-delete",
            body!({ "yearRange": "2022-2023" }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&app, get("/api/roster/members?yearRange=2022-2023")).await;
    assert_eq!(res.body["showToggleDelete"], false);

    let res = send(
        &app,
        json(
            "POST",
            "/api/roster/year-visibility",
            body!({ "yearRange": "2022-2023", "hidden": false }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&app, get("/api/roster/hidden-years")).await;
    assert_eq!(res.body["hiddenYears"], body!([]));

    let res = send(
        &app,
        json(
            "POST",
            "/api/roster/year-visibility",
            body!({ "yearRange": "22-23", "hidden": true }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_role_ranks() {
    let app = spawn_app().await;

    let res = send(&app, get("/api/roster/role-ranks")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["roles"][0], body!({ "roleName": "President", "rank": 1 }));

    let res = send(
        &app,
        json(
            "POST",
            "/api/roster/role-ranks",
            body!({ "roleName": "Mentor", "rank": 0 }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);

    let res = send(&app, get("/api/roster/role-ranks")).await;
    assert_eq!(res.body["roles"][0]["roleName"], "Mentor");

    let res = send(
        &app,
        json(
            "POST",
            "/api/roster/role-ranks",
            body!({ "roleName": "Mentor", "rank": 7 }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_events_crud() {
    let app = spawn_app().await;

    let res = send(&app, get("/api/events")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(
        &app,
        json(
            "POST",
            "/api/events",
            body!({
                "eventName": "Rust Meetup",
                "description": "Ownership in practice",
                "eventTime": "2026-11-02T17:00:00Z",
                "eventSpeaker": "Sam",
                "eventLocation": "Lab 3",
                "image": "iVBORw0KGgo=",
            }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let id = res.body["event"]["id"].as_i64().unwrap();
    assert_eq!(res.body["event"]["imageUrl"], "https://img.test/1.png");

    let res = send(
        &app,
        json(
            "PUT",
            &format!("/api/events/{id}"),
            body!({ "eventLocation": "Auditorium" }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["event"]["eventLocation"], "Auditorium");
    assert_eq!(res.body["event"]["eventName"], "Rust Meetup");

    let res = send(
        &app,
        json(
            "PUT",
            &format!("/api/events/{id}"),
            body!({ "eventTime": "next tuesday" }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, get("/api/events")).await;
    assert_eq!(res.body["events"].as_array().unwrap().len(), 1);

    let res = send(&app, delete(&format!("/api/events/{id}"))).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&app, get(&format!("/api/events/{id}"))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_requires_fields() {
    let app = spawn_app().await;

    let res = send(
        &app,
        json("POST", "/api/events", body!({ "eventName": "Half an event" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.images.uploads(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let app = spawn_app().await;

    let cases = [
        ("/api/roster/year-visibility", body!({ "hidden": true })),
        ("/api/roster/toggle-delete", body!({})),
        (
            "/api/roster/role-ranks",
            body!({ "roleName": "Mentor", "rank": "high" }),
        ),
        ("/api/events", body!({ "eventName": 7 })),
        ("/api/contact", body!({ "name": ["x"] })),
    ];
    for (uri, payload) in cases {
        let res = send(&app, json("POST", uri, payload)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(res.body["success"], false, "{uri}");
        assert!(res.body["message"].is_string(), "{uri}");
    }

    let res = send(&app, get("/api/roster/hidden-years")).await;
    assert_eq!(res.body["hiddenYears"], body!([]));
}

#[tokio::test]
async fn test_gallery() {
    let app = spawn_app().await;

    let res = send(
        &app,
        json(
            "POST",
            "/api/gallery",
            body!({ "image": "iVBORw0KGgo=", "contentType": "image/png" }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);

    let res = send(&app, get("/api/gallery")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.headers.get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=31536000"
    );
    assert_eq!(res.body["images"][0]["url"], "https://img.test/1.png");
    assert_eq!(res.body["images"][0]["contentType"], "image/png");
}

#[tokio::test]
async fn test_contact_relay() {
    let app = spawn_app().await;

    let res = send(
        &app,
        json(
            "POST",
            "/api/contact",
            body!({ "name": "Visitor", "email": "visitor@example.com", "message": "Hello!" }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::ACCEPTED);

    let sent = app.outbox.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "admin@clubdesk.local");
    assert_eq!(sent[0].reply_to.as_deref(), Some("visitor@example.com"));
    assert!(sent[0].body.contains("Hello!"));

    let res = send(
        &app,
        json("POST", "/api/contact", body!({ "name": "Visitor", "message": "Hi" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_headers() {
    let app = spawn_app().await;

    let res = send(&app, get("/api/health")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["database"], true);
    assert_eq!(
        res.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
