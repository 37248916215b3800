//! HTTP-level tests against the full route table and the in-memory store.

use crate::application::{AuthService, PostService};
use crate::data::post_repository::InMemoryPostRepository;
use crate::data::token_denylist::InMemoryTokenDenylist;
use crate::data::user_repository::InMemoryUserRepository;
use crate::infrastructure::jwt::JwtService;
use crate::presentation::routes;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::Arc;

macro_rules! init_app {
    () => {{
        let jwt = Arc::new(
            JwtService::new("0123456789abcdef0123456789abcdef", Duration::minutes(60))
                .unwrap(),
        );
        let auth = Arc::new(AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryTokenDenylist::new()),
            jwt,
        ));
        let posts = Arc::new(PostService::new(Arc::new(InMemoryPostRepository::new())));
        test::init_service(
            App::new()
                .app_data(web::Data::new(auth))
                .app_data(web::Data::new(posts))
                .configure(routes::configure),
        )
        .await
    }};
}

/// Sends a request and returns the status line together with the decoded
/// envelope.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Registers the smoke-test user and returns a fresh bearer token.
macro_rules! login_token {
    ($app:expr) => {{
        let (status, _) = send!(
            $app,
            test::TestRequest::post().uri("/api/register").set_json(json!({
                "name": "ammar",
                "email": "ammar@gmail.com",
                "password": "maro123"
            }))
        );
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send!(
            $app,
            test::TestRequest::post().uri("/api/login").set_json(json!({
                "email": "ammar@gmail.com",
                "password": "maro123"
            }))
        );
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
async fn empty_list_is_ok() {
    let app = init_app!();
    let (status, body) = send!(app, test::TestRequest::get().uri("/api/post"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": [], "message": "ok", "status": 200 }));
}

#[actix_web::test]
async fn mutating_routes_require_a_token() {
    let app = init_app!();

    let requests = [
        test::TestRequest::post()
            .uri("/api/post")
            .set_json(json!({ "title": "t", "description": "d" })),
        test::TestRequest::patch()
            .uri("/api/updatePost/1")
            .set_json(json!({ "title": "t", "description": "d" })),
        test::TestRequest::post().uri("/api/deletePost/1"),
        test::TestRequest::get().uri("/api/user-profile"),
        test::TestRequest::post().uri("/api/refresh"),
        test::TestRequest::post().uri("/api/logout"),
    ];

    for req in requests {
        let (status, body) = send!(app, req);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);
        assert_eq!(body["data"], Value::Null);
    }
}

#[actix_web::test]
async fn garbage_token_is_rejected() {
    let app = init_app!();
    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/user-profile")
            .insert_header(bearer("not.a.jwt"))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[actix_web::test]
async fn post_lifecycle() {
    let app = init_app!();
    let token = login_token!(app);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/post")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "First", "description": "Hello" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "created successfully");
    assert_eq!(body["data"]["title"], "First");
    assert!(body["data"].get("created_at").is_none());
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/post/{}", id))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "id": id, "title": "First", "description": "Hello" })
    );

    let (status, body) = send!(
        app,
        test::TestRequest::patch()
            .uri(&format!("/api/updatePost/{}", id))
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Renamed", "description": "Changed" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "updated successfully");
    assert_eq!(body["data"]["title"], "Renamed");
    assert!(body["data"].get("updated_at").is_some());

    let (_, body) = send!(app, test::TestRequest::get().uri("/api/post"));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["description"], "Changed");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/deletePost/{}", id))
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "deleted successfully");
    assert_eq!(body["data"]["title"], "Renamed");

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/post/{}", id))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");
}

#[actix_web::test]
async fn validation_failures_answer_404_with_field_map() {
    let app = init_app!();
    let token = login_token!(app);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/post")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "a".repeat(256) }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "data": null,
            "message": {
                "title": ["The title field must not be greater than 255 characters."],
                "description": ["The description field is required."]
            },
            "status": 404
        })
    );
}

#[actix_web::test]
async fn missing_body_reports_required_fields() {
    let app = init_app!();
    let token = login_token!(app);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/post")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"]["title"].is_array());
    assert!(body["message"]["description"].is_array());
}

#[actix_web::test]
async fn duplicate_title_is_rejected_and_store_unchanged() {
    let app = init_app!();
    let token = login_token!(app);

    for expected in [StatusCode::OK, StatusCode::NOT_FOUND] {
        let (status, _) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/post")
                .insert_header(bearer(&token))
                .set_json(json!({ "title": "Same", "description": "d" }))
        );
        assert_eq!(status, expected);
    }

    let (_, body) = send!(app, test::TestRequest::get().uri("/api/post"));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let app = init_app!();
    let token = login_token!(app);

    let (status, _) = send!(app, test::TestRequest::get().uri("/api/post/999"));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send!(app, test::TestRequest::get().uri("/api/post/abc"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");

    let (status, body) = send!(
        app,
        test::TestRequest::patch()
            .uri("/api/updatePost/999")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "t", "description": "d" }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/deletePost/999")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn register_login_profile_logout() {
    let app = init_app!();

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/api/register").set_json(json!({
            "name": "ammar",
            "email": "ammar@gmail.com",
            "password": "maro123"
        }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);
    assert_eq!(body["data"]["email"], "ammar@gmail.com");
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("token").is_none());

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/api/login").set_json(json!({
            "email": "ammar@gmail.com",
            "password": "maro123"
        }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "bearer");
    assert_eq!(body["data"]["expires_in"], 3600);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/user-profile")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "ammar");
    assert_eq!(body["data"]["email"], "ammar@gmail.com");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/logout")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User successfully signed out");

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/user-profile")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[actix_web::test]
async fn refresh_hands_out_a_new_token_and_retires_the_old_one() {
    let app = init_app!();
    let old = login_token!(app);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/refresh")
            .insert_header(bearer(&old))
    );
    assert_eq!(status, StatusCode::OK);
    let new = body["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(new, old);

    let (status, _) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/user-profile")
            .insert_header(bearer(&old))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/user-profile")
            .insert_header(bearer(&new))
    );
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn bad_credentials_are_401() {
    let app = init_app!();
    let _ = login_token!(app);

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/api/login").set_json(json!({
            "email": "ammar@gmail.com",
            "password": "wrong-password"
        }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[actix_web::test]
async fn register_validation_uses_the_same_convention() {
    let app = init_app!();
    let _ = login_token!(app);

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/api/register").set_json(json!({
            "name": "other",
            "email": "ammar@gmail.com",
            "password": "12"
        }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"]["email"],
        json!(["The email has already been taken."])
    );
    assert_eq!(
        body["message"]["password"],
        json!(["The password field must be at least 6 characters."])
    );
}

#[actix_web::test]
async fn unknown_routes_get_an_envelope() {
    let app = init_app!();
    let (status, body) = send!(app, test::TestRequest::get().uri("/api/nope"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not found");
}

#[actix_web::test]
async fn unsupported_methods_get_an_envelope() {
    let app = init_app!();

    let requests = [
        test::TestRequest::delete().uri("/api/post/1"),
        test::TestRequest::get().uri("/api/register"),
        test::TestRequest::put().uri("/api/login"),
    ];

    for req in requests {
        let (status, body) = send!(app, req);
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body,
            json!({ "data": null, "message": "Method not allowed", "status": 405 })
        );
    }

    let token = login_token!(app);
    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/logout")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], 405);
}

#[actix_web::test]
async fn malformed_and_unknown_update_ids_share_one_gate() {
    let app = init_app!();
    let token = login_token!(app);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/post")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Taken", "description": "d" }))
    );
    assert_eq!(status, StatusCode::OK);

    let mut bodies = Vec::new();
    for id in ["999", "abc"] {
        let (status, body) = send!(
            app,
            test::TestRequest::patch()
                .uri(&format!("/api/updatePost/{}", id))
                .insert_header(bearer(&token))
                .set_json(json!({ "title": "Taken", "description": "d" }))
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        bodies.push(body);
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(
        bodies[1]["message"]["title"],
        json!(["The title has already been taken."])
    );

    let (status, body) = send!(
        app,
        test::TestRequest::patch()
            .uri("/api/updatePost/abc")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Fresh", "description": "d" }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");
}
