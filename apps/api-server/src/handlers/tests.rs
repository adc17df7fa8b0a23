use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use postboard_core::domain::{NewPost, NewUser, Post};
use postboard_core::ports::{PostRepository, TokenService, UserRepository};
use postboard_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtConfig,
    JwtTokenService,
};

use super::configure_routes;
use crate::state::{AppState, Storage};

struct Fixture {
    state: AppState,
    posts: Arc<InMemoryPostRepository>,
    alice: String,
    bob: String,
}

/// In-memory state with two users: alice (id 1) and bob (id 2).
async fn fixture() -> Fixture {
    let tokens = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "handler-test-secret".to_string(),
        ..JwtConfig::default()
    }));
    let posts = Arc::new(InMemoryPostRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());

    users
        .create(NewUser::new("alice".to_string(), "unused".to_string()))
        .await
        .unwrap();
    users
        .create(NewUser::new("bob".to_string(), "unused".to_string()))
        .await
        .unwrap();

    let alice = tokens.generate_token(1, "alice").unwrap();
    let bob = tokens.generate_token(2, "bob").unwrap();

    let state = AppState::from_parts(
        posts.clone(),
        users,
        tokens,
        Arc::new(Argon2PasswordService::new()),
        Storage::Memory,
    );

    Fixture {
        state,
        posts,
        alice,
        bob,
    }
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Seed a post directly with a fixed age so listing order is deterministic.
async fn seed(f: &Fixture, content: &str, user_id: i32, minutes_ago: i64) -> Post {
    let mut post = Post::new(
        NewPost {
            content: content.to_string(),
        },
        user_id,
    );
    post.timestamp = Utc::now() - Duration::minutes(minutes_ago);
    f.posts.insert(post).await.unwrap()
}

fn contents(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap().to_string())
        .collect()
}

fn assert_no_author(post: &Value) {
    assert!(post.get("userId").is_none(), "{post}");
    assert!(post.get("user_id").is_none(), "{post}");
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_create_get_search_delete_scenario() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(bearer(&f.alice))
        .set_json(json!({"content": "hello world"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_no_author(&created);
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched["content"], "hello world");
    assert_no_author(&fetched);

    let req = test::TestRequest::get()
        .uri("/posts?search=hello")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(contents(&body), vec!["hello world"]);
    assert_eq!(body["search"], "hello");

    let req = test::TestRequest::get().uri("/posts?search=xyz").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(contents(&body).is_empty());

    let req = test::TestRequest::delete()
        .uri(&format!("/posts/{id}"))
        .insert_header(bearer(&f.bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/posts/{id}"))
        .insert_header(bearer(&f.alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({"statusCode": 200, "message": "Post deleted successfully"})
    );

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_list_orders_newest_first_and_paginates() {
    let f = fixture().await;
    seed(&f, "oldest", 1, 30).await;
    seed(&f, "middle", 2, 20).await;
    seed(&f, "newest", 1, 10).await;
    let app = app!(f.state);

    let req = test::TestRequest::get().uri("/posts").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(contents(&body), vec!["newest", "middle", "oldest"]);
    assert_eq!(body["pagination"], json!({"limit": 10, "offset": 0}));
    assert!(body.get("filter").is_none());
    assert!(body.get("search").is_none());
    for post in body["data"].as_array().unwrap() {
        assert_no_author(post);
    }

    let req = test::TestRequest::get()
        .uri("/posts?limit=1&offset=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(contents(&body), vec!["middle"]);
    assert_eq!(body["pagination"], json!({"limit": 1, "offset": 1}));
}

#[actix_web::test]
async fn test_list_filters_by_username_and_search() {
    let f = fixture().await;
    seed(&f, "Rust by alice", 1, 30).await;
    seed(&f, "rust by bob", 2, 20).await;
    seed(&f, "Go by alice", 1, 10).await;
    let app = app!(f.state);

    let req = test::TestRequest::get()
        .uri("/posts?username=alice")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(contents(&body), vec!["Go by alice", "Rust by alice"]);
    assert_eq!(body["filter"], "alice");

    let req = test::TestRequest::get()
        .uri("/posts?username=alice&search=RUST")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(contents(&body), vec!["Rust by alice"]);

    let req = test::TestRequest::get()
        .uri("/posts?username=nobody")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "User with username nobody not found");
}

#[actix_web::test]
async fn test_list_rejects_negative_limit() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::get().uri("/posts?limit=-1").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_list_limit_beyond_bigint() {
    let f = fixture().await;
    seed(&f, "only post", 1, 1).await;
    let app = app!(f.state);

    let req = test::TestRequest::get()
        .uri("/posts?limit=9223372036854775808")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/posts?offset=18446744073709551615")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/posts?limit=9223372036854775807")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["limit"], 9223372036854775807u64);
    assert_eq!(contents(&body), vec!["only post"]);
}

#[actix_web::test]
async fn test_create_requires_auth_and_ignores_body_author() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::post()
        .uri("/posts")
        .set_json(json!({"content": "anonymous"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .set_json(json!({"content": "forged"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(bearer(&f.bob))
        .set_json(json!({"content": "mine", "userId": 1, "user_id": 1}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let stored = f
        .state
        .posts
        .find_one(created["id"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.user_id, 2);
}

#[actix_web::test]
async fn test_create_validates_body() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(bearer(&f.alice))
        .set_json(json!({"content": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"], json!(["content must not be empty"]));

    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(bearer(&f.alice))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_update_is_owner_only() {
    let f = fixture().await;
    let post = seed(&f, "original", 1, 5).await;
    let app = app!(f.state);

    let req = test::TestRequest::patch()
        .uri(&format!("/posts/{}", post.id))
        .insert_header(bearer(&f.bob))
        .set_json(json!({"content": "hijacked"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let unchanged = f.state.posts.find_one(&post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.content, "original");

    let req = test::TestRequest::patch()
        .uri(&format!("/posts/{}", post.id))
        .set_json(json!({"content": "anonymous"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::patch()
        .uri(&format!("/posts/{}", post.id))
        .insert_header(bearer(&f.alice))
        .set_json(json!({"content": "edited"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["content"], "edited");
    assert_eq!(body["id"], post.id.as_str());
    assert_no_author(&body);

    // Empty patch leaves content alone
    let req = test::TestRequest::patch()
        .uri(&format!("/posts/{}", post.id))
        .insert_header(bearer(&f.alice))
        .set_json(json!({}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["content"], "edited");
}

#[actix_web::test]
async fn test_missing_post_is_not_found() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::get().uri("/posts/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Post with ID missing not found");

    let req = test::TestRequest::patch()
        .uri("/posts/missing")
        .insert_header(bearer(&f.alice))
        .set_json(json!({"content": "x"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri("/posts/missing")
        .insert_header(bearer(&f.alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_register_login_me() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"username": "carol", "password": "sup3r-secret"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"username": "carol", "password": "another-secret"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"username": "carol", "password": "wrong-password"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"username": "carol", "password": "sup3r-secret"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "carol");
    assert_eq!(body["id"], 3);
    assert!(body.get("password_hash").is_none());
}

#[actix_web::test]
async fn test_register_validates_input() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"username": "x", "password": "short"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_health() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}
