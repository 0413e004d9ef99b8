//! End-to-end tests: the full router against an in-memory database

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use rating_server::{AppState, Config, DbService, create_router};
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@example.com";
const PASSWORD: &str = "Secret#12";

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(Config {
            login_rate_limit: 0,
            register_rate_limit: 0,
            bootstrap_admin_email: Some(ADMIN_EMAIL.to_string()),
            bootstrap_admin_password: Some(PASSWORD.to_string()),
            ..Config::default()
        })
        .await
    }

    async fn with_config(config: Config) -> Self {
        let db = DbService::in_memory().await.unwrap();
        let state = AppState::with_pool(db.pool, config);
        state.ensure_bootstrap_admin().await.unwrap();
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Self-register a `user` and return (id, token)
    async fn register(&self, name: &str, email: &str) -> (i64, String) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": PASSWORD, "address": "12 Long Road" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self
            .post(
                "/api/auth/admin/login",
                None,
                json!({ "email": ADMIN_EMAIL, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Admin-created store owner; returns (id, token)
    async fn create_owner(&self, admin: &str, name: &str, email: &str) -> (i64, String) {
        let (status, body) = self
            .post(
                "/api/admin/users",
                Some(admin),
                json!({
                    "name": name,
                    "email": email,
                    "password": PASSWORD,
                    "address": "1 Owner Street",
                    "role": "store_owner"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["user"]["id"].as_i64().unwrap();
        (id, self.login(email).await)
    }

    async fn create_store(&self, admin: &str, name: &str, email: &str, owner_id: Option<i64>) -> i64 {
        let (status, body) = self
            .post(
                "/api/admin/stores",
                Some(admin),
                json!({ "name": name, "email": email, "address": "42 Market Square", "owner_id": owner_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["store"]["id"].as_i64().unwrap()
    }

    async fn rate(&self, token: &str, store_id: i64, rating: i64) -> (StatusCode, Value) {
        self.post(
            &format!("/api/user/stores/{store_id}/rating"),
            Some(token),
            json!({ "rating": rating }),
        )
        .await
    }

    async fn rating_rows(&self, store_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM ratings WHERE store_id = ?")
            .bind(store_id)
            .fetch_one(&self.state.pool)
            .await
            .unwrap()
    }
}

const ALICE: &str = "Alice Wonderland Testuser";
const BOB: &str = "Bob Builder Of Many Things";
const CAROL: &str = "Carol Singer Of The Choir";
const OLIVER: &str = "Oliver Owner Of The Corner";
const STORE: &str = "The Corner Grocery Store";

#[tokio::test]
async fn test_register_then_login_same_identity() {
    let app = TestApp::new().await;
    let (id, _) = app.register(ALICE, "alice@example.com").await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "Wrong#123" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "Alice@Example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id);
    assert_eq!(body["user"]["role"], "user");

    let claims = app
        .state
        .jwt_service
        .validate_token(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.user_id().unwrap(), id);
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_look_the_same() {
    let app = TestApp::new().await;
    app.register(ALICE, "alice@example.com").await;

    let (s1, b1) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    let (s2, b2) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "Wrong#123" }),
        )
        .await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s1, s2);
    assert_eq!(b1, b2);
}

#[tokio::test]
async fn test_registration_validation_and_duplicates() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Short", "email": "bad", "password": "weak", "address": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    let fields: Vec<&str> = body["details"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));

    app.register(ALICE, "alice@example.com").await;
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": ALICE, "email": "ALICE@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3002);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!("not an object")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn test_admin_registration_gate() {
    let app = TestApp::with_config(Config {
        allow_admin_registration: false,
        register_rate_limit: 0,
        ..Config::default()
    })
    .await;
    let (status, body) = app
        .post(
            "/api/auth/admin/register",
            None,
            json!({ "name": ALICE, "email": "root@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2004);

    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            "/api/auth/admin/register",
            None,
            json!({ "name": ALICE, "email": "root@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn test_admin_login_rejects_other_roles() {
    let app = TestApp::new().await;
    app.register(ALICE, "alice@example.com").await;
    let (status, body) = app
        .post(
            "/api/auth/admin/login",
            None,
            json!({ "email": "alice@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn test_resubmission_keeps_one_row() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let store_id = app.create_store(&admin, STORE, "shop@example.com", None).await;
    let (_, bob) = app.register(BOB, "bob@example.com").await;

    let (status, body) = app.rate(&bob, store_id, 4).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rating"]["rating"], 4);

    let (status, body) = app.rate(&bob, store_id, 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"]["rating"], 2);

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/user/stores/{store_id}/rating"),
            Some(bob.as_str()),
            Some(json!({ "rating": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"]["rating"], 3);

    assert_eq!(app.rating_rows(store_id).await, 1);

    let (_, body) = app
        .get(&format!("/api/user/stores/{store_id}/rating"), &bob)
        .await;
    assert_eq!(body, json!({ "rating": 3 }));

    let (_, stores) = app.get("/api/admin/stores", &admin).await;
    assert_eq!(stores[0]["rating"], "3.00");
    assert_eq!(stores[0]["total_ratings"], 1);
}

#[tokio::test]
async fn test_out_of_range_rating_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let store_id = app.create_store(&admin, STORE, "shop@example.com", None).await;
    let (_, bob) = app.register(BOB, "bob@example.com").await;

    for value in [0, 6] {
        let (status, body) = app.rate(&bob, store_id, value).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 2);
        assert_eq!(body["details"]["errors"][0]["field"], "rating");
    }
    for value in [json!(4.5), json!("4"), Value::Null] {
        let (status, body) = app
            .post(
                &format!("/api/user/stores/{store_id}/rating"),
                Some(bob.as_str()),
                json!({ "rating": value }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 2);
        assert_eq!(body["details"]["errors"][0]["field"], "rating");
        assert_eq!(
            body["details"]["errors"][0]["message"],
            "Rating must be between 1 and 5"
        );
    }
    assert_eq!(app.rating_rows(store_id).await, 0);

    let (_, body) = app
        .get(&format!("/api/user/stores/{store_id}/rating"), &bob)
        .await;
    assert_eq!(body, json!({ "rating": null }));
}

#[tokio::test]
async fn test_rating_missing_store() {
    let app = TestApp::new().await;
    let (_, bob) = app.register(BOB, "bob@example.com").await;

    let (status, body) = app.rate(&bob, 999, 3).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);

    let (status, _) = app.get("/api/user/stores/999/rating", &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/user/stores/abc/rating", &bob).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn test_caller_relative_store_view() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let store_id = app.create_store(&admin, STORE, "shop@example.com", None).await;
    let (_, bob) = app.register(BOB, "bob@example.com").await;
    let (_, carol) = app.register(CAROL, "carol@example.com").await;

    let (status, stores) = app.get("/api/user/stores", &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores[0]["id"], store_id);
    assert_eq!(stores[0]["overall_rating"], "0.00");
    assert_eq!(stores[0]["user_rating"], Value::Null);

    app.rate(&bob, store_id, 5).await;
    app.rate(&carol, store_id, 2).await;

    let (_, stores) = app.get("/api/user/stores", &bob).await;
    assert_eq!(stores[0]["overall_rating"], "2.00");
    assert_eq!(stores[0]["user_rating"], 5);

    let (_, stores) = app.get("/api/user/stores?name=nothing-like-this", &bob).await;
    assert_eq!(stores, json!([]));
}

#[tokio::test]
async fn test_owner_dashboard_rollup() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (owner_id, owner) = app.create_owner(&admin, OLIVER, "oliver@example.com").await;

    let (status, body) = app.get("/api/store-owner/store", &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4005);
    let (_, body) = app.get("/api/store-owner/dashboard", &owner).await;
    assert_eq!(body["averageRating"], "0.00");
    assert_eq!(body["totalRatings"], 0);

    let store_id = app
        .create_store(&admin, STORE, "shop@example.com", Some(owner_id))
        .await;
    let (_, bob) = app.register(BOB, "bob@example.com").await;
    let (_, carol) = app.register(CAROL, "carol@example.com").await;
    app.rate(&bob, store_id, 2).await;
    app.rate(&carol, store_id, 5).await;

    let (status, body) = app.get("/api/store-owner/dashboard", &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averageRating"], "3.50");
    assert_eq!(body["totalRatings"], 2);
    let raters = body["ratingUsers"].as_array().unwrap();
    assert_eq!(raters.len(), 2);
    assert_eq!(raters[0]["email"], "carol@example.com");
    assert_eq!(raters[1]["email"], "bob@example.com");

    let (_, body) = app.get("/api/store-owner/store", &owner).await;
    assert_eq!(body["id"], store_id);
    assert_eq!(body["average_rating"], "3.50");
    assert_eq!(body["total_ratings"], 2);

    let (_, users) = app
        .get("/api/admin/users?role=store_owner", &admin)
        .await;
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["rating"], "3.50");
}

#[tokio::test]
async fn test_role_gate() {
    let app = TestApp::new().await;
    let (_, bob) = app.register(BOB, "bob@example.com").await;
    let admin = app.admin_token().await;

    let (status, body) = app.get("/api/admin/dashboard", &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2002);

    let (status, _) = app.get("/api/store-owner/dashboard", &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/user/stores", &admin).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(Method::GET, "/api/admin/dashboard", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, body) = app.get("/api/auth/me", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);

    let (status, body) = app.get("/api/admin/dashboard", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "totalUsers": 2, "totalStores": 0, "totalRatings": 0 }));
}

#[tokio::test]
async fn test_deleted_user_token_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (bob_id, bob) = app.register(BOB, "bob@example.com").await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/admin/users/{bob_id}"), Some(admin.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/auth/me", &bob).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (_, me) = app.get("/api/auth/me", &admin).await;
    let admin_id = me["id"].as_i64().unwrap();
    assert_eq!(me["role"], "admin");

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/admin/users/{admin_id}"), Some(admin.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);

    let (bob_id, _) = app.register(BOB, "bob@example.com").await;
    app.register(ALICE, "alice@example.com").await;

    let (status, body) = app.get(&format!("/api/admin/users/{bob_id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@example.com");
    assert_eq!(body["rating"], Value::Null);

    let (status, body) = app.get("/api/admin/users/999", &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3001);

    let (_, users) = app
        .get("/api/admin/users?sortBy=email&sortOrder=desc", &admin)
        .await;
    let emails: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["bob@example.com", "alice@example.com", ADMIN_EMAIL]);

    let (_, users) = app.get("/api/admin/users?email=ALI", &admin).await;
    assert_eq!(users.as_array().unwrap().len(), 1);

    let (status, body) = app.get("/api/admin/users?role=owner", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);

    let (_, users) = app
        .get("/api/admin/users?sortBy=password_hash", &admin)
        .await;
    assert_eq!(users[0]["name"], ALICE);
}

#[tokio::test]
async fn test_admin_store_rules() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (bob_id, _) = app.register(BOB, "bob@example.com").await;
    let (owner_id, _) = app.create_owner(&admin, OLIVER, "oliver@example.com").await;

    let store = |email: &str, owner: Option<i64>| {
        json!({ "name": STORE, "email": email, "address": "42 Market Square", "owner_id": owner })
    };

    let (status, body) = app
        .post("/api/admin/stores", Some(admin.as_str()), store("a@shop.com", Some(bob_id)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);

    let (status, body) = app
        .post("/api/admin/stores", Some(admin.as_str()), store("a@shop.com", Some(9999)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);

    app.create_store(&admin, STORE, "a@shop.com", Some(owner_id)).await;

    let (status, body) = app
        .post("/api/admin/stores", Some(admin.as_str()), store("b@shop.com", Some(owner_id)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4004);

    let (status, body) = app
        .post("/api/admin/stores", Some(admin.as_str()), store("A@shop.com", None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);

    let (status, body) = app
        .post(
            "/api/admin/stores",
            Some(admin.as_str()),
            json!({ "name": "Tiny", "email": "c@shop.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["errors"][0]["field"], "name");
}

#[tokio::test]
async fn test_deleting_store_removes_its_ratings() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let store_id = app.create_store(&admin, STORE, "shop@example.com", None).await;
    let (_, bob) = app.register(BOB, "bob@example.com").await;
    app.rate(&bob, store_id, 4).await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/admin/stores/{store_id}"), Some(admin.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.rating_rows(store_id).await, 0);

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/admin/stores/{store_id}"), Some(admin.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let (_, bob) = app.register(BOB, "bob@example.com").await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/auth/password",
            Some(bob.as_str()),
            Some(json!({ "currentPassword": "Wrong#123", "newPassword": "Fresh#456" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3003);

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/auth/password",
            Some(bob.as_str()),
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "Fresh#456" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "bob@example.com", "password": "Fresh#456" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_rate_limit() {
    let app = TestApp::with_config(Config {
        login_rate_limit: 2,
        ..Config::default()
    })
    .await;
    let attempt = json!({ "email": "nobody@example.com", "password": PASSWORD });

    for _ in 0..2 {
        let (status, _) = app.post("/api/auth/login", None, attempt.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = app.post("/api/auth/login", None, attempt.clone()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 6);

    // a client-supplied X-Forwarded-For does not open a fresh budget
    for i in 0..3 {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", format!("198.51.100.{i}"))
            .body(Body::from(attempt.to_string()))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.request(Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3);
}
