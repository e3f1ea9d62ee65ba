//! End-to-end tests driving the router against the in-memory store.
//!
//! Covers the full challenge-response lifecycle (register, login, bearer
//! resolution, revocation) plus the per-user state and watch-party routes.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signer, SigningKey};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use screening_room::config::{AppConfig, ServerConfig};
use screening_room::db::MemoryStore;
use screening_room::gateway::{self, state::AppState};

const TEST_USER_AGENT: &str = "integration-tests/1.0";

fn test_config() -> AppConfig {
    AppConfig {
        log_level: "info".to_string(),
        log_dir: "logs".to_string(),
        log_file: "test.log".to_string(),
        use_json: false,
        rotation: "never".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        postgres_url: None,
        crypto_secret: "integration-test-secret".to_string(),
        captcha: Default::default(),
        meta: Default::default(),
    }
}

fn test_app() -> Router {
    let state = Arc::new(AppState::new(
        Arc::new(MemoryStore::new()),
        &test_config(),
    ));
    gateway::router(state)
}

fn keypair(seed: u8) -> (SigningKey, String) {
    let signing_key = SigningKey::from_bytes(&[seed; 32]);
    let public_key = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().as_bytes());
    (signing_key, public_key)
}

fn sign(key: &SigningKey, message: &str) -> String {
    URL_SAFE_NO_PAD.encode(key.sign(message.as_bytes()).to_bytes())
}

struct RequestSpec<'a> {
    method: Method,
    uri: &'a str,
    token: Option<&'a str>,
    user_agent: bool,
    body: Option<Value>,
}

impl<'a> RequestSpec<'a> {
    fn new(method: Method, uri: &'a str) -> Self {
        Self {
            method,
            uri,
            token: None,
            user_agent: true,
            body: None,
        }
    }

    fn token(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    fn no_user_agent(mut self) -> Self {
        self.user_agent = false;
        self
    }

    fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

async fn send(app: &Router, spec: RequestSpec<'_>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(spec.method).uri(spec.uri);
    if let Some(token) = spec.token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if spec.user_agent {
        builder = builder.header(header::USER_AGENT, TEST_USER_AGENT);
    }

    let request = match spec.body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Run the whole registration flow for `key`, returning (user id, token).
async fn register(app: &Router, key: &SigningKey, public_key: &str) -> (String, String) {
    let (status, body) = send(
        app,
        RequestSpec::new(Method::POST, "/auth/register/start").body(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let challenge = body["challenge"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        RequestSpec::new(Method::POST, "/auth/register/complete").body(json!({
            "publicKey": public_key,
            "challenge": { "code": challenge, "signature": sign(key, &challenge) },
            "namespace": "default",
            "device": "test-device",
            "profile": { "icon": "popcorn", "colorA": "#2E65CF", "colorB": "#C82288" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register complete failed: {body}");

    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Run the login flow for an already-registered key.
async fn login(app: &Router, key: &SigningKey, public_key: &str) -> (String, String) {
    let (status, body) = send(
        app,
        RequestSpec::new(Method::POST, "/auth/login/start")
            .body(json!({ "publicKey": public_key })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let challenge = body["challenge"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        RequestSpec::new(Method::POST, "/auth/login/complete").body(json!({
            "publicKey": public_key,
            "challenge": { "code": challenge, "signature": sign(key, &challenge) },
            "device": "second-device",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login complete failed: {body}");

    (
        body["session"]["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

// ============================================================================
// System routes
// ============================================================================

#[tokio::test]
async fn test_index_and_health() {
    let app = test_app();

    let (status, body) = send(&app, RequestSpec::new(Method::GET, "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Backend is working as expected")
    );

    let (status, body) = send(&app, RequestSpec::new(Method::GET, "/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, RequestSpec::new(Method::GET, "/meta")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasCaptcha"], false);
}

// ============================================================================
// Registration and login
// ============================================================================

#[tokio::test]
async fn test_registration_end_to_end() {
    let app = test_app();
    let (key, public_key) = keypair(1);

    let (user_id, token) = register(&app, &key, &public_key).await;

    // The bearer token resolves to the same user on a protected route.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::GET, "/users/@me").token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert_eq!(body["user"]["publicKey"], public_key.as_str());
    assert_eq!(body["user"]["namespace"], "default");
    assert_eq!(body["session"]["device"], "test-device");
    assert_eq!(body["session"]["userAgent"], TEST_USER_AGENT);
}

#[tokio::test]
async fn test_registration_requires_user_agent() {
    let app = test_app();
    let (key, public_key) = keypair(2);

    let (_, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/register/start").body(json!({})),
    )
    .await;
    let challenge = body["challenge"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/register/complete")
            .no_user_agent()
            .body(json!({
                "publicKey": public_key,
                "challenge": { "code": challenge, "signature": sign(&key, &challenge) },
                "namespace": "default",
                "device": "test-device",
                "profile": { "icon": "popcorn", "colorA": "#2E65CF", "colorB": "#C82288" },
            })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_duplicate_public_key_is_conflict() {
    let app = test_app();
    let (key, public_key) = keypair(3);
    register(&app, &key, &public_key).await;

    // Fresh, validly-signed challenge; only the public key is a repeat.
    let (_, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/register/start").body(json!({})),
    )
    .await;
    let challenge = body["challenge"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/register/complete").body(json!({
            "publicKey": public_key,
            "challenge": { "code": challenge, "signature": sign(&key, &challenge) },
            "namespace": "default",
            "device": "other-device",
            "profile": { "icon": "popcorn", "colorA": "#2E65CF", "colorB": "#C82288" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_challenge_is_single_use_over_http() {
    let app = test_app();
    let (key, public_key) = keypair(4);

    let (_, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/register/start").body(json!({})),
    )
    .await;
    let challenge = body["challenge"].as_str().unwrap().to_string();
    let signature = sign(&key, &challenge);

    let complete_body = json!({
        "publicKey": public_key,
        "challenge": { "code": challenge, "signature": signature },
        "namespace": "default",
        "device": "test-device",
        "profile": { "icon": "popcorn", "colorA": "#2E65CF", "colorB": "#C82288" },
    });

    let (status, _) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/register/complete").body(complete_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Replaying the consumed challenge is unauthorized, not conflict: the
    // challenge check runs before the duplicate-user check.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/register/complete").body(complete_body),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid challenge code");
}

#[tokio::test]
async fn test_login_flow_and_flow_isolation() {
    let app = test_app();
    let (key, public_key) = keypair(5);
    let (user_id, _) = register(&app, &key, &public_key).await;

    // Unknown key cannot start a login.
    let (other_key, other_public) = keypair(6);
    let (status, _) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/login/start")
            .body(json!({ "publicKey": other_public })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    drop(other_key);

    // A registration challenge cannot complete a login, even well signed.
    let (_, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/register/start").body(json!({})),
    )
    .await;
    let wrong_flow_challenge = body["challenge"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/login/complete").body(json!({
            "publicKey": public_key,
            "challenge": {
                "code": wrong_flow_challenge,
                "signature": sign(&key, &wrong_flow_challenge),
            },
            "device": "second-device",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid challenge code");

    // A proper login works and yields a usable token.
    let (_, token) = login(&app, &key, &public_key).await;
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::GET, "/users/@me").token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());
}

#[tokio::test]
async fn test_protected_routes_reject_bad_credentials() {
    let app = test_app();

    let (status, _) = send(&app, RequestSpec::new(Method::GET, "/users/@me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        RequestSpec::new(Method::GET, "/users/@me").token("garbage.token.here"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_derive_public_key_is_deterministic() {
    let app = test_app();
    let body = json!({
        "mnemonic": "right inject hazard canoe carry unfair cram physical chief nice real tribute"
    });

    let (status, first) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/derive-public-key").body(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(
        &app,
        RequestSpec::new(Method::POST, "/auth/derive-public-key").body(body),
    )
    .await;
    assert_eq!(first["publicKey"], second["publicKey"]);
    assert_eq!(first["publicKey"].as_str().unwrap().len(), 43);
}

// ============================================================================
// Session management
// ============================================================================

#[tokio::test]
async fn test_session_listing_rename_and_revocation() {
    let app = test_app();
    let (key, public_key) = keypair(7);
    let (user_id, first_token) = register(&app, &key, &public_key).await;
    let (second_sid, second_token) = login(&app, &key, &public_key).await;

    // Both sessions listed; only the caller's flagged current.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::GET, &format!("/users/{user_id}/sessions"))
            .token(&second_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let first_sid = entries
        .iter()
        .find(|e| e["current"] == false)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(entries.iter().any(|e| e["id"] == second_sid.as_str() && e["current"] == true));

    // Rename the other device.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::PATCH, &format!("/sessions/{first_sid}"))
            .token(&second_token)
            .body(json!({ "deviceName": "renamed-laptop" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["device"], "renamed-laptop");
    assert_eq!(body["current"], false);

    // A different user cannot touch these sessions.
    let (intruder_key, intruder_public) = keypair(8);
    let (_, intruder_token) = register(&app, &intruder_key, &intruder_public).await;
    let (status, _) = send(
        &app,
        RequestSpec::new(Method::PATCH, &format!("/sessions/{first_sid}"))
            .token(&intruder_token)
            .body(json!({ "deviceName": "stolen" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        RequestSpec::new(Method::DELETE, &format!("/sessions/{first_sid}"))
            .token(&intruder_token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Revoke the first session from the second.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::DELETE, &format!("/sessions/{first_sid}"))
            .token(&second_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], first_sid.as_str());

    // The revoked token no longer authenticates.
    let (status, _) = send(
        &app,
        RequestSpec::new(Method::GET, "/users/@me").token(&first_token),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Deleting again is idempotent.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::DELETE, &format!("/sessions/{first_sid}"))
            .token(&second_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], first_sid.as_str());

    // PATCH on a missing session is a 404, unlike DELETE.
    let (status, _) = send(
        &app,
        RequestSpec::new(Method::PATCH, &format!("/sessions/{first_sid}"))
            .token(&second_token)
            .body(json!({ "deviceName": "ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Per-user state
// ============================================================================

#[tokio::test]
async fn test_profile_update_ownership() {
    let app = test_app();
    let (key, public_key) = keypair(9);
    let (user_id, token) = register(&app, &key, &public_key).await;

    let new_profile = json!({
        "profile": { "icon": "clapper", "colorA": "#000000", "colorB": "#FFFFFF" }
    });

    let (status, body) = send(
        &app,
        RequestSpec::new(Method::PATCH, &format!("/users/{user_id}"))
            .token(&token)
            .body(new_profile.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["icon"], "clapper");
    assert!(body["createdAt"].is_string());

    let (status, _) = send(
        &app,
        RequestSpec::new(Method::PATCH, "/users/someone-else")
            .token(&token)
            .body(new_profile),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bookmarks_crud() {
    let app = test_app();
    let (key, public_key) = keypair(10);
    let (user_id, token) = register(&app, &key, &public_key).await;

    let meta = json!({ "title": "Heat", "year": 1995, "type": "movie" });

    // Create
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::POST, &format!("/users/{user_id}/bookmarks/949"))
            .token(&token)
            .body(json!({ "meta": meta })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tmdbId"], "949");

    // Duplicate create is rejected.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::POST, &format!("/users/{user_id}/bookmarks/949"))
            .token(&token)
            .body(json!({ "meta": meta })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Already bookmarked");

    // Bulk sync normalizes a scalar group to a list.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/bookmarks"))
            .token(&token)
            .body(json!([
                { "tmdbId": "949", "meta": meta, "group": "crime" },
                {
                    "tmdbId": "680",
                    "meta": { "title": "Pulp Fiction", "year": 1994, "type": "movie" },
                    "group": ["crime", "favorites"]
                },
            ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["group"], json!(["crime"]));
    assert_eq!(body[1]["group"], json!(["crime", "favorites"]));

    let (status, body) = send(
        &app,
        RequestSpec::new(Method::GET, &format!("/users/{user_id}/bookmarks")).token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Ownership is enforced.
    let (other_key, other_public) = keypair(11);
    let (_, other_token) = register(&app, &other_key, &other_public).await;
    let (status, _) = send(
        &app,
        RequestSpec::new(Method::GET, &format!("/users/{user_id}/bookmarks"))
            .token(&other_token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Delete is idempotent.
    for _ in 0..2 {
        let (status, body) = send(
            &app,
            RequestSpec::new(Method::DELETE, &format!("/users/{user_id}/bookmarks/949"))
                .token(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tmdbId"], "949");
    }

    let (_, body) = send(
        &app,
        RequestSpec::new(Method::GET, &format!("/users/{user_id}/bookmarks")).token(&token),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_progress_upsert_movie_and_episode() {
    let app = test_app();
    let (key, public_key) = keypair(12);
    let (user_id, token) = register(&app, &key, &public_key).await;

    // Movie: the storage sentinel never shows on the wire.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/progress/603"))
            .token(&token)
            .body(json!({
                "meta": { "title": "The Matrix", "type": "movie", "year": 1999 },
                "duration": 8160000.4,
                "watched": 1200000.0,
            })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seasonId"], Value::Null);
    assert_eq!(body["episodeId"], Value::Null);
    assert_eq!(body["duration"], 8160000);
    let movie_row_id = body["id"].as_str().unwrap().to_string();

    // Upserting the same movie keeps the row identity.
    let (_, body) = send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/progress/603"))
            .token(&token)
            .body(json!({
                "meta": { "title": "The Matrix", "type": "movie", "year": 1999 },
                "duration": 8160000,
                "watched": 4000000,
            })),
    )
    .await;
    assert_eq!(body["id"], movie_row_id.as_str());
    assert_eq!(body["watched"], 4000000);

    // Episode rows carry their real slots.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/progress/1396"))
            .token(&token)
            .body(json!({
                "meta": { "title": "Breaking Bad", "type": "show" },
                "duration": 2820000,
                "watched": 900000,
                "seasonId": "s1",
                "episodeId": "e3",
                "seasonNumber": 1,
                "episodeNumber": 3,
            })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seasonId"], "s1");
    assert_eq!(body["episodeId"], "e3");

    let (_, body) = send(
        &app,
        RequestSpec::new(Method::GET, &format!("/users/{user_id}/progress")).token(&token),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Delete the movie by meta type; the episode row stays.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::DELETE, &format!("/users/{user_id}/progress/603"))
            .token(&token)
            .body(json!({ "meta": { "type": "movie" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (_, body) = send(
        &app,
        RequestSpec::new(Method::GET, &format!("/users/{user_id}/progress")).token(&token),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_progress_import_keeps_furthest_watch() {
    let app = test_app();
    let (key, public_key) = keypair(13);
    let (user_id, token) = register(&app, &key, &public_key).await;

    // Seed one episode at 900s in.
    send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/progress/1396"))
            .token(&token)
            .body(json!({
                "meta": { "title": "Breaking Bad", "type": "show" },
                "duration": 2820000,
                "watched": 900000,
                "seasonId": "s1",
                "episodeId": "e1",
            })),
    )
    .await;

    // Import: one behind entry, one ahead entry (same slot), one new title.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/progress/import"))
            .token(&token)
            .body(json!([
                {
                    "tmdbId": "1396",
                    "meta": { "title": "Breaking Bad", "type": "show" },
                    "duration": 2820000,
                    "watched": 2400000,
                    "seasonId": "s1",
                    "episodeId": "e1",
                },
                {
                    "tmdbId": "60059",
                    "meta": { "title": "Better Call Saul", "type": "show" },
                    "duration": 2700000,
                    "watched": 300000,
                    "seasonId": "s1",
                    "episodeId": "e1",
                },
            ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Both rows written: the ahead entry overwrote, the new title appended.
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(
        &app,
        RequestSpec::new(Method::GET, &format!("/users/{user_id}/progress")).token(&token),
    )
    .await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    let bb = items.iter().find(|i| i["tmdbId"] == "1396").unwrap();
    assert_eq!(bb["watched"], 2400000);

    // A second import that is behind changes nothing.
    let (_, body) = send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/progress/import"))
            .token(&token)
            .body(json!([
                {
                    "tmdbId": "1396",
                    "meta": { "title": "Breaking Bad", "type": "show" },
                    "duration": 2820000,
                    "watched": 100000,
                    "seasonId": "s1",
                    "episodeId": "e1",
                },
            ])),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_settings_defaults_and_merge() {
    let app = test_app();
    let (key, public_key) = keypair(14);
    let (user_id, token) = register(&app, &key, &public_key).await;

    // No row yet: all-null settings, not a 404.
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::GET, &format!("/users/{user_id}/settings")).token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["applicationTheme"], Value::Null);
    assert_eq!(body["settings"]["proxyUrls"], json!([]));

    let (status, body) = send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/settings"))
            .token(&token)
            .body(json!({ "application_theme": "dark" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["applicationTheme"], "dark");

    // Partial update leaves other fields alone.
    let (_, body) = send(
        &app,
        RequestSpec::new(Method::PUT, &format!("/users/{user_id}/settings"))
            .token(&token)
            .body(json!({ "application_language": "fr" })),
    )
    .await;
    assert_eq!(body["settings"]["applicationTheme"], "dark");
    assert_eq!(body["settings"]["applicationLanguage"], "fr");
}

// ============================================================================
// Watch-party relay
// ============================================================================

#[tokio::test]
async fn test_player_status_relay() {
    let app = test_app();

    let (status, _) = send(
        &app,
        RequestSpec::new(Method::POST, "/player/status").body(json!({ "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        RequestSpec::new(Method::POST, "/player/status").body(json!({
            "userId": "u1",
            "roomCode": "ROOM1",
            "isHost": true,
            "content": { "title": "Heat", "type": "movie", "tmdbId": 949 },
            "player": { "isPlaying": true, "time": 42.5, "duration": 10200.0 },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "post status failed: {body}");
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].as_i64().unwrap() > 0);

    // Per-user poll
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::GET, "/player/status?userId=u1&roomCode=ROOM1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statuses"].as_array().unwrap().len(), 1);
    assert_eq!(body["statuses"][0]["isHost"], true);
    assert_eq!(body["statuses"][0]["content"]["title"], "Heat");

    // Room-wide poll groups by user.
    send(
        &app,
        RequestSpec::new(Method::POST, "/player/status").body(json!({
            "userId": "u2",
            "roomCode": "ROOM1",
        })),
    )
    .await;
    let (status, body) = send(
        &app,
        RequestSpec::new(Method::GET, "/player/status?roomCode=ROOM1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_object().unwrap();
    assert_eq!(users.len(), 2);

    // History caps at five snapshots per user+room.
    for _ in 0..7 {
        send(
            &app,
            RequestSpec::new(Method::POST, "/player/status").body(json!({
                "userId": "u1",
                "roomCode": "ROOM1",
            })),
        )
        .await;
    }
    let (_, body) = send(
        &app,
        RequestSpec::new(Method::GET, "/player/status?userId=u1&roomCode=ROOM1"),
    )
    .await;
    assert_eq!(body["statuses"].as_array().unwrap().len(), 5);

    let (status, _) = send(&app, RequestSpec::new(Method::GET, "/player/status")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
