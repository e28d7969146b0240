//! Shared test infrastructure
//!
//! Stands up a `wiremock` double of the authentication service that answers
//! the lifecycle for `alice123` exactly as the reference service does:
//! tokens `T1`, `T2`, `T3` for the three logins and user id `U1`.

#![allow(dead_code)]

use authflow::config::{Config, CredentialsConfig};
use authflow::runner::Runner;
use authflow::steps::Plan;
use authflow::client::HttpTransport;
use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "alice123";
pub const RENAMED: &str = "updated_alice123";
pub const USER_ID: &str = "U1";

fn ok(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "success", "message": message}))
}

fn login_ok(username: &str, token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "success",
        "message": "Login successful",
        "id": USER_ID,
        "username": username,
        "token": token,
    }))
}

/// Preflight probe answers 400 (validation failure), which counts as reachable
pub async fn mount_preflight(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({"username": "test", "password": "test"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "message": "email is required"
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_register(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({
            "username": USERNAME,
            "password": "senha123",
            "email": "alice123@example.com"
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"status": "success", "message": "User registered"})),
        )
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_login(
    server: &MockServer,
    username: &str,
    password: &str,
    response: ResponseTemplate,
) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"username": username, "password": password})))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// Mount every endpoint of the happy path
pub async fn mount_lifecycle(server: &MockServer) {
    mount_preflight(server).await;
    mount_register(server).await;
    mount_login(server, USERNAME, "senha123", login_ok(USERNAME, "T1")).await;

    Mock::given(method("GET"))
        .and(path("/users/id/U1"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": USER_ID,
            "username": USERNAME,
            "email": "alice123@example.com"
        })))
        .with_priority(1)
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/users/id/U1/password"))
        .and(header("Authorization", "Bearer T1"))
        .and(body_json(json!({
            "currentPassword": "senha123",
            "newPassword": "novaSenha456"
        })))
        .respond_with(ok("Password updated"))
        .expect(1)
        .mount(server)
        .await;

    mount_login(server, USERNAME, "novaSenha456", login_ok(USERNAME, "T2")).await;

    Mock::given(method("PUT"))
        .and(path("/users/id/U1/username"))
        .and(header("Authorization", "Bearer T2"))
        .and(body_json(json!({
            "currentUsername": USERNAME,
            "newUsername": RENAMED
        })))
        .respond_with(ok("Username updated"))
        .expect(1)
        .mount(server)
        .await;

    mount_login(server, RENAMED, "novaSenha456", login_ok(RENAMED, "T3")).await;

    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("Authorization", "Bearer T3"))
        .respond_with(ok("Logged out"))
        .expect(1)
        .mount(server)
        .await;

    mount_denied_read(server, 403).await;
}

/// Unauthenticated read of `/users/id/U1`, lower priority than the bearer mock
pub async fn mount_denied_read(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/users/id/U1"))
        .respond_with(ResponseTemplate::new(status))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Configuration pointed at `base_url` with no pause between steps
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    config.target.base_url = base_url.to_string();
    config.target.timeout_seconds = 5;
    config.preflight.timeout_seconds = 2;
    config.run.step_delay_millis = 0;
    config
}

/// Runner for an arbitrary plan against a live base URL
pub fn runner_for(base_url: &str, plan: Plan) -> Runner<HttpTransport> {
    let transport = HttpTransport::with_timeout(base_url, Duration::from_secs(5)).unwrap();
    Runner::new(transport, plan)
        .with_base_url(base_url)
        .with_credentials(CredentialsConfig::default())
}

/// A loopback URL nothing is listening on
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
