//! Runs the real server on an ephemeral port and talks to it over HTTP.

#[macro_use]
mod common;

use std::net::TcpListener;

use birthday_greeter::server::build_server;
use reqwest::StatusCode;
use serde_json::Value;

async fn spawn_server() -> (String, actix_web::dev::ServerHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
    let address = format!("http://{}", listener.local_addr().unwrap());

    let server = build_server(common::lazy_state(), listener).expect("Failed to build server");
    let handle = server.handle();
    actix_web::rt::spawn(server);

    (address, handle)
}

#[actix_web::test]
async fn test_server_serves_health_and_docs() {
    let (address, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let url = format!("{address}/health");
    let resp = client.get(url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let url = format!("{address}/docs/");
    let resp = client.get(url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("swagger-ui"));

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_server_rejects_anonymous_profile_request() {
    let (address, handle) = spawn_server().await;

    let url = format!("{address}/api/profile");
    let resp = reqwest::get(url).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Unauthorized user");

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_cors_preflight_is_answered() {
    let (address, handle) = spawn_server().await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{address}/api/signup"))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("access-control-allow-origin"));

    handle.stop(true).await;
}
