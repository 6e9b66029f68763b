#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use chrono::DateTime;

#[actix_web::test]
async fn test_health_check() {
    let app = test_app!(common::lazy_state());

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], "healthy");
    let timestamp = json["timestamp"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert_eq!(json["database"]["active_connections"], 0);
}

#[actix_web::test]
async fn test_docs_page_and_spec() {
    let app = test_app!(common::lazy_state());

    let req = test::TestRequest::get().uri("/docs/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
    let body = test::read_body(resp).await;
    let page = std::str::from_utf8(&body).unwrap();
    assert!(page.contains(r##"dom_id: "#swagger-ui""##));

    let req = test::TestRequest::get().uri("/openapi.yaml").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let spec = std::str::from_utf8(&body).unwrap();
    assert!(spec.starts_with("openapi: 3"));
}
