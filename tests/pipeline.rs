//! End-to-end tests of the guarded server over real TCP.

use axum::{
    routing::{get, post},
    Router,
};
use http_guard::config::{Environment, GuardConfig};
use http_guard::http::ValidatedJson;
use http_guard::{app, AppError};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

mod common;

#[derive(Debug, Deserialize, Validate)]
struct NewItem {
    #[validate(length(min = 1, message = "required"))]
    name: String,
}

fn routes() -> Router {
    app::routes()
        .route("/upload", post(|body: String| async move { format!("stored {}", body.len()) }))
        .route(
            "/items/{id}",
            get(|| async { Err::<(), _>(AppError::InvalidArgument("id must be numeric".into())) }),
        )
        .route(
            "/crash",
            get(|| async {
                if true {
                    panic!("storage backend unavailable");
                }
                "unreachable"
            }),
        )
        .route(
            "/items",
            post(|ValidatedJson(item): ValidatedJson<NewItem>| async move { item.name }),
        )
}

#[tokio::test]
async fn hello_world_with_all_headers() {
    let server = common::start_server(GuardConfig::default(), routes()).await;

    let res = common::client().get(server.url("/")).send().await.expect("server unreachable");
    assert_eq!(res.status(), 200);

    let headers = res.headers().clone();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(
        headers["content-security-policy"],
        "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self'; font-src 'self'; connect-src 'self'"
    );
    assert_eq!(
        headers["permissions-policy"],
        "geolocation=(), camera=(), microphone=(), fullscreen=(), payment=()"
    );
    assert_eq!(headers["access-control-allow-origin"], "https://trusted.example.com");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, PUT, DELETE");
    assert_eq!(headers["access-control-allow-headers"], "Authorization, Content-Type");
    let hsts = headers["strict-transport-security"].to_str().unwrap();
    assert_eq!(hsts.trim_end(), "max-age=31536000; includeSubDomains;");
    assert!(headers.contains_key("x-request-id"));

    assert_eq!(res.text().await.unwrap(), "Hello World!");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn wire_format_is_title_cased_and_byte_exact() {
    let server = common::start_server(GuardConfig::default(), routes()).await;

    let response = common::raw_request(
        server.addr,
        "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{}", response);
    assert!(response.contains("\r\nX-Content-Type-Options: nosniff\r\n"));
    assert!(response.contains("\r\nX-Frame-Options: DENY\r\n"));
    assert!(response.contains("\r\nStrict-Transport-Security: max-age=31536000; includeSubDomains; \r\n"));
    assert!(response.ends_with("Hello World!"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn declared_size_over_limit_is_rejected() {
    let mut config = GuardConfig::default();
    config.limits.max_request_bytes = 32;
    let server = common::start_server(config, routes()).await;
    let client = common::client();

    let res = client
        .post(server.url("/upload"))
        .body(vec![b'a'; 33])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"error":"Request size limit exceeded","maxSize":32,"status":413}"#
    );

    let res = client
        .post(server.url("/upload"))
        .body(vec![b'a'; 32])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "stored 32");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn handler_failures_become_json_envelopes() {
    let server = common::start_server(GuardConfig::default(), routes()).await;
    let client = common::client();

    let res = client.get(server.url("/items/abc")).send().await.unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["Error"], "InvalidArgument");
    assert_eq!(json["StatusCode"], 400);
    assert_eq!(json["Message"], "id must be numeric");
    assert!(json["Details"].is_string());

    let res = client.get(server.url("/crash")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["Error"], "Panic");
    assert_eq!(json["Message"], "storage backend unavailable");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn invalid_models_are_filtered() {
    let server = common::start_server(GuardConfig::default(), routes()).await;
    let client = common::client();

    let res = client
        .post(server.url("/items"))
        .json(&serde_json::json!({"name": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let json: Value = res.json().await.unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "Error": "ValidationFailed",
            "Message": "One or more validation errors occurred.",
            "StatusCode": 400,
            "Errors": [{"field": "name", "message": ["required"]}]
        })
    );

    let res = client
        .post(server.url("/items"))
        .json(&serde_json::json!({"name": "lamp"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "lamp");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn development_mode_skips_hardening_stages() {
    let mut config = GuardConfig::default();
    config.environment = Environment::Development;
    config.limits.max_request_bytes = 1;
    let server = common::start_server(config, routes()).await;
    let client = common::client();

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(!res.headers().contains_key("x-frame-options"));
    assert!(!res.headers().contains_key("access-control-allow-origin"));

    let res = client.post(server.url("/upload")).body("abc").send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(server.url("/items/abc")).send().await.unwrap();
    assert_eq!(res.status(), 400);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn insecure_requests_redirect_when_port_configured() {
    let mut config = GuardConfig::default();
    config.server.https_port = Some(8443);
    let server = common::start_server(config, routes()).await;
    let client = common::client();

    let res = client.get(server.url("/items/1?full=true")).send().await.unwrap();
    assert_eq!(res.status(), 307);
    assert_eq!(res.headers()["location"], "https://127.0.0.1:8443/items/1?full=true");

    let res = client
        .get(server.url("/"))
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let server = common::start_server(GuardConfig::default(), routes()).await;
    let addr = server.addr;

    server.stop().await.unwrap();
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
