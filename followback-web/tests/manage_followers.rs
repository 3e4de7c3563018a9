//! Integration tests for the `/manage_followers` endpoint.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use followback_config::GithubSettings;
use followback_web::{AppState, router};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(api_base: &str, token: Option<&str>) -> Router {
    let settings = GithubSettings {
        token: token.map(str::to_string),
        api_base: api_base.to_string(),
        ..Default::default()
    };
    router(AppState::new(&settings).unwrap())
}

fn form_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/manage_followers")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_graph(server: &MockServer, followers: Value, following: Value) {
    Mock::given(method("GET"))
        .and(path("/users/octo/followers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(followers))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octo/following"))
        .respond_with(ResponseTemplate::new(200).set_body_json(following))
        .mount(server)
        .await;
}

#[tokio::test]
async fn returns_both_differences() {
    let server = MockServer::start().await;
    mount_graph(
        &server,
        json!([{"login": "a"}, {"login": "b"}]),
        json!([{"login": "b"}, {"login": "c"}]),
    )
    .await;

    let response = app(&server.uri(), Some("ghp_test"))
        .oneshot(form_post("username=octo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"not_following_back": ["c"], "not_followed_back": ["a"]})
    );
}

#[tokio::test]
async fn missing_token_is_rejected_without_upstream_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(&server.uri(), None)
        .oneshot(form_post("username=octo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("token"), "error was {error}");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_username_is_rejected() {
    let server = MockServer::start().await;
    let response = app(&server.uri(), Some("ghp_test"))
        .oneshot(form_post("username=+++"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn upstream_failure_becomes_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost/followers"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let response = app(&server.uri(), Some("ghp_test"))
        .oneshot(form_post("username=ghost"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("/users/ghost/followers"), "error was {error}");
    assert!(error.contains("404"), "error was {error}");
}

#[tokio::test]
async fn home_serves_the_form() {
    let response = app("https://api.github.com", None)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("/manage_followers"));
}

#[tokio::test]
async fn malformed_form_gets_a_json_error() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/manage_followers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"username":"octo"}"#))
        .unwrap();

    let response = app(&server.uri(), Some("ghp_test"))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("invalid form"), "error was {error}");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn client_is_built_up_front_when_a_token_is_set() {
    let broken = GithubSettings {
        token: Some("ghp_test".into()),
        api_base: "not a url".into(),
        ..Default::default()
    };
    assert!(AppState::new(&broken).is_err());

    let anonymous = GithubSettings {
        api_base: "not a url".into(),
        ..Default::default()
    };
    assert!(AppState::new(&anonymous).is_ok());
}
