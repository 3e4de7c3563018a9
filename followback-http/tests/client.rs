use followback_http::{Auth, HttpClient, HttpError, Method, Page, RequestOpts, StatusCode};
use serde_json::{Value, json};
use std::borrow::Cow;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_page_decodes_body_and_next_link() {
    let server = MockServer::start().await;
    let next = format!("{}/items?page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("per_page", "2"))
        .and(header("authorization", "Bearer t0ken"))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", format!(r#"<{next}>; rel="next""#).as_str())
                .set_body_json(json!([{"login": "a"}, {"login": "b"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let page: Page<Vec<Value>> = client
        .get_page(
            "items",
            RequestOpts {
                auth: Some(Auth::Bearer("t0ken")),
                query: Some(vec![("per_page", Cow::Borrowed("2"))]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.next.unwrap().as_str(), next);
}

#[tokio::test]
async fn get_page_surfaces_api_errors_with_url_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_page::<Vec<Value>>("missing", RequestOpts::default())
        .await
        .unwrap_err();

    match err {
        HttpError::Api {
            url,
            status,
            message,
            ..
        } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message, "Not Found");
            assert_eq!(url.path(), "/missing");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn absolute_urls_are_followed_when_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new("https://api.github.com").unwrap();
    let page: Page<Vec<Value>> = client
        .get_page(
            &format!("{}/elsewhere", server.uri()),
            RequestOpts {
                allow_absolute: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(page.next.is_none());
}

#[tokio::test]
async fn send_status_reports_raw_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/user/following/alice"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/user/following/bob"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let put = client
        .send_status(Method::PUT, "user/following/alice", RequestOpts::default())
        .await
        .unwrap();
    let delete = client
        .send_status(Method::DELETE, "user/following/bob", RequestOpts::default())
        .await
        .unwrap();

    assert_eq!(put, StatusCode::NO_CONTENT);
    assert_eq!(delete, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_are_unbounded_unless_a_timeout_is_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let page: Page<Vec<Value>> = client
        .get_page("slow", RequestOpts::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());

    let bounded = client.with_timeout(Duration::from_millis(50));
    let err = bounded
        .get_page::<Vec<Value>>("slow", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Network(_)), "got {err:?}");
}
