mod common;

use axum::http::StatusCode;
use common::{FRONTEND, FakeFrontend, SECRET, headless, server_utils::create_test_server};
use serde_json::{Value, json};

fn draft(id: i64) -> Value {
    json!({
        "id": id,
        "post_type": "post",
        "slug": "",
        "title": "Hello World!",
        "status": "draft",
        "permalink": format!("https://cms.example/?p={id}")
    })
}

fn published(id: i64, permalink: &str) -> Value {
    json!({
        "id": id,
        "post_type": "page",
        "slug": format!("page-{id}"),
        "title": format!("Page {id}"),
        "status": "publish",
        "permalink": permalink
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server(headless(Some(FRONTEND), Some(SECRET)));

    let response = server.get("/api/v1/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_upsert_published_item_links_to_frontend() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    let response = server
        .post("/api/v1/content")
        .json(&published(3, "https://cms.example/about/"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["item"]["link"], "https://app.example/about/");
    assert_eq!(body["dispatch"]["links_migrated"], false);

    let fetched: Value = server.get("/api/v1/content/3").await.json();
    assert_eq!(fetched["link"], "https://app.example/about/");
    assert_eq!(fetched["slug"], "page-3");
}

#[tokio::test]
async fn test_upsert_replaces_existing_item() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    server
        .post("/api/v1/content")
        .json(&published(3, "https://cms.example/about/"))
        .await
        .assert_status_ok();
    server
        .post("/api/v1/content")
        .json(&published(3, "https://cms.example/about-us/"))
        .await
        .assert_status_ok();

    let fetched: Value = server.get("/api/v1/content/3").await.json();
    assert_eq!(fetched["link"], "https://app.example/about-us/");
}

#[tokio::test]
async fn test_upsert_rejects_invalid_id() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    let response = server
        .post("/api/v1/content")
        .json(&published(0, "https://cms.example/about/"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_item_is_not_found() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    server
        .get("/api/v1/content/404")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/api/v1/content/404/preview")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_draft_preview_link_uses_frontend_route() {
    let frontend = FakeFrontend::spawn(StatusCode::OK).await;
    let server = create_test_server(headless(Some(&frontend.base_url), Some(SECRET)));

    server
        .post("/api/v1/content")
        .json(&draft(7))
        .await
        .assert_status_ok();

    let body: Value = server.get("/api/v1/content/7/preview").await.json();
    assert_eq!(
        body["link"],
        format!(
            "{}api/preview?name=hello-world&id=7&post_type=Post&token=s3cret",
            frontend.base_url
        )
    );

    let item: Value = server.get("/api/v1/content/7").await.json();
    assert_eq!(item["link"], body["link"]);
}

#[tokio::test]
async fn test_draft_preview_without_frontend_stays_on_backend() {
    let server = create_test_server(headless(None, None));

    server
        .post("/api/v1/content")
        .json(&draft(7))
        .await
        .assert_status_ok();

    let body: Value = server.get("/api/v1/content/7/preview").await.json();
    assert_eq!(body["link"], "https://cms.example/?p=7&preview=true");
}

#[tokio::test]
async fn test_settings_are_sanitized() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    let response = server
        .put("/api/v1/settings")
        .json(&json!({
            "error_404_page": "12",
            "page_on_front": "not a number",
            "page_for_posts": 4,
            "unknown": 1
        }))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "error_404_page": 12,
        "page_on_front": null,
        "page_for_posts": 4
    }));

    let stored: Value = server.get("/api/v1/settings").await.json();
    assert_eq!(stored["error_404_page"], 12);
}

#[tokio::test]
async fn test_error_page_links_to_frontend_404() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    server
        .post("/api/v1/content")
        .json(&published(12, "https://cms.example/not-found/"))
        .await
        .assert_status_ok();
    server
        .put("/api/v1/settings")
        .json(&json!({ "error_404_page": 12 }))
        .await
        .assert_status_ok();

    let item: Value = server.get("/api/v1/content/12").await.json();
    assert_eq!(item["link"], "https://app.example/404");

    let config: Value = server.get("/api/v1/headless-config").await.json();
    assert_eq!(config["additionalSettings"]["error404Page"]["id"], 12);
    assert_eq!(
        config["additionalSettings"]["error404Page"]["link"],
        "https://app.example/404"
    );
}

#[tokio::test]
async fn test_headless_config_without_error_page() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    let response = server.get("/api/v1/headless-config").await;

    response.assert_status_ok();
    response.assert_json(&json!({ "additionalSettings": { "error404Page": null } }));
}

#[tokio::test]
async fn test_homepage_settings() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    server
        .post("/api/v1/content")
        .json(&published(2, "https://cms.example/home/"))
        .await
        .assert_status_ok();
    server
        .put("/api/v1/settings")
        .json(&json!({ "page_on_front": 2, "page_for_posts": 0 }))
        .await
        .assert_status_ok();

    let body: Value = server.get("/api/v1/homepage-settings").await.json();
    assert_eq!(body["frontPage"]["link"], "https://app.example/home/");
    assert_eq!(body["postsPage"], Value::Null);
}

#[tokio::test]
async fn test_avatar_url() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    let body: Value = server.get("/api/v1/avatar").await.json();
    assert_eq!(
        body["url"],
        "https://secure.gravatar.com/avatar/5cf23001579ee91aff54a2dcd6e5acc9?s=150&d=mm&r=g"
    );

    let body: Value = server
        .get("/api/v1/avatar")
        .add_query_param("email", "Someone@Example.com")
        .add_query_param("size", 64)
        .await
        .json();
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://secure.gravatar.com/avatar/"));
    assert!(url.ends_with("?s=64&d=mm&r=g"));

    server
        .get("/api/v1/avatar")
        .add_query_param("size", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_home_url_in_admin_points_at_frontend() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    let body: Value = server
        .get("/api/v1/links/home")
        .add_query_param("path", "/about")
        .add_query_param("admin", true)
        .await
        .json();
    assert_eq!(body["url"], "https://app.example/about");

    let body: Value = server
        .get("/api/v1/links/home")
        .add_query_param("path", "/about")
        .add_query_param("admin", true)
        .add_query_param("scheme", "rest")
        .await
        .json();
    assert_eq!(body["url"], "https://cms.example/about");

    let body: Value = server
        .get("/api/v1/links/home")
        .add_query_param("path", "/about")
        .await
        .json();
    assert_eq!(body["url"], "https://cms.example/about");
}

#[tokio::test]
async fn test_unknown_api_route_is_not_found() {
    let server = create_test_server(headless(Some(FRONTEND), None));

    server
        .get("/api/v1/does-not-exist")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
