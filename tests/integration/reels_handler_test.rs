// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::fixtures::{site_with_items, LISTING};
use crate::helpers::FakeWeb;
use axum::http::StatusCode;
use axum::Extension;
use axum_test::TestServer;
use reelrs::domain::harvest::ScrollConfig;
use reelrs::domain::services::harvest_service::{HarvestConfig, HarvestService};
use reelrs::engines::resource_filter::ResourceFilter;
use reelrs::presentation::routes;
use reelrs::utils::retry_policy::RetryPolicy;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> HarvestConfig {
    HarvestConfig {
        max_rounds: 4,
        scroll: ScrollConfig {
            pause_min: Duration::ZERO,
            pause_max: Duration::ZERO,
            ..ScrollConfig::default()
        },
        retry: RetryPolicy::new(1, Duration::ZERO),
        navigation_timeout: Duration::from_secs(5),
        settle_delay: Duration::ZERO,
        resource_filter: ResourceFilter::default(),
    }
}

fn server(web: &FakeWeb) -> TestServer {
    let service = Arc::new(HarvestService::new(web.launcher(), fast_config()));
    let app = routes::routes().layer(Extension(service));
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_missing_url_is_bad_request() {
    let web = site_with_items(3);
    let server = server(&web);

    let response = server.get("/api/ig/reels").expect_failure().await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "missing required query parameter: url");
    assert_eq!(web.launches(), 0);
}

#[tokio::test]
async fn test_non_listing_url_is_bad_request() {
    let web = site_with_items(3);
    let server = server(&web);

    let response = server
        .get("/api/ig/reels")
        .add_query_param("url", "https://example.com/foo")
        .expect_failure()
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("reels listing"));
    assert_eq!(web.launches(), 0);
}

#[tokio::test]
async fn test_not_a_url_is_bad_request() {
    let web = site_with_items(3);
    let server = server(&web);

    let response = server
        .get("/api/ig/reels")
        .add_query_param("url", "nasa reels")
        .expect_failure()
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(web.launches(), 0);
}

#[tokio::test]
async fn test_successful_harvest_returns_camel_case_result() {
    let web = site_with_items(4);
    let server = server(&web);

    let response = server
        .get("/api/ig/reels")
        .add_query_param("url", LISTING)
        .add_query_param("limit", "2")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["url"], LISTING);
    assert_eq!(body["count"], 2);
    assert!(body["crawledAt"].is_string());
    assert!(body.get("error").map(Value::is_null).unwrap_or(true));

    let first = &body["reels"][0];
    assert_eq!(first["shortCode"], "C001");
    assert_eq!(first["videoUrl"], "https://cdn.example.com/C001.mp4");
    assert_eq!(first["viewCount"], "1000");
    assert_eq!(first["link"], "https://www.instagram.com/reel/C001/");
    assert!(first.get("error").is_none());
}

#[tokio::test]
async fn test_non_numeric_limit_uses_default() {
    let web = site_with_items(25);
    let server = server(&web);

    let response = server
        .get("/api/ig/reels")
        .add_query_param("url", LISTING)
        .add_query_param("limit", "lots")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["count"], 20);
}

#[tokio::test]
async fn test_session_failure_is_internal_error_with_result() {
    let web = site_with_items(3).failing_launch();
    let server = server(&web);

    let response = server
        .get("/api/ig/reels")
        .add_query_param("url", LISTING)
        .expect_failure()
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["url"], LISTING);
    assert_eq!(body["count"], 0);
    assert_eq!(body["reels"], serde_json::json!([]));
    assert!(body["error"].as_str().unwrap().contains("chrome not found"));
}

#[tokio::test]
async fn test_listing_failure_is_internal_error() {
    let web = site_with_items(3).fail_navigation(LISTING, 10);
    let server = server(&web);

    let response = server
        .get("/api/ig/reels")
        .add_query_param("url", LISTING)
        .expect_failure()
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains(LISTING));
    assert_eq!(web.sessions_closed(), 1);
}

#[tokio::test]
async fn test_large_limit_is_clamped_to_maximum() {
    let web = site_with_items(105);
    let server = server(&web);

    for limit in ["500", "99999999999999999999"] {
        let response = server
            .get("/api/ig/reels")
            .add_query_param("url", LISTING)
            .add_query_param("limit", limit)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["count"], 100, "limit={}", limit);
    }
}

#[tokio::test]
async fn test_negative_overflow_limit_is_clamped_to_one() {
    let web = site_with_items(5);
    let server = server(&web);

    let response = server
        .get("/api/ig/reels")
        .add_query_param("url", LISTING)
        .add_query_param("limit", "-99999999999999999999")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
}
