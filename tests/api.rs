use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use moltpulse::app::{PulseError, Result};
use moltpulse::domain::{ExtractionTier, Post};
use moltpulse::scraper::{Crawler, Harvest, PostSource};
use moltpulse::server::router;
use moltpulse::service::{today, ReportService};
use moltpulse::store::{self, KvStore, MemoryStore, StoreConfig, HISTORY_KEY};

struct Offline;

#[async_trait]
impl PostSource for Offline {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn harvest(&self) -> Result<Harvest> {
        Err(PulseError::Crawl("network unreachable".into()))
    }
}

struct Canned;

#[async_trait]
impl PostSource for Canned {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn harvest(&self) -> Result<Harvest> {
        let mut post = Post::placeholder("p1", "https://www.moltbook.com/post/p1".into());
        post.title = "Shared memory between agents".into();
        post.comments = 4;
        Ok(Harvest {
            posts: vec![post],
            submolts: vec![],
            tier: ExtractionTier::NextData,
        })
    }
}

fn app_with(source: Box<dyn PostSource>) -> (Router, Arc<MemoryStore>) {
    let kv = Arc::new(MemoryStore::new());
    let crawler = Crawler::new(vec![source], "https://www.moltbook.com");
    let service = ReportService::new(kv.clone(), Arc::new(crawler), StoreConfig::default());
    (router(Arc::new(service)), kv)
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app_with(Box::new(Offline));
    let (status, body) = send(app, Method::GET, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_latest_falls_back_to_mock() {
    let (app, kv) = app_with(Box::new(Offline));
    let (status, body) = send(app, Method::GET, "/api/data?type=latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], today());
    assert_eq!(body["topIssues"].as_array().unwrap().len(), 20);
    assert_eq!(body["stats"]["totalPosts"], 30);

    // The mock is persisted under today's key
    assert!(store::load_report(kv.as_ref(), &today()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_no_query_means_latest() {
    let (app, _) = app_with(Box::new(Offline));
    let (status, body) = send(app, Method::GET, "/api/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], today());
}

#[tokio::test]
async fn test_empty_date_means_latest() {
    let (app, _) = app_with(Box::new(Offline));
    let (status, body) = send(app, Method::GET, "/api/data?date=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], today());
    assert_eq!(body["topIssues"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_history_lists_dates() {
    let (app, kv) = app_with(Box::new(Offline));
    kv.lpush(HISTORY_KEY, &json!("2026-01-30")).await.unwrap();
    kv.lpush(HISTORY_KEY, &json!("2026-01-31")).await.unwrap();

    let (status, body) = send(app, Method::GET, "/api/data?type=history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["2026-01-31", "2026-01-30"]));
}

#[tokio::test]
async fn test_report_by_date() {
    let (app, kv) = app_with(Box::new(Offline));
    let report = moltpulse::report::mock_report("2026-01-15", 7).unwrap();
    store::save_report(kv.as_ref(), &report).await.unwrap();

    let (status, body) = send(app.clone(), Method::GET, "/api/data?date=2026-01-15").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2026-01-15");
    assert_eq!(body["timestamp"], 7);

    let (status, body) = send(app.clone(), Method::GET, "/api/data?date=2026-01-16").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Report not found"}));

    let (status, body) = send(app, Method::GET, "/api/data?date=next-tuesday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid date"}));
}

#[tokio::test]
async fn test_trends_cover_a_week() {
    let (app, _) = app_with(Box::new(Offline));
    let (status, body) = send(app, Method::GET, "/api/trends").await;

    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert_eq!(points[6]["date"], today());
    for point in points {
        let heat = point["Memory System"].as_f64().unwrap();
        assert!((50.0..=99.9).contains(&heat));
        assert!(point["Night Operations"].is_number());
    }
}

#[tokio::test]
async fn test_crawl_stores_report() {
    let (app, kv) = app_with(Box::new(Canned));
    let (status, body) = send(app, Method::POST, "/api/crawl").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["date"], today());
    assert_eq!(body["report"]["topIssues"][0]["id"], "memorySystem");
    assert_eq!(body["report"]["stats"]["totalComments"], 4);

    assert_eq!(kv.llen(HISTORY_KEY).await.unwrap(), 1);
}

#[tokio::test]
async fn test_crawl_with_site_down_still_succeeds_with_mock() {
    let (app, _) = app_with(Box::new(Offline));
    let (status, body) = send(app, Method::POST, "/api/crawl").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["stats"]["totalPosts"], 30);
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let (app, _) = app_with(Box::new(Offline));
    let (status, body) = send(app.clone(), Method::GET, "/api/crawl").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "Method not allowed"}));

    let (status, _) = send(app, Method::DELETE, "/api/data").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = app_with(Box::new(Offline));
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/data")
                .header(header::ORIGIN, "https://dashboard.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
