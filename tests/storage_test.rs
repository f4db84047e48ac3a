//! Storage sink tests: JSON-lines files and the webhook bridge

use chrono::{TimeZone, Utc};
use newsgrab::models::{CleanArticle, TabularRow};
use newsgrab::storage::{ArticleSink, JsonLinesSink, WebhookSink, WebhookSinkConfig};
use newsgrab::utils::retry::RetryPolicy;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article(n: usize) -> CleanArticle {
    CleanArticle {
        source_url: "https://www.example.com/feed".to_string(),
        title: format!("Title {n}"),
        link: format!("https://www.example.com/a/{n}"),
        published_at: Some(Utc.with_ymd_and_hms(2024, 5, n as u32, 8, 0, 0).unwrap()),
        summary: format!("Summary {n}"),
        body: None,
        extracted_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    }
}

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::with_delays(max_retries, 10, 20)
}

#[tokio::test]
async fn test_jsonl_writes_one_row_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonLinesSink::new(dir.path(), "cleaned", "daily_news");
    let articles: Vec<_> = (1..=3).map(article).collect();

    let receipt = sink.write(&articles).await.unwrap();
    assert_eq!(receipt.sink, "jsonl");
    assert_eq!(receipt.rows, 3);
    assert_eq!(sink.path(), dir.path().join("cleaned").join("daily_news.jsonl"));

    let content = std::fs::read_to_string(sink.path()).unwrap();
    let rows: Vec<TabularRow> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].title, "Title 1");
    assert_eq!(rows[0].date, "2024-05-01");
    assert_eq!(rows[0].source, "example.com");
    assert_eq!(rows[2].link, "https://www.example.com/a/3");
}

#[tokio::test]
async fn test_jsonl_replaces_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonLinesSink::new(dir.path(), "cleaned", "daily_news");

    sink.write(&[article(1), article(2), article(3)]).await.unwrap();
    sink.write(&[article(4)]).await.unwrap();

    let content = std::fs::read_to_string(sink.path()).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("Title 4"));
}

#[tokio::test]
async fn test_jsonl_empty_batch_leaves_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonLinesSink::new(dir.path(), "cleaned", "empty");

    let receipt = sink.write(&[]).await.unwrap();
    assert_eq!(receipt.rows, 0);
    assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), "");
}

#[tokio::test]
async fn test_webhook_posts_headers_and_rows_with_bearer() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exec"))
        .and(header("authorization", "Bearer sheet-token"))
        .and(body_partial_json(serde_json::json!({
            "headers": ["Title", "Date", "Source", "Link", "Summary"],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = WebhookSinkConfig::new(format!("{}/exec", mock_server.uri()))
        .with_auth_token("sheet-token")
        .with_retry(fast_retry(2));
    let sink = WebhookSink::new(config).unwrap();

    let receipt = sink.write(&[article(1), article(2)]).await.unwrap();
    assert_eq!(receipt.sink, "webhook");
    assert_eq!(receipt.rows, 2);

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    assert_eq!(body["rows"][1]["title"], "Title 2");
}

#[tokio::test]
async fn test_webhook_retries_transient_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config =
        WebhookSinkConfig::new(format!("{}/exec", mock_server.uri())).with_retry(fast_retry(2));
    let sink = WebhookSink::new(config).unwrap();

    assert!(sink.write(&[article(1)]).await.is_ok());
}

#[tokio::test]
async fn test_webhook_client_error_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad sheet"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config =
        WebhookSinkConfig::new(format!("{}/exec", mock_server.uri())).with_retry(fast_retry(3));
    let sink = WebhookSink::new(config).unwrap();

    let err = sink.write(&[article(1)]).await.unwrap_err();
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn test_webhook_rejects_bad_url() {
    assert!(WebhookSink::new(WebhookSinkConfig::new("sheets.example.com/exec")).is_err());
}
