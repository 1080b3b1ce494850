//! Oracle HTTP Integration Tests
//!
//! Exercises the Gemini client against a mock server: success, rate
//! limiting, timeouts, HTTP failures and malformed bodies.

use std::sync::Arc;
use std::time::Duration;

use casewarden::adapters::{GeminiOracle, GenerationConfig, Oracle, OracleError};
use casewarden::core::assistant::{
    request_corrections, request_freeform_answer, request_summary, DEGRADED_SERVICE_MESSAGE,
    EMPTY_ANSWER_MESSAGE, NO_SUMMARY_MESSAGE,
};
use casewarden::core::{ReconcileMode, Reconciler, RetryPolicy};
use casewarden::domain::NAME_COLUMNS;
use casewarden::parse_csv;
use httpmock::prelude::*;
use serde_json::json;

const API_PATH: &str = "/v1beta/models/gemini-1.5-pro:generateContent";

fn oracle(server: &MockServer) -> GeminiOracle {
    GeminiOracle::new("test-key").with_base_url(server.base_url())
}

fn answer(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
}

#[tokio::test]
async fn test_corrections_round_trip() {
    let server = MockServer::start_async().await;
    let model_text = "```json\n{\"correctionResults\":[{\"originalName\":\"rajesh\",\"suggestedName\":\"Rajesh\",\"hasCorrection\":true,\"reason\":\"Capitalization\"}]}\n```";

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(API_PATH)
                .query_param("key", "test-key")
                .body_includes("rajesh")
                .body_includes("maxOutputTokens");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(answer(model_text));
        })
        .await;

    let corrections = request_corrections(
        &oracle(&server),
        &GenerationConfig::default(),
        &["rajesh".to_string()],
    )
    .await
    .unwrap();

    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].suggested_name, "Rajesh");
    assert!(corrections[0].has_correction);
    mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries_then_degrades() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(API_PATH);
            then.status(429)
                .json_body(json!({"error": {"code": 429, "message": "Resource exhausted"}}));
        })
        .await;

    let data = parse_csv("Case Title,Crime\nA,Theft\nB,Fraud\n", "cases.csv").unwrap();
    let reply = request_freeform_answer(
        &oracle(&server),
        &GenerationConfig::default(),
        &RetryPolicy::immediate(3),
        &data.dataset,
        "How many thefts?",
    )
    .await;

    assert_eq!(reply, DEGRADED_SERVICE_MESSAGE);
    // 1 initial + 2 retries
    mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(API_PATH);
            then.status(500).body("internal");
        })
        .await;

    let data = parse_csv("Case Title\nA\n", "cases.csv").unwrap();
    let reply = request_freeform_answer(
        &oracle(&server),
        &GenerationConfig::default(),
        &RetryPolicy::immediate(3),
        &data.dataset,
        "Anything?",
    )
    .await;

    assert!(reply.starts_with("Error: Oracle returned HTTP 500"), "reply: {}", reply);
    assert!(reply.ends_with("Please try again with a different question."));
    mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_timeout_is_distinct() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(API_PATH);
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(answer("late"));
        })
        .await;

    let slow = oracle(&server).with_timeout(Duration::from_millis(50));
    let err = slow
        .generate("prompt", &GenerationConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, OracleError::Timeout { .. }), "err: {:?}", err);
}

#[tokio::test]
async fn test_missing_answer_path_is_empty() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(API_PATH);
            then.status(200).json_body(json!({"candidates": []}));
        })
        .await;

    let oracle = oracle(&server);
    let config = GenerationConfig::default();

    let summary = request_summary(&oracle, &config, "[]").await.unwrap();
    assert_eq!(summary, NO_SUMMARY_MESSAGE);

    let data = parse_csv("Case Title\nA\n", "cases.csv").unwrap();
    let reply =
        request_freeform_answer(&oracle, &config, &RetryPolicy::immediate(3), &data.dataset, "?")
            .await;
    assert_eq!(reply, EMPTY_ANSWER_MESSAGE);

    let err = request_corrections(&oracle, &config, &["rajesh".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::Malformed(_)));
}

#[tokio::test]
async fn test_undecodable_body_is_malformed() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(API_PATH);
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let err = oracle(&server)
        .generate("prompt", &GenerationConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, OracleError::Malformed(_)), "err: {:?}", err);
}

#[tokio::test]
async fn test_reconcile_falls_back_when_rate_limited() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(API_PATH);
            then.status(429);
        })
        .await;

    let csv = "Accused First Name,Accused Last Name,Inspector In charge\nrajesh,kumar,Insp. Verma\n";
    let data = parse_csv(csv, "cases.csv").unwrap().dataset;

    let reconciler = Reconciler::default()
        .with_oracle(Arc::new(oracle(&server)), GenerationConfig::default());
    let outcome = reconciler.reconcile(&data, &NAME_COLUMNS).await.unwrap();

    assert_eq!(outcome.mode, ReconcileMode::LocalFallback);
    assert_eq!(outcome.correction_table.len(), 2);
    assert_eq!(outcome.correction_table[0].suggested_value, "Rajesh");
    assert_eq!(outcome.correction_table[1].suggested_value, "Kumar");
}
