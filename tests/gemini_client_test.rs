mod common;

use std::{sync::Arc, time::Duration};

use common::RecordingSleeper;
use mockito::Matcher;
use serde_json::json;
use trip_planner_rs::{
    is_overload_error, GeminiClient, GenerationClient, ItineraryRequest, PlannerError,
    RetryPolicy, TripPlanner,
};

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn client_for(server: &mockito::Server) -> GeminiClient {
    GeminiClient::new(Some("test-key".to_string()), Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.url())
}

fn text_reply(text: &str) -> String {
    json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }],
        "usageMetadata": { "totalTokenCount": 42 }
    })
    .to_string()
}

#[tokio::test]
async fn sends_prompt_with_system_instruction() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_query(Matcher::Any)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""text":"3 days in Seoul""#.to_string()),
            Matcher::Regex(r#""systemInstruction""#.to_string()),
            Matcher::Regex("generate_itinerary".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(text_reply(r#"{"destination":"Seoul"}"#))
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let request = ItineraryRequest::new("3 days in Seoul").unwrap();
    let text = client.generate(&request).await.unwrap();

    assert_eq!(text, r#"{"destination":"Seoul"}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn attaches_image_as_inline_data() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""mimeType":"image/png""#.to_string()),
            Matcher::Regex(r#""data":"AQID""#.to_string()),
        ]))
        .with_status(200)
        .with_body(text_reply("{}"))
        .create_async()
        .await;

    let client = client_for(&server);
    let request = ItineraryRequest::new("Match this vibe")
        .unwrap()
        .with_image(vec![1, 2, 3], Some("image/png".to_string()));
    client.generate(&request).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn overload_status_is_classified_as_transient() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body(
            json!({
                "error": {
                    "code": 503,
                    "message": "The model is overloaded. Please try again later.",
                    "status": "UNAVAILABLE"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .generate(&ItineraryRequest::new("Busy day").unwrap())
        .await
        .unwrap_err();

    assert!(is_overload_error(&err));
    assert!(err.to_string().starts_with("HTTP 503 UNAVAILABLE"));
}

#[tokio::test]
async fn client_error_keeps_provider_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(
            json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client_for(&server)
        .generate(&ItineraryRequest::new("Bad key").unwrap())
        .await
        .unwrap_err();

    assert!(!is_overload_error(&err));
    match err {
        PlannerError::Upstream(message) => assert_eq!(
            message,
            "HTTP 400 INVALID_ARGUMENT: API key not valid. Please pass a valid API key."
        ),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn falls_back_to_fragments_from_all_candidates() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "candidates": [
                    { "finishReason": "SAFETY" },
                    { "content": { "parts": [{ "text": "{\"destination\":" }, { "text": "\"Oslo\"}" }] } }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let text = client_for(&server)
        .generate(&ItineraryRequest::new("Fjords").unwrap())
        .await
        .unwrap();

    assert_eq!(text, "{\"destination\":\n\"Oslo\"}");
}

#[tokio::test]
async fn garbled_envelope_is_an_upstream_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"candidates": "nope"}"#)
        .create_async()
        .await;

    let err = client_for(&server)
        .generate(&ItineraryRequest::new("Anything").unwrap())
        .await
        .unwrap_err();

    match err {
        PlannerError::Upstream(message) => {
            assert!(message.contains("Unexpected generateContent response at candidates"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn transport_failure_does_not_expose_key() {
    let client = GeminiClient::new(Some("SUPERSECRETKEY123".to_string()), Duration::from_secs(2))
        .unwrap()
        .with_base_url("http://127.0.0.1:1");

    let err = client
        .generate(&ItineraryRequest::new("Anywhere").unwrap())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("HTTP request failed"), "{message}");
    assert!(!message.contains("SUPERSECRETKEY123"), "{message}");
    assert!(!format!("{err:?}").contains("SUPERSECRETKEY123"));
    assert!(!err.to_error_payload().to_string().contains("SUPERSECRETKEY123"));
}

#[tokio::test]
async fn missing_key_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = GeminiClient::new(None, Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.url());
    let planner = TripPlanner::new(Arc::new(client));

    let err = planner.plan_trip_text("Lisbon").await.unwrap_err();
    assert!(matches!(err, PlannerError::Configuration(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn planner_retries_real_client_until_exhausted() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body(r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#)
        .expect(3)
        .create_async()
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let planner = TripPlanner::new(Arc::new(client_for(&server)))
        .with_retry_policy(RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
        })
        .with_sleeper(sleeper.clone());

    let err = planner.plan_trip_text("Peak season").await.unwrap_err();

    assert!(matches!(err, PlannerError::ServiceOverloaded));
    assert_eq!(sleeper.delays().len(), 2);
    mock.assert_async().await;
}
