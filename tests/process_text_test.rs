//! Text-to-sign endpoint driven through the router with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use signstream::assets::SignAssetMap;
use signstream::landmarks::MockLandmarkDetector;
use signstream::recognition::{LabelTable, MockSignModel, SignClassifier};
use signstream::refine::{MockRefiner, MockSynthesizer, SentenceFinalizer, Synthesizer};
use signstream::server::{AppState, build_router};
use signstream::session::{SessionConfig, SessionServices, SystemClock};
use std::sync::Arc;
use tower::ServiceExt;

fn state(refiner: MockRefiner, synthesizer: MockSynthesizer) -> AppState {
    let labels = Arc::new(LabelTable::from_labels(["hello"]));
    let assets = SignAssetMap::from_json(r#"{"hello": "hello.gif", "default": "unknown_sign.gif"}"#)
        .unwrap();

    AppState {
        services: SessionServices {
            detector: Arc::new(MockLandmarkDetector::new(Default::default())),
            classifier: SignClassifier::new(Arc::new(MockSignModel::new("mock")), labels),
            finalizer: SentenceFinalizer::new(
                Arc::new(refiner),
                Some(Arc::new(synthesizer) as Arc<dyn Synthesizer>),
            ),
            clock: Arc::new(SystemClock),
        },
        session: SessionConfig::default(),
        assets: Arc::new(assets),
        tts_dir: None,
    }
}

async fn post_text(state: AppState, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/process_text")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = build_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn uppercase_hello_resolves_to_hello_asset() {
    let state = state(MockRefiner::new().with_response("hello"), MockSynthesizer::new());

    let (status, body) = post_text(state, json!({"text": "HELLO"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["input_text"], "hello");
    assert_eq!(body["interpreted_text"], "hello");
    assert_eq!(body["sign_asset"], "hello.gif");
    assert_eq!(body["audio_path"], "tts/hello.wav");
}

#[tokio::test]
async fn unknown_text_gets_default_asset() {
    let state = state(MockRefiner::new(), MockSynthesizer::new());

    let (status, body) = post_text(state, json!({"text": "where is the library"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sign_asset"], "unknown_sign.gif");
}

#[tokio::test]
async fn refinement_failure_keeps_lowercased_input() {
    let state = state(MockRefiner::new().with_failure(), MockSynthesizer::new());

    let (status, body) = post_text(state, json!({"text": "Thank You"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interpreted_text"], "thank you");
    assert!(body["audio_path"].is_string());
}

#[tokio::test]
async fn synthesis_failure_returns_null_audio() {
    let state = state(MockRefiner::new(), MockSynthesizer::new().with_failure());

    let (status, body) = post_text(state, json!({"text": "hello"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sign_asset"], "hello.gif");
    assert!(body["audio_path"].is_null());
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let state = state(MockRefiner::new(), MockSynthesizer::new());

    let (status, body) = post_text(state, json!({"text": ""})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn oversized_text_is_rejected() {
    let state = state(MockRefiner::new(), MockSynthesizer::new());

    let (status, body) = post_text(state, json!({"text": "a".repeat(501)})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("500"));
}
