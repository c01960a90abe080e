//! Axum router: streaming endpoint, text-to-sign endpoint, health and audio files.

use crate::assets::SignAssetMap;
use crate::server::protocol::{ErrorBody, HealthResponse, OutboundMessage, TextRequest, TextResponse};
use crate::session::{SessionConfig, SessionCoordinator, SessionServices};
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use futures_util::{SinkExt, StreamExt, future};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const OUTBOUND_BUFFER: usize = 64;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: SessionServices,
    pub session: SessionConfig,
    pub assets: Arc<SignAssetMap>,
    /// Directory served under `/tts`, if any.
    pub tts_dir: Option<PathBuf>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(health_handler))
        .route("/process_text", post(process_text_handler))
        .route("/ws/sign_detect", get(ws_handler));

    if let Some(dir) = &state.tts_dir {
        router = router.nest_service("/tts", ServeDir::new(dir));
    }

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn unprocessable(detail: String) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorBody { detail })).into_response()
}

/// GET /
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::online())
}

/// POST /process_text
///
/// Lowercases the input, refines it, resolves its sign asset and speaks it.
/// Collaborator failures degrade to the input text and a null audio path.
async fn process_text_handler(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return unprocessable(rejection.body_text()),
    };
    if let Err(e) = request.validate() {
        tracing::debug!(error = %e, "Rejected text request");
        return unprocessable(e.to_string());
    }

    let input_text = request.text.to_lowercase();
    let finalizer = &state.services.finalizer;
    let interpreted_text = finalizer.refine(&input_text).await;
    let sign_asset = state.assets.resolve(&interpreted_text).to_string();
    let audio_path = finalizer.speak(&interpreted_text).await;

    tracing::info!(input = %input_text, interpreted = %interpreted_text, asset = %sign_asset, "Processed text request");

    Json(TextResponse {
        input_text,
        interpreted_text,
        sign_asset,
        audio_path,
    })
    .into_response()
}

/// GET /ws/sign_detect
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run one streaming session over a WebSocket.
///
/// Binary and text messages are both frame payloads. A close frame or a
/// transport error ends the inbound stream.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_BUFFER);
    let coordinator = SessionCoordinator::new(state.services.clone(), state.session.clone());
    let session_id = coordinator.id();
    tracing::info!(session = %session_id, "WebSocket client connected");

    let writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(session = %session_id, error = %e, "Failed to encode outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        if let Err(e) = ws_tx.close().await {
            tracing::trace!(session = %session_id, error = %e, "WebSocket already closed");
        }
    });

    let inbound = ws_rx
        .take_while(|msg: &Result<Message, axum::Error>| {
            future::ready(matches!(msg, Ok(m) if !matches!(m, Message::Close(_))))
        })
        .filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Binary(bytes)) => Some(bytes.to_vec()),
                Ok(Message::Text(text)) => Some(text.as_str().as_bytes().to_vec()),
                _ => None,
            })
        });

    let summary = coordinator.run(inbound, out_tx).await;

    if let Err(e) = writer.await {
        tracing::error!(session = %session_id, error = %e, "WebSocket writer failed");
    }
    tracing::info!(session = %session_id, end = ?summary.end, "WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::MockLandmarkDetector;
    use crate::recognition::{LabelTable, MockSignModel, SignClassifier};
    use crate::refine::{MockRefiner, SentenceFinalizer};
    use crate::session::SystemClock;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn make_state() -> AppState {
        let labels = Arc::new(LabelTable::from_labels(["hello"]));
        AppState {
            services: SessionServices {
                detector: Arc::new(MockLandmarkDetector::new(Default::default())),
                classifier: SignClassifier::new(Arc::new(MockSignModel::new("mock")), labels),
                finalizer: SentenceFinalizer::new(Arc::new(MockRefiner::new()), None),
                clock: Arc::new(SystemClock),
            },
            session: SessionConfig::default(),
            assets: Arc::new(SignAssetMap::default()),
            tts_dir: None,
        }
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_reports_online() {
        let app = build_router(make_state());
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp).await;
        assert_eq!(parsed["status"], "online");
        assert_eq!(parsed["message"], "Real-time Sign Translator Ready");
    }

    #[tokio::test]
    async fn process_text_without_tts_has_null_audio() {
        let app = build_router(make_state());
        let req = Request::builder()
            .method("POST")
            .uri("/process_text")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "Good Morning"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp).await;
        assert_eq!(parsed["input_text"], "good morning");
        assert_eq!(parsed["interpreted_text"], "good morning");
        assert_eq!(parsed["sign_asset"], "unknown_sign.gif");
        assert!(parsed["audio_path"].is_null());
    }

    #[tokio::test]
    async fn process_text_missing_field_is_unprocessable() {
        let app = build_router(make_state());
        let req = Request::builder()
            .method("POST")
            .uri("/process_text")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message": "hi"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(resp).await["detail"].is_string());
    }

    #[tokio::test]
    async fn ws_endpoint_requires_upgrade() {
        let app = build_router(make_state());
        let req = Request::builder()
            .uri("/ws/sign_detect")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build_router(make_state());
        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
