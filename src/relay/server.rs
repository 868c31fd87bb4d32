//! HTTP-Oberfläche des Relays
//!
//! Ein Pfad pro Topic: `/{family}/{slot}`.
//! - `POST` reiht den Request-Body ein
//! - `GET` entnimmt die älteste Payload oder antwortet mit `404`

use super::mailbox::RelayState;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

// ============================================================================
// RELAY SERVER
// ============================================================================

/// HTTP-Server für den Signaling Relay
pub struct RelayServer {
    state: RelayState,
    addr: String,
}

impl RelayServer {
    /// Erstellt einen Server über einem bestehenden Relay-Zustand
    pub fn new(state: RelayState, addr: String) -> Self {
        Self { state, addr }
    }

    /// Router mit injiziertem Zustand
    pub fn router(&self) -> Router {
        Router::new()
            .route("/{family}/{slot}", get(consume_payload).post(publish_payload))
            .with_state(self.state.clone())
    }

    /// Bindet die Adresse und bedient Requests bis der Prozess endet
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("Failed to bind relay to {}", self.addr))?;
        self.serve(listener).await
    }

    /// Bedient Requests auf einem bereits gebundenen Listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr().context("Listener has no address")?;
        tracing::info!("Signaling relay listening on http://{}", local_addr);

        axum::serve(listener, self.router())
            .await
            .context("Relay server stopped")?;
        Ok(())
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn publish_payload(
    State(state): State<RelayState>,
    Path((family, slot)): Path<(String, String)>,
    body: Bytes,
) -> StatusCode {
    let topic = format!("{}/{}", family, slot);
    state.publish(&topic, body);
    StatusCode::OK
}

async fn consume_payload(
    State(state): State<RelayState>,
    Path((family, slot)): Path<(String, String)>,
) -> Response {
    let topic = format!("{}/{}", family, slot);
    match state.consume(&topic) {
        Some(payload) => {
            tracing::debug!("Delivered {} bytes from '{}'", payload.len(), topic);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/octet-stream")],
                payload,
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> (Router, RelayState) {
        let state = RelayState::new();
        let server = RelayServer::new(state.clone(), "127.0.0.1:0".to_string());
        (server.router(), state)
    }

    async fn get_body(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn post_body(app: &Router, uri: &str, body: &'static str) -> StatusCode {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json; charset=utf-8")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_get_on_empty_topic_is_not_found() {
        let (app, _state) = test_router();
        let (status, body) = get_body(&app, "/candidate/answer").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_post_then_get_in_order() {
        let (app, state) = test_router();
        assert_eq!(post_body(&app, "/sdp/offer", r#"{"type":"offer"}"#).await, StatusCode::OK);
        assert_eq!(post_body(&app, "/sdp/offer", "second").await, StatusCode::OK);
        assert_eq!(state.depth("sdp/offer"), 2);

        let (status, body) = get_body(&app, "/sdp/offer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"type":"offer"}"#);

        let (_, body) = get_body(&app, "/sdp/offer").await;
        assert_eq!(body, b"second");

        let (status, _) = get_body(&app, "/sdp/offer").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payload_is_opaque() {
        let (app, state) = test_router();
        state.publish("candidate/offer", Bytes::from_static(&[0xff, 0x00, 0xfe]));

        let (status, body) = get_body(&app, "/candidate/offer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, vec![0xff, 0x00, 0xfe]);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_rejected() {
        let (app, _state) = test_router();
        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/sdp/offer")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
