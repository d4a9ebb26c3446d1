//! JSON webhook handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use bytes::Bytes;
use tracing::warn;

use crate::dto::response::HookAck;
use crate::handlers::process_detached;
use crate::state::AppState;

/// POST /get_hook
///
/// Every body is acknowledged, including ones that are not JSON or not a
/// known request type; failures are logged and reported by the relay.
pub async fn get_hook(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<HookAck> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Webhook body could not be read");
            return Json(HookAck::ok());
        }
    };

    let relay = state.relay.clone();
    process_detached(&state, "get_hook", async move {
        relay.handle_webhook(body).await
    })
    .await;

    Json(HookAck::ok())
}
