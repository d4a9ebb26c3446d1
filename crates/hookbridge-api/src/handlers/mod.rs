//! HTTP request handlers.

pub mod health;
pub mod hook;
pub mod upload;

use std::future::Future;

use tracing::{error, warn};

use hookbridge_core::result::AppResult;

use crate::state::AppState;

/// Run webhook processing on its own task and wait for it up to the
/// configured timeout.
///
/// The task is detached from the request: if the client disconnects or the
/// timeout passes, processing still runs through EndEvent. Outcomes are
/// reported by the relay itself, so only task failures are logged here.
pub(crate) async fn process_detached<F>(state: &AppState, source: &'static str, work: F)
where
    F: Future<Output = AppResult<String>> + Send + 'static,
{
    let task = tokio::spawn(work);
    let limit = state.processing_timeout();
    match tokio::time::timeout(limit, task).await {
        Ok(Ok(_)) => {}
        Ok(Err(join_err)) => {
            error!(source, error = %join_err, "Webhook processing task failed");
        }
        Err(_) => {
            warn!(
                source,
                timeout_secs = limit.as_secs(),
                "Webhook still processing, acknowledging sender"
            );
        }
    }
}
