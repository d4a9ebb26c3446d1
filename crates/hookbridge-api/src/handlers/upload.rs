//! Multipart upload webhook handler.

use std::path::{Path, PathBuf};

use axum::Json;
use axum::extract::State;
use axum::extract::multipart::{Field, Multipart, MultipartError, MultipartRejection};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use hookbridge_core::error::{AppError, ErrorKind};
use hookbridge_core::result::AppResult;
use hookbridge_service::Payload;

use crate::dto::response::HookAck;
use crate::handlers::process_detached;
use crate::state::AppState;

/// Form part carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// A multipart form whose file part has been written to the spool.
#[derive(Debug)]
pub struct SpooledForm {
    /// Text fields of the form.
    pub payload: Payload,
    /// Spooled copy of the file part.
    pub file: PathBuf,
}

/// POST /upload_hook
///
/// The form is spooled while the request is still open; mapping and
/// transmission then run detached. The sender is always acknowledged.
pub async fn upload_hook(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<HookAck> {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Upload is not a multipart form");
            return Json(HookAck::ok());
        }
    };

    match spool_form(&state.spool_dir(), multipart).await {
        Ok(form) => {
            let relay = state.relay.clone();
            process_detached(&state, "upload_hook", async move {
                relay.handle_upload(form.payload, form.file).await
            })
            .await;
        }
        Err(e) => {
            error!(kind = %e.kind, error = %e, "Upload could not be spooled");
        }
    }

    Json(HookAck::ok())
}

/// Read every part of `multipart`, writing the file part under `spool_dir`.
///
/// On failure nothing is left behind in the spool.
pub async fn spool_form(spool_dir: &Path, mut multipart: Multipart) -> AppResult<SpooledForm> {
    let mut payload = Payload::default();
    let mut file: Option<PathBuf> = None;

    let result = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == FILE_FIELD {
                if file.is_some() {
                    debug!("Ignoring extra file part");
                    continue;
                }
                let path = spool_dir.join(Uuid::new_v4().to_string());
                file = Some(path.clone());
                let written = write_field(field, &path).await?;
                debug!(file = %path.display(), bytes = written, "Upload spooled");
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                payload.insert(name, value);
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    match (result, file) {
        (Ok(()), Some(file)) => Ok(SpooledForm { payload, file }),
        (Ok(()), None) => Err(AppError::missing_field(FILE_FIELD)),
        (Err(e), spooled) => {
            if let Some(path) = spooled {
                discard_spooled(&path).await;
            }
            Err(e)
        }
    }
}

async fn discard_spooled(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(file = %path.display(), "Partial upload discarded"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            file = %path.display(),
            error = %e,
            "Failed to discard partial upload"
        ),
    }
}

async fn write_field(mut field: Field<'_>, path: &Path) -> AppResult<u64> {
    let mut out = tokio::fs::File::create(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("cannot create spool file {}: {e}", path.display()),
            e,
        )
    })?;
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.flush().await?;
    Ok(written)
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::new(
        ErrorKind::InvalidField,
        format!("malformed multipart body: {}", e.body_text()),
    )
}
