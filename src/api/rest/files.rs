use std::convert::Infallible;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Multipart, Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::info;
use uuid::Uuid;

use crate::api::extract::Path;
use crate::error::AppError;
use crate::models::file::File;
use crate::state::AppState;

pub const FILE_FIELD: &str = "file";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/files", post(upload_file))
        .route("/files/:path", get(download_file))
}

async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    if path.starts_with('.') || path.contains(['/', '\\']) {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    let served: Result<_, Infallible> = ServeFile::new(state.config.uploads_dir.join(&path))
        .oneshot(request)
        .await;
    match served {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<File>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_owned)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::BadRequest("file field has no file name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("failed to read upload: {err}")))?;

        let stored_name = stored_file_name(&original_name);
        let uploads_dir = &state.config.uploads_dir;
        tokio::fs::create_dir_all(uploads_dir)
            .await
            .map_err(|err| AppError::Internal(format!("failed to create uploads dir: {err}")))?;
        tokio::fs::write(uploads_dir.join(&stored_name), &bytes)
            .await
            .map_err(|err| AppError::Internal(format!("failed to store upload: {err}")))?;

        let file = state.store.files.insert_with(|id| {
            File::new(id, original_name, stored_name, &state.config.app_url)
        });

        info!(file_id = file.id, path = %file.path, size = bytes.len(), "file uploaded");

        return Ok(Json(file));
    }

    Err(AppError::BadRequest(format!(
        "multipart body has no `{FILE_FIELD}` field"
    )))
}

/// Random name that keeps the original extension.
fn stored_file_name(original_name: &str) -> String {
    let extension = FsPath::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();

    format!("{}{}", Uuid::new_v4().simple(), extension)
}
