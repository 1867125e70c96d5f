//! Request handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use wip_core::{
    detect_content_type, validate_upload, CreateItemRequest, Item, ListItemsQuery,
    ListItemsResponse, LocalFile, UpdateItemRequest, UploadFailure, UploadResponse, UploadedFile,
};

use crate::{ApiError, AppState};

/// Multipart field carrying uploaded files.
const FILES_FIELD: &str = "files";

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// List one page of items, newest first.
///
/// # Query Parameters
/// - `limit`: page size (default 20)
/// - `offset`: items to skip (default 0)
/// - `startDate`, `endDate`: inclusive RFC 3339 bounds on `created_at`
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<ListItemsResponse>, ApiError> {
    let req = query.into_request()?;
    Ok(Json(state.items.list(req).await?))
}

/// Create an item. Blank content and empty media normalize to null.
pub async fn create_item(
    State(state): State<AppState>,
    Json(body): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = state.items.create(body.normalized()).await?;
    info!(item_id = %item.id, "Created item");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<Item>, ApiError> {
    let item = state.items.update(id, body).await?;
    debug!(item_id = %id, "Updated item");
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.items.delete(id).await?;
    info!(item_id = %id, "Deleted item");
    Ok(Json(json!({ "success": true })))
}

/// Upload media files.
///
/// Every `files` part is handled on its own: rejected or failed files are
/// listed under `errors` while the rest are stored. A request without any
/// file part is a 400.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    let mut seen = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        seen += 1;

        let name = field.file_name().unwrap_or("upload").to_string();
        let claimed = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?;
        let mime = detect_content_type(&data, claimed.as_deref());

        if let Err(e) = validate_upload(&name, &mime, data.len() as u64) {
            let reason = match e {
                wip_core::Error::Validation { reason, .. } => reason,
                other => other.to_string(),
            };
            debug!(file = %name, mime = %mime, reason = %reason, "Rejected upload");
            errors.push(UploadFailure {
                file: name,
                error: reason,
            });
            continue;
        }

        let file = LocalFile::new(name, mime, data);
        match state.blobs.upload(&file).await {
            Ok(stored) => {
                info!(file = %file.name, path = %stored.path, "Stored upload");
                files.push(UploadedFile {
                    url: stored.url,
                    path: stored.path,
                    content_type: file.mime_type,
                });
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "Upload failed");
                errors.push(UploadFailure {
                    file: file.name,
                    error: e.to_string(),
                });
            }
        }
    }

    if seen == 0 {
        return Err(ApiError::BadRequest("No files provided".to_string()));
    }

    Ok(Json(UploadResponse {
        files,
        errors: if errors.is_empty() { None } else { Some(errors) },
    }))
}
