/// Media upload, download and listing endpoints
use crate::{
    context::AppContext,
    error::{MediaError, MediaResult},
    object_store::StorageRef,
    registry::{MediaRecord, Pagination},
};
use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Default page size for the listing endpoint
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Build media routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/files/upload", post(upload_files))
        .route("/api/files", get(list_files))
        .route("/files/:storage_ref", get(download_file))
}

/// Per-file descriptor returned by the upload and listing endpoints
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub mime_type: String,
    pub size: i64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<MediaRecord> for FileDescriptor {
    fn from(record: MediaRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            url: record.url,
            mime_type: record.mime_type,
            size: record.size_bytes,
            uploaded_at: record.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub files: Vec<FileDescriptor>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub files: Vec<FileDescriptor>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Upload a multipart batch of media files.
///
/// Files are handled in submission order. A failed file aborts the
/// rest of the batch but leaves earlier files committed.
async fn upload_files(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> MediaResult<impl IntoResponse> {
    let max_file_size = ctx.media.max_file_size();
    let max_batch_files = ctx.config.upload.max_batch_files;
    let mut files = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| MediaError::Multipart(e.to_string()))?
    {
        // Non-file fields are ignored
        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };

        if files.len() >= max_batch_files {
            return Err(MediaError::Validation(format!(
                "Too many files in one batch (max {})",
                max_batch_files
            )));
        }

        let mime_type = field
            .content_type()
            .map(String::from)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        // Reject before reading any payload bytes
        ctx.media.validate_upload(&filename, &mime_type)?;

        // Pull the field incrementally; an oversized file is rejected
        // as soon as the ceiling is crossed, not after full buffering
        let mut data = Vec::new();
        while let Some(piece) = field
            .chunk()
            .await
            .map_err(|e| MediaError::Multipart(e.to_string()))?
        {
            if data.len() + piece.len() > max_file_size {
                return Err(MediaError::PayloadTooLarge {
                    limit: max_file_size,
                });
            }
            data.extend_from_slice(&piece);
        }

        let record = ctx.media.store_file(&filename, &mime_type, data).await?;
        files.push(FileDescriptor::from(record));
    }

    if files.is_empty() {
        return Err(MediaError::Validation("No files provided".to_string()));
    }

    Ok((StatusCode::CREATED, Json(UploadResponse { files })))
}

/// Stream a stored file back to the client.
///
/// Bytes flow straight from the object store's read stream into the
/// response body; the store only produces as fast as the client
/// consumes, and a disconnect drops the stream mid-flight.
async fn download_file(
    State(ctx): State<AppContext>,
    Path(storage_ref): Path<String>,
) -> MediaResult<Response> {
    let storage_ref = StorageRef::new(storage_ref);
    let (reader, record) = ctx.media.open_download(&storage_ref).await?;

    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(record) = record {
        builder = builder.header(header::CONTENT_TYPE, record.mime_type);
    }
    if let Some(length) = reader.length {
        builder = builder.header(header::CONTENT_LENGTH, length.to_string());
    }

    builder
        .body(Body::from_stream(reader.stream))
        .map_err(|e| MediaError::Internal(format!("Failed to build response: {}", e)))
}

/// List uploaded files, newest first
async fn list_files(
    State(ctx): State<AppContext>,
    Query(params): Query<ListParams>,
) -> MediaResult<Json<ListResponse>> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let listing = ctx.media.list_files(page, limit).await?;

    Ok(Json(ListResponse {
        files: listing.files.into_iter().map(FileDescriptor::from).collect(),
        pagination: listing.pagination,
    }))
}
