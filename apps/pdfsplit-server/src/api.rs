//! API handlers for the pdfsplit server
//!
//! Provides REST endpoints for:
//! - Bookmark export (PDF -> ZIP of per-depth CSVs)
//! - CSV-driven split (PDF + CSV -> ZIP of PDF fragments)
//! - Health check

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::Multipart,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use pdfsplit_core::{export_bookmarks_zip, split_pdf_by_csv, PdfSplitError};

use crate::error::ApiError;

pub const BOOKMARKS_ARCHIVE: &str = "bookmarks_by_depth.zip";
pub const SPLIT_ARCHIVE: &str = "chapters.zip";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfsplit",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /api/bookmarks/zip
///
/// Multipart field `pdf`.
pub async fn handle_export_bookmarks(multipart: Multipart) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let pdf = form.take("pdf")?;

    info!("Bookmark export request: pdf={} bytes", pdf.len());

    let archive = run_blocking(move || export_bookmarks_zip(&pdf)).await?;
    Ok(zip_response(archive, BOOKMARKS_ARCHIVE))
}

/// Handler: POST /api/split
///
/// Multipart fields `pdf` and `csvfile`.
pub async fn handle_split(multipart: Multipart) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let pdf = form.take("pdf")?;
    let csv = form.take("csvfile")?;

    info!(
        "Split request: pdf={} bytes, csv={} bytes",
        pdf.len(),
        csv.len()
    );

    let archive = run_blocking(move || split_pdf_by_csv(&pdf, &csv)).await?;
    Ok(zip_response(archive, SPLIT_ARCHIVE))
}

/// Uploaded multipart fields, read fully into memory
struct UploadForm {
    fields: HashMap<String, Bytes>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
        })? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let data = field.bytes().await.map_err(|e| {
                ApiError::BadRequest(format!("Failed to read field '{}': {}", name, e))
            })?;

            debug!("Received field '{}' ({} bytes)", name, data.len());
            fields.insert(name, data);
        }

        Ok(Self { fields })
    }

    fn take(&mut self, name: &str) -> Result<Bytes, ApiError> {
        self.fields
            .remove(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Missing multipart field '{}'", name)))
    }
}

/// PDF work is CPU-bound; keep it off the async worker threads
async fn run_blocking<F>(job: F) -> Result<Vec<u8>, ApiError>
where
    F: FnOnce() -> Result<Vec<u8>, PdfSplitError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::Internal(format!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn zip_response(archive: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        archive,
    )
        .into_response()
}
