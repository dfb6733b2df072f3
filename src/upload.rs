use crate::errors::AppError;
use crate::models::UploadResponse;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Room for multipart boundaries and headers on top of the image itself.
pub const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;
pub const IMAGE_FIELD: &str = "image";
const TOO_LARGE: &str = "Image must be 5MB or smaller";

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Lowercased extension when the name ends in an accepted image type.
pub fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn generated_name(ext: &str, now: DateTime<Utc>) -> String {
    format!("{IMAGE_FIELD}-{}-{}.{ext}", now.timestamp_millis(), Uuid::new_v4().simple())
}

/// Stores the first `image` field of the form under a fresh name.
pub async fn save_image(upload_dir: &Path, mut multipart: Multipart) -> Result<UploadResponse, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        let ext = image_extension(&original).ok_or_else(|| AppError::bad_request("Only image files are allowed!"))?;

        let bytes = field.bytes().await.map_err(read_error)?;
        if bytes.is_empty() {
            return Err(AppError::bad_request("No image file provided"));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::bad_request(TOO_LARGE));
        }

        let filename = generated_name(&ext, Utc::now());
        fs::write(upload_dir.join(&filename), &bytes)
            .await
            .map_err(|err| AppError::persistence("image", err))?;
        info!(original = %original, stored = %filename, size = bytes.len(), "image uploaded");

        return Ok(UploadResponse {
            success: true,
            image_url: format!("/uploads/{filename}"),
            filename,
        });
    }

    Err(AppError::bad_request("No image file provided"))
}

/// A body cut off by the request size limit reads as an oversized image.
fn read_error(err: MultipartError) -> AppError {
    too_large_or(err.status(), || AppError::from(err))
}

fn too_large_or(status: StatusCode, other: impl FnOnce() -> AppError) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::bad_request(TOO_LARGE)
    } else {
        other()
    }
}
