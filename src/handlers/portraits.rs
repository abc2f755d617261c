use crate::middleware::SignedIn;
use crate::{ForgeError, router::ForgeState};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

/// Sniff the image type from its leading bytes.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// POST /api/portraits -> raw PNG/JPEG/WebP body.
pub async fn upload_portrait(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    body: Bytes,
) -> Result<impl IntoResponse, ForgeError> {
    let Some(mime) = detect_image_mime(&body) else {
        return Err(ForgeError::UnsupportedMedia(
            "upload a PNG, JPEG or WebP image".to_string(),
        ));
    };
    let size = body.len();
    let id = state
        .forge
        .store_upload(&account.email, mime, body.to_vec())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "mime": mime, "size": size })),
    ))
}

/// GET /api/portraits/{id} -> image bytes.
pub async fn get_portrait(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ForgeError> {
    let portrait = state.forge.owned_portrait(&account.email, id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, portrait.mime),
            (header::CACHE_CONTROL, "private, max-age=86400".to_string()),
        ],
        portrait.bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_supported_formats() {
        assert_eq!(detect_image_mime(b"\x89PNG\r\n\x1a\nrest"), Some("image/png"));
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(detect_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(detect_image_mime(b"GIF89a"), None);
        assert_eq!(detect_image_mime(b""), None);
    }
}
