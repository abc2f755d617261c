mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{TestApp, UPLOAD_LIMIT};

#[tokio::test]
async fn portrait_upload_returns_413_for_oversized_body() {
    let t = TestApp::spawn("upload-limit").await;
    let cookie = t.sign_in("big@example.com").await;

    let mut oversized = b"\x89PNG\r\n\x1a\n".to_vec();
    oversized.resize(UPLOAD_LIMIT + 1024, 0);

    let resp = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/portraits")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(oversized))
                .expect("failed to build request"),
        )
        .await;

    assert_eq!(resp.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn portrait_upload_rejects_unknown_formats() {
    let t = TestApp::spawn("upload-format").await;
    let cookie = t.sign_in("gif@example.com").await;

    let resp = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/portraits")
                .header(header::COOKIE, &cookie)
                .body(Body::from(&b"GIF89a not allowed"[..]))
                .expect("failed to build request"),
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(resp.error_code(), "UNSUPPORTED_MEDIA");
}

#[tokio::test]
async fn portrait_upload_requires_sign_in() {
    let t = TestApp::spawn("upload-anon").await;
    let resp = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/portraits")
                .body(Body::from(&b"\x89PNG\r\n\x1a\n"[..]))
                .expect("failed to build request"),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
