#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use envseal_crypto::{DigestLedger, EnvelopeBuilder, test_keys};
use envseal_verifyd::routes::{AppState, build_router};

const BOUNDARY: &str = "envseal-test-boundary";
const PAYLOAD: &[u8] = b"aaa,10,2015-10-29,,,";

/// A ledger holding one envelope recorded under `U1`.
fn seeded_ledger() -> (tempfile::TempDir, DigestLedger) {
    let dir = tempfile::tempdir().unwrap();
    let ledger = DigestLedger::new(dir.path().join("dataSums.store"));
    EnvelopeBuilder::new(test_keys::sender_keys(), ledger.clone())
        .build_with_id("U1", PAYLOAD)
        .unwrap();
    (dir, ledger)
}

fn app(ledger: DigestLedger, max_upload_bytes: usize) -> axum::Router {
    build_router(AppState {
        ledger: Arc::new(ledger),
        max_upload_bytes,
    })
}

fn multipart_body(id: Option<&str>, file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(id) = id {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"dataId\"\r\n\r\n{id}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"dataFile\"; \
                 filename=\"data.csv\"\r\nContent-Type: text/csv\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Post a checksum form and return (status, body text).
async fn post_checksum(app: axum::Router, body: Vec<u8>) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri("/checksum")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn index_serves_upload_form() {
    let (_dir, ledger) = seeded_ledger();
    let resp = app(ledger, 1024)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("<form"), "should contain the upload form");
    assert!(text.contains("multipart/form-data"));
}

#[tokio::test]
async fn matching_payload_succeeds() {
    let (_dir, ledger) = seeded_ledger();
    let (status, text) = post_checksum(
        app(ledger, 1024),
        multipart_body(Some("U1"), Some(b"aaa,10,2015-10-29,,,\n")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("<strong>Success</strong>"), "{text}");
    assert!(text.contains("U1"));
}

#[tokio::test]
async fn altered_payload_is_mismatch() {
    let (_dir, ledger) = seeded_ledger();
    let (status, text) = post_checksum(
        app(ledger, 1024),
        multipart_body(Some("U1"), Some(b"aaa,11,2015-10-29,,,")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("<strong>Failed</strong>"));
    assert!(text.contains("mismatch"));
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let (_dir, ledger) = seeded_ledger();
    let (status, text) =
        post_checksum(app(ledger, 1024), multipart_body(Some("U2"), Some(PAYLOAD))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("not found"));
}

#[tokio::test]
async fn empty_id_is_bad_request() {
    let (_dir, ledger) = seeded_ledger();
    let (status, text) =
        post_checksum(app(ledger, 1024), multipart_body(Some("  "), Some(PAYLOAD))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("data id is empty"));
}

#[tokio::test]
async fn missing_file_is_bad_request() {
    let (_dir, ledger) = seeded_ledger();
    let (status, text) = post_checksum(app(ledger, 1024), multipart_body(Some("U1"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("dataFile"));
}

#[tokio::test]
async fn oversized_upload_is_rejected_not_truncated() {
    let (_dir, ledger) = seeded_ledger();
    // The first 20 bytes alone would match the recorded digest.
    let mut upload = PAYLOAD.to_vec();
    upload.extend_from_slice(&[b'x'; 100]);
    let (status, text) = post_checksum(
        app(ledger, PAYLOAD.len()),
        multipart_body(Some("U1"), Some(&upload)),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!text.contains("<strong>Success</strong>"));
}

#[tokio::test]
async fn request_beyond_body_limit_is_rejected() {
    let (_dir, ledger) = seeded_ledger();
    let upload = vec![b'x'; 200 * 1024];
    let (status, _) =
        post_checksum(app(ledger, 16), multipart_body(Some("U1"), Some(&upload))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn unreadable_ledger_is_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = DigestLedger::new(dir.path().to_path_buf());
    let (status, text) =
        post_checksum(app(ledger, 1024), multipart_body(Some("U1"), Some(PAYLOAD))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(text.contains("ledger unavailable"));
}

#[tokio::test]
async fn markup_in_id_is_escaped() {
    let (_dir, ledger) = seeded_ledger();
    let (_, text) = post_checksum(
        app(ledger, 1024),
        multipart_body(Some("<script>x</script>"), Some(PAYLOAD)),
    )
    .await;
    assert!(!text.contains("<script>"));
    assert!(text.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn get_checksum_is_method_not_allowed() {
    let (_dir, ledger) = seeded_ledger();
    let resp = app(ledger, 1024)
        .oneshot(
            Request::builder()
                .uri("/checksum")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
