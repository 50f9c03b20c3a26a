// API integration tests that drive the Axum router with real HTTP requests

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{cell_text, read_sheet, report_page, PlainTextExtractor};
use hiac_extract::api::{create_router, AppState, XLSX_CONTENT_TYPE};
use hiac_extract::services::BatchService;
use http_body_util::BodyExt; // For `.collect()`
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot`

const BOUNDARY: &str = "hiac-test-boundary";

fn test_router() -> Router {
    let batch_service =
        BatchService::new(Arc::new(PlainTextExtractor)).expect("Failed to build service");
    create_router(AppState {
        batch_service,
        default_file_name: "extracted_info".to_string(),
        max_upload_bytes: 1024 * 1024,
    })
}

fn multipart_body(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, files: &[(&str, Vec<u8>)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_records_endpoint_returns_records_in_upload_order() {
    let files = vec![
        ("a.pdf", report_page("FIRST", "L1", "op").into_bytes()),
        ("b.pdf", report_page("SECOND", "L2", "op").into_bytes()),
    ];
    let response = test_router()
        .oneshot(upload_request("/api/v1/reports/records", &files))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["material"], "FIRST");
    assert_eq!(records[1]["material"], "SECOND");
    assert_eq!(records[0]["average_counts"]["1.5"], "1234.5");
}

#[tokio::test]
async fn test_export_endpoint_returns_named_workbook() {
    let files = vec![("run.pdf", report_page("ABC123", "LOT99", "JDoe").into_bytes())];
    let response = test_router()
        .oneshot(upload_request(
            "/api/v1/reports/export?template=aggregate&file_name=lot%3A99",
            &files,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        XLSX_CONTENT_TYPE
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"lot99.xlsx\""
    );
    assert_eq!(response.headers()["x-diagnostic-count"], "0");

    let sheet = read_sheet(&body_bytes(response).await);
    assert_eq!(cell_text(&sheet, 1, 0), "ABC123");
    assert_eq!(cell_text(&sheet, 1, 1), "LOT99");
}

#[tokio::test]
async fn test_export_detail_template_uses_fixed_name() {
    let files = vec![("run.pdf", report_page("ABC123", "LOT99", "JDoe").into_bytes())];
    let response = test_router()
        .oneshot(upload_request("/api/v1/reports/export?template=detail", &files))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Harmonised_DAA_format.xlsx\""
    );
    let sheet = read_sheet(&body_bytes(response).await);
    assert_eq!(sheet.width(), 14);
}

#[tokio::test]
async fn test_export_without_documents_is_unprocessable() {
    // Only a text field, no files
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"comment\"\r\n\r\n\
         no reports today\r\n\
         --{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/reports/export")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Nothing to export"));
}

#[tokio::test]
async fn test_export_unreadable_documents_is_unprocessable() {
    let files = vec![("blank.pdf", b"   ".to_vec())];
    let response = test_router()
        .oneshot(upload_request("/api/v1/reports/export", &files))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
