//! Client tests against an in-process stub of the backend API.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use recon_client::{BackendClient, ClientError, FailureKind};
use recon_core::domain::job::JobStatus;
use recon_core::domain::target::Target;
use recon_core::domain::tool::Tool;
use recon_core::dto::scan::StartScan;
use serde_json::{Value, json};
use uuid::Uuid;

const SCAN_A: &str = "00000000-0000-0000-0000-00000000000a";
const SCAN_B: &str = "00000000-0000-0000-0000-00000000000b";

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_list_scans_decodes_records() {
    let app = Router::new().route(
        "/scopetarget/{target}/scans/{tool}",
        get(|Path((_target, tool)): Path<(String, String)>| async move {
            if tool != "nuclei-screenshot" {
                return StatusCode::NOT_FOUND.into_response();
            }
            Json(json!([
                { "scan_id": SCAN_A, "status": "success", "created_at": "2025-03-01T10:00:00Z" },
                { "scan_id": SCAN_B, "status": "processing", "created_at": "2025-03-01T11:00:00Z" }
            ]))
            .into_response()
        }),
    );
    let client = BackendClient::new(spawn_backend(app).await);

    let records = client
        .list_scans(Uuid::new_v4(), Tool::NucleiScreenshot)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status, JobStatus::Processing);
    assert_eq!(records[1].id, SCAN_B.parse::<Uuid>().unwrap());
}

#[tokio::test]
async fn test_list_scans_skips_undecodable_records() {
    let app = Router::new().route(
        "/scopetarget/{target}/scans/{tool}",
        get(|| async {
            Json(json!([
                { "id": 17, "scan_id": SCAN_A, "status": "failed", "created_at": "2025-03-01T09:00:00Z" },
                { "scan_id": SCAN_A, "status": "failed", "created_at": null },
                { "scan_id": SCAN_B, "status": "completed", "created_at": "2025-03-01T11:00:00Z" }
            ]))
        }),
    );
    let client = BackendClient::new(spawn_backend(app).await);

    let records = client.list_scans(Uuid::new_v4(), Tool::Gau).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, SCAN_B.parse::<Uuid>().unwrap());
    assert_eq!(records[0].status, JobStatus::Completed);
}

#[tokio::test]
async fn test_list_scans_null_is_empty() {
    let app = Router::new().route(
        "/scopetarget/{target}/scans/{tool}",
        get(|| async { Json(Value::Null) }),
    );
    let client = BackendClient::new(spawn_backend(app).await);

    let records = client.list_scans(Uuid::new_v4(), Tool::Amass).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_list_scans_malformed_body_is_parse_error() {
    let app = Router::new().route(
        "/scopetarget/{target}/scans/{tool}",
        get(|| async { Json(json!({ "error": "not a list" })) }),
    );
    let client = BackendClient::new(spawn_backend(app).await);

    let err = client.list_scans(Uuid::new_v4(), Tool::Amass).await.unwrap_err();
    assert!(matches!(err, ClientError::ParseError(_)));
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_start_scan_sends_target_and_returns_scan_id() {
    let app = Router::new().route(
        "/{tool}/run",
        post(
            |Path(tool): Path<String>, Json(body): Json<Value>| async move {
                if tool == "amass" && body["fqdn"] == "example.com" {
                    Json(json!({ "scan_id": SCAN_A })).into_response()
                } else {
                    (StatusCode::BAD_REQUEST, "unexpected start request").into_response()
                }
            },
        ),
    );
    let client = BackendClient::new(spawn_backend(app).await);
    let target = Target::new(Uuid::new_v4(), "*.example.com");

    let started = client
        .start_scan(
            Tool::Amass,
            &StartScan::for_tool(Tool::Amass, &target, Default::default()),
        )
        .await
        .unwrap();

    assert_eq!(started.scan_id, SCAN_A.parse::<Uuid>().unwrap());
}

#[tokio::test]
async fn test_start_scan_server_error() {
    let app = Router::new().route(
        "/{tool}/run",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "tool binary missing") }),
    );
    let client = BackendClient::new(spawn_backend(app).await);
    let target = Target::new(Uuid::new_v4(), "example.com");

    let err = client
        .start_scan(
            Tool::Gau,
            &StartScan::for_tool(Tool::Gau, &target, Default::default()),
        )
        .await
        .unwrap_err();

    assert!(err.is_server_error());
    assert_eq!(err.kind(), FailureKind::Status);
    assert!(err.to_string().contains("tool binary missing"));
}

#[tokio::test]
async fn test_get_scan_keeps_detail_fields() {
    let app = Router::new().route(
        "/{tool}/{scan_id}",
        get(|Path((tool, scan_id)): Path<(String, String)>| async move {
            Json(json!({
                "scan_id": scan_id,
                "status": "success",
                "created_at": "2025-03-01T10:00:00Z",
                "result": "[{\"url\":\"https://a.example.com\"}]",
                "live_count": 1,
                "tool_echo": tool
            }))
        }),
    );
    let client = BackendClient::new(spawn_backend(app).await);

    let record = client
        .get_scan(Tool::Httpx, SCAN_A.parse().unwrap())
        .await
        .unwrap();

    assert_eq!(record.status, JobStatus::Success);
    assert!(record.result_ref.is_some());
    assert_eq!(record.extra["live_count"], 1);
    assert_eq!(record.extra["tool_echo"], "httpx");
}

#[tokio::test]
async fn test_consolidation_endpoints() {
    let app = Router::new()
        .route(
            "/consolidate-subdomains/{target}",
            get(|| async { Json(json!({ "count": 2 })) }),
        )
        .route(
            "/consolidated-subdomains/{target}",
            get(|| async { Json(json!({ "subdomains": ["a.example.com", "b.example.com"] })) }),
        )
        .route(
            "/scope-targets/{target}/target-urls",
            get(|| async { Json(json!([{ "url": "https://a.example.com" }])) }),
        );
    let client = BackendClient::new(spawn_backend(app).await);
    let target_id = Uuid::new_v4();

    client.consolidate(target_id).await.unwrap();
    let subdomains = client.consolidated_subdomains(target_id).await.unwrap();
    let urls = client.target_urls(target_id).await.unwrap();

    assert_eq!(subdomains, vec!["a.example.com", "b.example.com"]);
    assert_eq!(urls.len(), 1);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BackendClient::new(format!("http://{}", addr));
    let err = client.list_scans(Uuid::new_v4(), Tool::Ctl).await.unwrap_err();

    assert!(matches!(err, ClientError::RequestFailed(_)));
    assert_eq!(err.kind(), FailureKind::Transport);
}
