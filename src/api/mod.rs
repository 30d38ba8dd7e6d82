// HTTP surface
// Thin plumbing over the scan pipeline: routing, submission parsing
// (multipart or JSON), permissive CORS, and client-error mapping.
// Provider failures never surface here; they arrive pre-degraded.

use crate::models::ScanSubmission;
use crate::services::scan::{ScanError, ScanPipeline};
use bytes::{Bytes, BytesMut};
use hyper::body::HttpBody;
use hyper::header::CONTENT_TYPE;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

const ENGINE_BANNER: &str = "VERITAS Reasoning Engine v1.0";

#[derive(Clone)]
pub struct ApiState {
    pipeline: Arc<ScanPipeline>,
    max_request_bytes: usize,
}

impl ApiState {
    pub fn new(pipeline: Arc<ScanPipeline>, max_request_bytes: usize) -> Self {
        Self {
            pipeline,
            max_request_bytes,
        }
    }
}

pub async fn serve(addr: SocketAddr, state: ApiState) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(move |_| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(handle_request(state, req).await) }
            }))
        }
    });

    info!(%addr, "listening");
    hyper::Server::bind(&addr)
        .serve(make_svc)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

async fn handle_request(state: ApiState, req: Request<Body>) -> Response<Body> {
    if req.method() == Method::OPTIONS {
        return preflight_response();
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (&method, path.as_str()) {
        (&Method::GET, "/") => json_response(
            StatusCode::OK,
            &serde_json::json!({"status": "online", "engine": ENGINE_BANNER}),
        ),
        (&Method::POST, "/scan") => handle_submit(state, req).await,
        _ => match path.strip_prefix("/scan/") {
            Some(rest) if !rest.is_empty() => handle_scan_route(state, &method, rest).await,
            _ => error_response(StatusCode::NOT_FOUND, "Not found"),
        },
    }
}

async fn handle_scan_route(state: ApiState, method: &Method, rest: &str) -> Response<Body> {
    let (scan_id, tail) = match rest.split_once('/') {
        Some((id, tail)) => (id, Some(tail)),
        None => (rest, None),
    };

    let result = match (method, tail) {
        (&Method::GET, None) => state.pipeline.get(scan_id).map(|r| to_json_body(&r)),
        (&Method::GET, Some("deep_dive")) => {
            state.pipeline.deep_dive(scan_id).map(|r| to_json_body(&r))
        }
        (&Method::POST, Some("supreme_court")) => match state.pipeline.adjudicate(scan_id).await {
            Ok(outcome) => Ok(to_json_body(&outcome)),
            Err(e) => Err(e),
        },
        (&Method::POST, Some("firewall_reconstruction")) => {
            state.pipeline.reconstruct(scan_id).map(|r| to_json_body(&r))
        }
        _ => return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    };

    match result {
        Ok(body) => json_body_response(StatusCode::OK, body),
        Err(e) => scan_error_response(&e),
    }
}

async fn handle_submit(state: ApiState, req: Request<Body>) -> Response<Body> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = match read_body_limited(req.into_body(), state.max_request_bytes).await {
        Ok(body) => body,
        Err(status) => return error_response(status, "Request body rejected"),
    };

    let submission = if content_type.starts_with("multipart/form-data") {
        match parse_multipart(&content_type, body).await {
            Ok(submission) => submission,
            Err(detail) => return error_response(StatusCode::BAD_REQUEST, &detail),
        }
    } else {
        match serde_json::from_slice::<ScanSubmission>(&body) {
            Ok(submission) => submission,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {}", e))
            }
        }
    };

    match state.pipeline.submit(&submission).await {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => scan_error_response(&e),
    }
}

/// Pull the three known fields out of a multipart form. Uploaded file
/// bytes are drained and dropped; only the filename travels onward.
async fn parse_multipart(content_type: &str, body: Bytes) -> Result<ScanSubmission, String> {
    let boundary =
        multer::parse_boundary(content_type).map_err(|e| format!("Invalid multipart body: {}", e))?;
    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut submission = ScanSubmission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid multipart body: {}", e))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("text_content") => {
                submission.text_content = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("Invalid multipart body: {}", e))?,
                );
            }
            Some("url") => {
                submission.url = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("Invalid multipart body: {}", e))?,
                );
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "upload".to_string());
                let _ = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Invalid multipart body: {}", e))?;
                submission.file_name = Some(name);
            }
            other => {
                warn!(field = ?other, "ignoring unknown multipart field");
                let _ = field.bytes().await;
            }
        }
    }
    Ok(submission)
}

async fn read_body_limited(body: Body, max: usize) -> Result<Bytes, StatusCode> {
    let mut body = body;
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|_| StatusCode::BAD_REQUEST)?;
        if buf.len() + chunk.len() > max {
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn scan_error_response(err: &ScanError) -> Response<Body> {
    let status = match err {
        ScanError::EmptySubmission => StatusCode::BAD_REQUEST,
        ScanError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    error_response(status, &err.to_string())
}

fn to_json_body(value: &impl Serialize) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec())
}

fn json_response(status: StatusCode, value: &impl Serialize) -> Response<Body> {
    json_body_response(status, to_json_body(value))
}

fn json_body_response(status: StatusCode, body: Vec<u8>) -> Response<Body> {
    with_cors(
        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json"),
    )
    .body(Body::from(body))
    .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn error_response(status: StatusCode, detail: &str) -> Response<Body> {
    json_response(status, &serde_json::json!({"detail": detail}))
}

fn preflight_response() -> Response<Body> {
    with_cors(Response::builder().status(StatusCode::NO_CONTENT))
        .body(Body::empty())
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn with_cors(builder: hyper::http::response::Builder) -> hyper::http::response::Builder {
    builder
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock_provider::MockProvider;
    use crate::services::providers::ProviderChain;

    fn test_state() -> ApiState {
        let provider = Arc::new(MockProvider::new(
            "primary",
            serde_json::json!({
                "deception_score": 82,
                "risk_category": "narrative",
                "confidence_score": 0.91,
                "explanation_summary": "emotional escalation detected"
            }),
        ));
        let chain = ProviderChain::new(vec![provider]);
        ApiState::new(Arc::new(ScanPipeline::new(chain)), 1024 * 1024)
    }

    async fn body_json(resp: Response<Body>) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let resp = handle_request(
            test_state(),
            Request::builder().uri("/").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "online");
        assert_eq!(json["engine"], "VERITAS Reasoning Engine v1.0");
    }

    #[tokio::test]
    async fn test_json_scan_submission_round_trip() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/scan")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text_content":"Breaking: market crash confirmed"}"#))
            .unwrap();

        let resp = handle_request(state.clone(), req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["score"], 82);
        assert_eq!(json["category"], "Narrative");
        assert_eq!(json["status"], "escalated");
        assert_eq!(json["routing_decision"][0], "Sovereigner Sentiment Analysis");

        let id = json["id"].as_str().unwrap().to_string();
        let req = Request::builder()
            .uri(format!("/scan/{}", id))
            .body(Body::empty())
            .unwrap();
        let resp = handle_request(state, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_empty_submission_is_400() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/scan")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = handle_request(test_state(), req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["detail"].as_str().unwrap().contains("No content supplied"));
    }

    #[tokio::test]
    async fn test_unknown_scan_is_404_with_detail() {
        let req = Request::builder()
            .uri("/scan/scan_missing")
            .body(Body::empty())
            .unwrap();
        let resp = handle_request(test_state(), req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["detail"], "Scan not found");
    }

    #[tokio::test]
    async fn test_multipart_submission_with_file_placeholder() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"text_content\"\r\n\r\nhello world claim\r\n--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"clip.mp4\"\r\nContent-Type: video/mp4\r\n\r\n\x00\x01\x02\r\n--{b}--\r\n",
            b = boundary
        );
        let req = Request::builder()
            .method(Method::POST)
            .uri("/scan")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let resp = handle_request(test_state(), req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "escalated");
    }

    #[tokio::test]
    async fn test_phase_endpoints_on_live_scan() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/scan")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text_content":"claim"}"#))
            .unwrap();
        let json = body_json(handle_request(state.clone(), req).await).await;
        let id = json["id"].as_str().unwrap().to_string();

        let resp = handle_request(
            state.clone(),
            Request::builder()
                .uri(format!("/scan/{}/deep_dive", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let dd = body_json(resp).await;
        assert_eq!(dd["phase2_category"], "Narrative");
        assert!(dd["results"]["sentiment_amplification_score"].is_number());

        let resp = handle_request(
            state.clone(),
            Request::builder()
                .method(Method::POST)
                .uri(format!("/scan/{}/firewall_reconstruction", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rec = body_json(resp).await;
        assert!(rec["latency_ms"].is_number());
        assert!(rec["revert_action"].is_string());
    }

    #[tokio::test]
    async fn test_preflight_gets_cors_headers() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/scan")
            .body(Body::empty())
            .unwrap();
        let resp = handle_request(test_state(), req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/scan/scan_x/deep_dive")
            .body(Body::empty())
            .unwrap();
        let resp = handle_request(test_state(), req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
