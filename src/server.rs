//! HTTP Server - minimal HTTP/1.1 handling over tokio
//!
//! Routes:
//! - `POST /query`  run one question through the orchestrator
//! - `GET /health`  liveness
//! - `OPTIONS *`    CORS preflight
//!
//! All three result shapes go out as 200. A reasoning-service failure is a 503
//! naming the failed step; a malformed body or empty question is a 400.

use crate::error::{PipelineError, Result};
use crate::orchestrator::{QueryOrchestrator, QueryRequest};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REQUEST_BYTES: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            503 => "Service Unavailable",
            _ => "Internal Server Error",
        }
    }

    pub fn render(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: application/json\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {}",
            self.status,
            self.reason(),
            self.body.len(),
            self.body
        )
    }
}

/// Bind `bind_addr` and serve until ctrl-c
pub async fn run(bind_addr: &str, orchestrator: Arc<QueryOrchestrator>) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;

    tokio::select! {
        result = serve(listener, orchestrator) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    Ok(())
}

/// Accept connections forever, one task per connection
pub async fn serve(listener: TcpListener, orchestrator: Arc<QueryOrchestrator>) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "Server listening");

    loop {
        let (stream, addr) = listener.accept().await?;
        let orchestrator = Arc::clone(&orchestrator);
        let span = info_span!("request", id = %Uuid::new_v4(), peer = %addr);
        tokio::spawn(handle_connection(stream, orchestrator).instrument(span));
    }
}

async fn handle_connection(mut stream: TcpStream, orchestrator: Arc<QueryOrchestrator>) {
    let buffer = match timeout(READ_TIMEOUT, read_request(&mut stream)).await {
        Ok(Ok(buffer)) => buffer,
        Ok(Err(e)) => {
            warn!("Failed to read from stream: {}", e);
            return;
        }
        Err(_) => {
            warn!("Request read timeout");
            return;
        }
    };

    if buffer.is_empty() {
        return;
    }

    let response = match String::from_utf8(buffer) {
        Ok(request) => handle_request(&request, &orchestrator).await,
        Err(_) => HttpResponse::json(400, json!({"error": "request is not valid UTF-8"})),
    };

    if let Err(e) = stream.write_all(response.render().as_bytes()).await {
        error!("Failed to write response: {}", e);
    }
}

/// Read headers plus `Content-Length` bytes of body
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);

        if let Some(headers_end) = find_headers_end(&buffer) {
            let head = String::from_utf8_lossy(&buffer[..headers_end]);
            let content_length = extract_content_length(&head).unwrap_or(0);
            if buffer.len() >= headers_end + content_length {
                break;
            }
        }
        if buffer.len() > MAX_REQUEST_BYTES {
            break;
        }
    }
    Ok(buffer)
}

fn find_headers_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

fn extract_content_length(head: &str) -> Option<usize> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Route one raw HTTP request
pub async fn handle_request(request: &str, orchestrator: &QueryOrchestrator) -> HttpResponse {
    let request_line = request.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => (method, target),
        _ => return HttpResponse::json(400, json!({"error": "malformed request line"})),
    };

    let path = target.split('?').next().unwrap_or(target);
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    debug!(method, path, "Routing request");

    match (method, path) {
        ("POST", "/query") => {
            let body = request
                .find("\r\n\r\n")
                .map(|idx| &request[idx + 4..])
                .unwrap_or("");
            handle_query(body, orchestrator).await
        }
        ("GET", "/health") => HttpResponse::json(200, json!({"status": "ok"})),
        ("OPTIONS", _) => HttpResponse {
            status: 200,
            body: String::new(),
        },
        _ => HttpResponse::json(404, json!({"error": format!("Endpoint not found: {} {}", method, path)})),
    }
}

async fn handle_query(body: &str, orchestrator: &QueryOrchestrator) -> HttpResponse {
    let request = match serde_json::from_str::<QueryRequest>(body.trim())
        .map_err(|e| e.to_string())
        .and_then(|r| QueryRequest::new(r.question, r.schema).map_err(|e| e.to_string()))
    {
        Ok(request) => request,
        Err(message) => return HttpResponse::json(400, json!({"error": message})),
    };

    match orchestrator.run(&request).await {
        Ok(result) => {
            info!(outcome = result.outcome(), "Query handled");
            match serde_json::to_value(&result) {
                Ok(body) => HttpResponse::json(200, body),
                Err(e) => HttpResponse::json(500, json!({"error": format!("Failed to serialize response: {}", e)})),
            }
        }
        Err(err) => pipeline_error_response(&err),
    }
}

fn pipeline_error_response(err: &PipelineError) -> HttpResponse {
    if err.is_invalid_request() {
        return HttpResponse::json(400, json!({"error": err.source.to_string()}));
    }

    error!(stage = %err.stage, "Reasoning service failed: {}", err.source);
    let mut body = json!({
        "stage": err.stage,
        "reasoning_error": err.source.to_string(),
    });
    if let (Some(original_sql), Some(error)) = (&err.original_sql, &err.error) {
        body["original_sql"] = json!(original_sql);
        body["error"] = json!(error);
    }
    HttpResponse::json(503, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SqliteExecutor;
    use crate::provision::provision_demo_store;
    use crate::error::AutofixError;
    use crate::test_support::{ScriptedClient, TempDb};
    use serde_json::Value;

    fn orchestrator(replies: Vec<std::result::Result<&str, &str>>) -> (TempDb, QueryOrchestrator) {
        let db = TempDb::new();
        provision_demo_store(db.path()).unwrap();
        let orchestrator = QueryOrchestrator::new(
            Arc::new(ScriptedClient::new(replies)),
            Arc::new(SqliteExecutor::new(db.path())),
        );
        (db, orchestrator)
    }

    fn post(body: &str) -> String {
        format!(
            "POST /query HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[test]
    fn test_content_length_is_case_insensitive() {
        assert_eq!(extract_content_length("POST / HTTP/1.1\r\ncontent-length: 42\r\n"), Some(42));
        assert_eq!(extract_content_length("GET / HTTP/1.1\r\nHost: x\r\n"), None);
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n\r\nbody"), Some(18));
    }

    #[test]
    fn test_render_sets_length_and_cors() {
        let rendered = HttpResponse::json(200, json!({"status": "ok"})).render();
        assert!(rendered.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(rendered.contains("Content-Length: 15\r\n"));
        assert!(rendered.contains("Access-Control-Allow-Origin: *"));
        assert!(rendered.ends_with("\r\n\r\n{\"status\":\"ok\"}"));
    }

    #[tokio::test]
    async fn test_query_success_is_shape_a() {
        let (_db, orchestrator) = orchestrator(vec![Ok("SELECT username FROM users ORDER BY id")]);
        let response = handle_request(&post(r#"{"question":"list usernames","schema":null}"#), &orchestrator).await;

        assert_eq!(response.status, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"sql": "SELECT username FROM users ORDER BY id", "results": [["user1"], ["user2"]]}));
    }

    #[tokio::test]
    async fn test_empty_question_is_bad_request() {
        let (_db, orchestrator) = orchestrator(vec![]);
        let response = handle_request(&post(r#"{"question":"  "}"#), &orchestrator).await;
        assert_eq!(response.status, 400);

        let response = handle_request(&post("not json"), &orchestrator).await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_reasoning_failure_is_503_with_stage() {
        let (_db, orchestrator) = orchestrator(vec![Ok("SELECT nope FROM users"), Err("model offline")]);
        let response = handle_request(&post(r#"{"question":"list users"}"#), &orchestrator).await;

        assert_eq!(response.status, 503);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["stage"], "explain");
        assert_eq!(body["original_sql"], "SELECT nope FROM users");
        assert!(body["error"].as_str().unwrap().contains("no such column: nope"));
        assert!(body["reasoning_error"].as_str().unwrap().contains("model offline"));
    }

    #[tokio::test]
    async fn test_other_routes() {
        let (_db, orchestrator) = orchestrator(vec![]);

        let health = handle_request("GET /health HTTP/1.1\r\n\r\n", &orchestrator).await;
        assert_eq!(health.status, 200);

        let preflight = handle_request("OPTIONS /query HTTP/1.1\r\n\r\n", &orchestrator).await;
        assert_eq!(preflight.status, 200);
        assert!(preflight.body.is_empty());

        let missing = handle_request("GET /query HTTP/1.1\r\n\r\n", &orchestrator).await;
        assert_eq!(missing.status, 404);

        let garbage = handle_request("", &orchestrator).await;
        assert_eq!(garbage.status, 400);
    }

    #[tokio::test]
    async fn test_run_reports_unusable_bind_address() {
        let (_db, orchestrator) = orchestrator(vec![]);
        let err = run("not an address", Arc::new(orchestrator)).await.unwrap_err();
        assert!(matches!(err, AutofixError::Io(_)), "{:?}", err);
    }
}
