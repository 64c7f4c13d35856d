use {
    crate::{context, utils::shorten_path},
    axum::{extract::Request, middleware::Next, response::Response},
    http::{Method, StatusCode},
    std::time::{Duration, Instant},
};

const PATH_WIDTH: usize = 30;

/// Emits one access line per request once the response is known.
pub(crate) async fn log_access(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let start = Instant::now();

    let response = next.run(req).await;

    write_access_line(response.status(), &method, &path, start.elapsed());
    response
}

/// `200 GET     /items                           1.25ms`
pub(crate) fn access_line(status: StatusCode, method: &Method, path: &str, elapsed: Duration) -> String {
    let path = shorten_path(path, PATH_WIDTH);
    format!(
        "{:<3} {:<7} {:<32} {:.2}ms",
        status.as_u16(),
        method.as_str(),
        path,
        elapsed.as_secs_f64() * 1000.0
    )
}

fn write_access_line(status: StatusCode, method: &Method, path: &str, elapsed: Duration) {
    let line = access_line(status, method, path, elapsed);
    let request_id = context::request_id().unwrap_or_default();
    let duration_ms = elapsed.as_secs_f64() * 1000.0;

    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), method = %method, path, duration_ms, request_id, "{line}");
    } else if status.is_client_error() {
        tracing::warn!(status = status.as_u16(), method = %method, path, duration_ms, request_id, "{line}");
    } else {
        tracing::info!(status = status.as_u16(), method = %method, path, duration_ms, request_id, "{line}");
    }
}
