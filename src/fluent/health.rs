//! Liveness and readiness health checks.

use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde::Serialize,
    std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::{Instant, SystemTime},
    },
};

/// Process lifecycle as the health checks report it.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    started_at: Instant,
    shutting_down: AtomicBool,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Instant::now(),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub(crate) fn begin_shutdown(&self) {
        if !self.shutting_down.swap(true, Ordering::AcqRel) {
            tracing::info!("Readiness withdrawn, shutdown in progress");
        }
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Seconds since the router was created, rounded to milliseconds.
    fn uptime(&self) -> f64 {
        (self.started_at.elapsed().as_secs_f64() * 1000.0).round() / 1000.0
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LivenessReport {
    alive: bool,
    uptime: f64,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct ReadinessReport {
    ready: bool,
}

/// `{"alive": true, "uptime": 12.345, "timestamp": "..."}`, always `200`.
pub(crate) async fn liveness(lifecycle: Arc<Lifecycle>) -> Json<LivenessReport> {
    Json(LivenessReport {
        alive: !lifecycle.is_shutting_down(),
        uptime: lifecycle.uptime(),
        timestamp: humantime::format_rfc3339_millis(SystemTime::now()).to_string(),
    })
}

/// `{"ready": true}` with `200`, or `{"ready": false}` with `503` while shutting down.
pub(crate) async fn readiness(lifecycle: Arc<Lifecycle>) -> Response {
    let ready = !lifecycle.is_shutting_down();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadinessReport { ready })).into_response()
}
