//! Liveness surface. Shares nothing with the poll loop except one flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

pub const SERVICE_NAME: &str = "OLX Sniper Bot";

/// Set by the poll task while it is running; read by the health handlers.
#[derive(Debug, Clone, Default)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn set_running(&self, running: bool) {
        self.0.store(running, Ordering::Release);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Sets the flag until the returned guard is dropped, so a loop that
    /// panics or is aborted stops reporting itself as running.
    #[must_use]
    pub fn mark_running(&self) -> RunningGuard {
        self.set_running(true);
        RunningGuard(self.clone())
    }
}

pub struct RunningGuard(Liveness);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.set_running(false);
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    service: &'static str,
    timestamp: String,
    bot_running: bool,
    version: &'static str,
}

fn health_response(liveness: &Liveness) -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        bot_running: liveness.is_running(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[get("/")]
async fn index(liveness: web::Data<Liveness>) -> impl Responder {
    health_response(&liveness)
}

#[get("/health")]
async fn health(liveness: web::Data<Liveness>) -> impl Responder {
    health_response(&liveness)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(health);
}

/// Serves `GET /` and `GET /health` on `0.0.0.0:port` until the process stops.
///
/// # Errors
///
/// Returns the bind or server I/O error.
pub async fn serve(port: u16, liveness: Liveness) -> std::io::Result<()> {
    info!(port, "starting liveness server");
    let data = web::Data::new(liveness);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}
