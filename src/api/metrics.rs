use actix_web::{web, HttpResponse, Responder};

use crate::metrics::MetricsRegistry;

/// Prometheus text exposition of the values from the latest cycle.
pub async fn get_metrics(metrics: web::Data<MetricsRegistry>) -> impl Responder {
    match metrics.render() {
        Ok(metrics_text) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(metrics_text),
        Err(e) => {
            log::error!("Failed to render metrics: {}", e);
            HttpResponse::InternalServerError().body("Failed to render metrics")
        }
    }
}
