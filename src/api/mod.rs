pub mod metrics;
pub mod targets;

pub use metrics::get_metrics;
pub use targets::{list_targets, notification_status};

use actix_web::{HttpResponse, Responder};

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    }))
}
