use actix_web::{web, HttpResponse, Responder};

use crate::state::{lock, AppState};

pub async fn list_targets(data: web::Data<AppState>) -> impl Responder {
    let state = lock(&data);
    let list: Vec<_> = state.sampler.targets().collect();

    HttpResponse::Ok().json(list)
}

pub async fn notification_status(data: web::Data<AppState>) -> impl Responder {
    let state = lock(&data);
    let status = state.sampler.notification_status();

    HttpResponse::Ok().json(status)
}
