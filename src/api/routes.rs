// src/api/routes.rs
use actix_web::web;
use super::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health_check))
            .route("/form", web::get().to(handlers::get_form))
            .service(
                web::scope("/rows")
                    .route("", web::post().to(handlers::add_row))
                    .route("/{index}", web::delete().to(handlers::remove_row))
            )
            .route("/predict", web::post().to(handlers::predict))
            .route("/result", web::get().to(handlers::get_result))
    );
}
