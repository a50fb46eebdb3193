use actix_web::{
    error::{InternalError, JsonPayloadError, PathError},
    get, web, HttpRequest, HttpResponse, Responder, ResponseError,
};
use serde::Serialize;
use serde_json::json;
use sltb_lib::error::ApplicationError;

use crate::middleware::auth::BearerAuth;

pub mod application;
pub mod auth;
pub mod dashboard;
pub mod officer;
pub mod reference;

/// Return server health status
#[get("/health")]
pub async fn health() -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().body("OK"))
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

pub fn ok_message(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "message": message }))
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "message": message, "data": data }))
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(json!({ "success": true, "message": message, "data": data }))
}

/// Malformed JSON bodies answer in the standard envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        let response = ApplicationError::invalid_field("body", &err.to_string()).error_response();
        InternalError::from_response(err, response).into()
    })
}

/// Path segments that do not parse (unknown kind, non-numeric id) are not found.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: PathError, _req: &HttpRequest| {
        let response = ApplicationError::NotFound("Route not found".to_string()).error_response();
        InternalError::from_response(err, response).into()
    })
}

pub async fn not_found() -> HttpResponse {
    ApplicationError::NotFound("Route not found".to_string()).error_response()
}

/// Registers every route. Private scopes sit behind `BearerAuth`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(
            web::scope("/api/auth")
                .service(auth::signup)
                .service(auth::signin)
                .service(
                    web::resource("/me")
                        .wrap(BearerAuth)
                        .route(web::get().to(auth::me)),
                ),
        )
        .service(
            web::scope("/api/reference")
                .service(reference::track)
                .service(reference::search)
                .service(reference::statistics),
        )
        .service(
            web::scope("/api/applications")
                .wrap(BearerAuth)
                .service(application::submit)
                .service(application::list)
                .service(application::single)
                .service(application::update)
                .service(application::delete),
        )
        .service(
            web::scope("/api/dashboard")
                .wrap(BearerAuth)
                .service(dashboard::overview)
                .service(dashboard::applications)
                .service(dashboard::statistics)
                .service(dashboard::notifications),
        )
        .service(
            web::scope("/api/officer")
                .wrap(BearerAuth)
                .service(officer::transition)
                .service(officer::comments),
        );
}
