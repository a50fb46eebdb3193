use actix_web::{get, post, web, HttpResponse};
use sltb_database::Store;
use sltb_lib::core::{statistics as reports, tracking, SearchInfo};
use sltb_lib::error::ApplicationError;

use super::ok;

/**
 * Public tracking report of one reference number
 *
 * # Arguments
 * @param reference_no: web::Path<String> - The issued reference number
 *
 * # Returns
 * @return HttpResponse - The application summary and its status timeline, 404 when unknown
 */
#[get("/track/{reference_no}")]
pub async fn track(
    store: web::Data<Store>,
    reference_no: web::Path<String>,
) -> Result<HttpResponse, ApplicationError> {
    let report = tracking::track(&store, &reference_no).await?;
    Ok(ok(report))
}

#[post("/search")]
pub async fn search(
    store: web::Data<Store>,
    info: web::Json<SearchInfo>,
) -> Result<HttpResponse, ApplicationError> {
    let response = tracking::search(&store, info.into_inner()).await?;
    Ok(ok(response))
}

#[get("/statistics")]
pub async fn statistics(store: web::Data<Store>) -> Result<HttpResponse, ApplicationError> {
    let figures = reports::public_statistics(&store).await?;
    Ok(ok(figures))
}
