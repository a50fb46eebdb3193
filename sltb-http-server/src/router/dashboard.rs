use actix_web::{get, web, HttpResponse};
use sltb_database::Store;
use sltb_lib::core::auth::AuthenticatedUser;
use sltb_lib::core::{statistics as reports, ApplicationsQuery};
use sltb_lib::error::ApplicationError;

use super::ok;

#[get("/overview")]
pub async fn overview(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApplicationError> {
    Ok(ok(reports::overview(&store, user.id).await?))
}

/**
 * Paged listing of the caller's applications
 *
 * # Arguments
 * @param query: web::Query<ApplicationsQuery> - page, limit, status and type filters
 *
 * # Returns
 * @return HttpResponse - The rows and pagination numbers
 */
#[get("/applications")]
pub async fn applications(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
    query: web::Query<ApplicationsQuery>,
) -> Result<HttpResponse, ApplicationError> {
    Ok(ok(reports::applications_page(&store, user.id, query.into_inner()).await?))
}

#[get("/statistics")]
pub async fn statistics(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApplicationError> {
    Ok(ok(reports::dashboard_statistics(&store, user.id).await?))
}

#[get("/notifications")]
pub async fn notifications(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApplicationError> {
    Ok(ok(reports::notifications(&store, user.id).await?))
}
