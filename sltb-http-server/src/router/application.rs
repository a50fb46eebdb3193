use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;
use sltb_database::models::applications::ApplicationPatch;
use sltb_database::types::ApplicationKind;
use sltb_database::Store;
use sltb_lib::core::application;
use sltb_lib::core::auth::AuthenticatedUser;
use sltb_lib::core::SubmitApplicationInfo;
use sltb_lib::error::ApplicationError;

use super::{created, ok, ok_message};

/**
 * Submit a new application of the given kind
 *
 * # Arguments
 * @param kind: web::Path<ApplicationKind> - planting or replanting
 * @param info: web::Json<SubmitApplicationInfo> - The descriptive fields
 *
 * # Returns
 * @return HttpResponse - 201 with the id, reference number and total
 */
#[post("/{kind}")]
pub async fn submit(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
    kind: web::Path<ApplicationKind>,
    info: web::Json<SubmitApplicationInfo>,
) -> Result<HttpResponse, ApplicationError> {
    let kind = kind.into_inner();
    let submitted = application::submit(&store, kind, user.id, info.into_inner()).await?;
    let message = match kind {
        ApplicationKind::Planting => "Planting application submitted successfully",
        ApplicationKind::Replanting => "Replanting application submitted successfully",
    };
    Ok(created(message, submitted))
}

#[get("/{kind}")]
pub async fn list(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
    kind: web::Path<ApplicationKind>,
) -> Result<HttpResponse, ApplicationError> {
    let applications = application::list(&store, kind.into_inner(), user.id).await?;
    Ok(ok(json!({
        "count": applications.len(),
        "applications": applications,
    })))
}

#[get("/{kind}/{id}")]
pub async fn single(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<(ApplicationKind, i32)>,
) -> Result<HttpResponse, ApplicationError> {
    let (kind, id) = path.into_inner();
    let record = application::get(&store, kind, id, user.id).await?;
    Ok(ok(record))
}

/**
 * Partially update a pending application
 *
 * # Returns
 * @return HttpResponse - 400 when the application is not pending or nothing editable was sent
 */
#[put("/{kind}/{id}")]
pub async fn update(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<(ApplicationKind, i32)>,
    patch: web::Json<ApplicationPatch>,
) -> Result<HttpResponse, ApplicationError> {
    let (kind, id) = path.into_inner();
    application::update(&store, kind, id, user.id, patch.into_inner()).await?;
    Ok(ok_message("Application updated successfully"))
}

#[delete("/{kind}/{id}")]
pub async fn delete(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<(ApplicationKind, i32)>,
) -> Result<HttpResponse, ApplicationError> {
    let (kind, id) = path.into_inner();
    application::delete(&store, kind, id, user.id).await?;
    Ok(ok_message("Application deleted successfully"))
}
