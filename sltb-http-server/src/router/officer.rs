use actix_web::{put, web, HttpResponse};
use sltb_database::types::ApplicationKind;
use sltb_database::Store;
use sltb_lib::core::auth::AuthenticatedUser;
use sltb_lib::core::{application, tracking, CommentsInfo, TransitionInfo};
use sltb_lib::error::ApplicationError;

use super::{ok_message, ok_with_message};

/**
 * Move an application along its lifecycle
 *
 * # Arguments
 * @param path: web::Path<(ApplicationKind, i32)> - Kind and id of the application
 * @param info: web::Json<TransitionInfo> - Target status and optional comments
 *
 * # Returns
 * @return HttpResponse - The application after the change; 403 for non-officers
 */
#[put("/applications/{kind}/{id}/status")]
pub async fn transition(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<(ApplicationKind, i32)>,
    info: web::Json<TransitionInfo>,
) -> Result<HttpResponse, ApplicationError> {
    user.require_officer()?;
    let (kind, id) = path.into_inner();
    let record = application::transition(&store, kind, id, info.into_inner()).await?;
    Ok(ok_with_message("Application status updated", record))
}

#[put("/reference/{reference_no}/comments")]
pub async fn comments(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
    reference_no: web::Path<String>,
    info: web::Json<CommentsInfo>,
) -> Result<HttpResponse, ApplicationError> {
    user.require_officer()?;
    tracking::annotate(&store, &reference_no, info.into_inner()).await?;
    Ok(ok_message("Reference comments updated"))
}
