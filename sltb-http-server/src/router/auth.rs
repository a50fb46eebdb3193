use actix_web::{post, web, HttpResponse};
use sltb_database::Store;
use sltb_lib::core::auth::{self, jwt::JwtManager, AuthenticatedUser};
use sltb_lib::core::{SignInInfo, SignUpInfo};
use sltb_lib::error::ApplicationError;

use super::{created, ok, ok_with_message};

#[post("/signup")]
pub async fn signup(
    store: web::Data<Store>,
    info: web::Json<SignUpInfo>,
) -> Result<HttpResponse, ApplicationError> {
    let profile = auth::sign_up(&store, info.into_inner()).await?;
    Ok(created("User registered successfully", profile))
}

#[post("/signin")]
pub async fn signin(
    store: web::Data<Store>,
    jwt: web::Data<JwtManager>,
    info: web::Json<SignInInfo>,
) -> Result<HttpResponse, ApplicationError> {
    let response = auth::sign_in(&store, &jwt, info.into_inner()).await?;
    Ok(ok_with_message("Login successful", response))
}

/// Profile of the bearer. Mounted as a resource behind the token check.
pub async fn me(
    store: web::Data<Store>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApplicationError> {
    Ok(ok(auth::profile(&store, user.id).await?))
}
