use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use log::debug;
use sltb_lib::core::auth::{jwt::JwtManager, AuthenticatedUser};
use sltb_lib::error::ApplicationError;

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|hv| hv.to_str().ok())
        .filter(|hv| hv.starts_with("Bearer "))
        .map(|hv| hv["Bearer ".len()..].trim().to_string())
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedUser, ApplicationError> {
    let token = bearer_token(req)
        .ok_or_else(|| ApplicationError::Unauthorized("Access token required".to_string()))?;
    let jwt = req
        .app_data::<web::Data<JwtManager>>()
        .ok_or_else(|| ApplicationError::Internal("token manager is not registered".to_string()))?;
    let claims = jwt.verify(&token)?;
    Ok(AuthenticatedUser::from_claims(&claims))
}

/// Requires a valid bearer token and stores the caller as `AuthenticatedUser`
/// in the request extensions.
pub struct BearerAuth;

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware { service }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(user) => {
                debug!("Authenticated user {} ({})", user.id, user.role.as_str());
                req.extensions_mut().insert(user);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(e) => {
                let response = e.error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}
