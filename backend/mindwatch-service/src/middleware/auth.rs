use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;
use crate::store::DOCTORS;
use crate::AppState;

/// Doctor id taken from a validated Bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedDoctor(pub Uuid);

/// Rejects requests without a valid doctor Bearer token and exposes the
/// doctor id to handlers through [`AuthenticatedDoctor`].
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(doctor) => {
                    req.extensions_mut().insert(doctor);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => {
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Verify the Bearer token and check that its doctor still exists.
async fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedDoctor, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".to_string()))?
        .trim();

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("application state missing".to_string()))?;

    let doctor_id = state.jwt.verify(token)?;
    if state.store.get(DOCTORS, doctor_id).await?.is_none() {
        return Err(AppError::Unauthorized(
            "Doctor account no longer exists".to_string(),
        ));
    }
    Ok(AuthenticatedDoctor(doctor_id))
}

impl actix_web::FromRequest for AuthenticatedDoctor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthenticatedDoctor>() {
            Some(doctor) => ready(Ok(*doctor)),
            None => ready(Err(AppError::Unauthorized(
                "Doctor not authenticated".to_string(),
            )
            .into())),
        }
    }
}
