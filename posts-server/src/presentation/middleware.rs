use crate::application::AuthService;
use crate::domain::DomainError;
use crate::presentation::response::error_to_response;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use std::sync::Arc;

/// Guards protected routes: the request reaches the handler only with a
/// valid, unrevoked bearer token, and carries the caller as an
/// `AuthenticatedUser` extension. Rejections are answered here, in the
/// envelope format.
pub async fn require_bearer_token<B: MessageBody>(
    mut req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let auth_service = match req.app_data::<web::Data<Arc<AuthService>>>() {
        Some(service) => service.get_ref().clone(),
        None => {
            return Ok(reject(
                req,
                DomainError::InternalError("Auth service not configured".to_string()),
            ));
        }
    };

    let credentials = match req.extract::<BearerAuth>().await {
        Ok(credentials) => credentials,
        Err(_) => {
            tracing::debug!("Missing or malformed Authorization header: {}", req.path());
            return Ok(reject(
                req,
                DomainError::Unauthorized("Missing bearer token".to_string()),
            ));
        }
    };

    match auth_service.authenticate(credentials.token()).await {
        Ok(user) => {
            tracing::debug!("Authenticated user_id={} for {}", user.user_id, req.path());
            req.extensions_mut().insert(user);
            next.call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        }
        Err(err) => Ok(reject(req, err)),
    }
}

fn reject<B>(req: ServiceRequest, err: DomainError) -> ServiceResponse<EitherBody<B>> {
    req.into_response(error_to_response(err))
        .map_into_right_body()
}
