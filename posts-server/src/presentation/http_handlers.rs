use crate::application::auth_service::AuthenticatedUser;
use crate::application::{AuthService, PostService};
use crate::domain::post::PostInput;
use crate::domain::user::{LoginUserRequest, RegisterUserRequest};
use crate::domain::DomainError;
use crate::presentation::response::{envelope, error_to_response, ok};
use actix_web::http::StatusCode;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;

// Bodies are optional: a missing or unparsable body is validated as an empty
// one, so the caller gets per-field "required" failures.
fn body_or_default<T: Default>(body: Option<web::Json<T>>) -> T {
    body.map(web::Json::into_inner).unwrap_or_default()
}

fn get_auth_from_request(req: &HttpRequest) -> Result<AuthenticatedUser, DomainError> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or(DomainError::Unauthorized(
            "User not authenticated".to_string(),
        ))
}

// Stores hand out ids from 1, so 0 never names a post.
const UNASSIGNED_POST_ID: i64 = 0;

// Identifiers that are not integers cannot name a post.
fn parse_post_id(raw: &str) -> Result<i64, DomainError> {
    raw.parse().map_err(|_| DomainError::PostNotFound)
}

// ============== Auth Handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    body: Option<web::Json<RegisterUserRequest>>,
) -> impl Responder {
    match auth_service.register(body_or_default(body)).await {
        Ok(user) => envelope(
            Some(user),
            "User successfully registered",
            StatusCode::CREATED,
        ),
        Err(err) => error_to_response(err),
    }
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    body: Option<web::Json<LoginUserRequest>>,
) -> impl Responder {
    match auth_service.login(body_or_default(body)).await {
        Ok(tokens) => ok(tokens, "ok"),
        Err(err) => error_to_response(err),
    }
}

pub async fn user_profile(
    req: HttpRequest,
    auth_service: web::Data<Arc<AuthService>>,
) -> impl Responder {
    let auth = match get_auth_from_request(&req) {
        Ok(auth) => auth,
        Err(err) => return error_to_response(err),
    };

    match auth_service.profile(&auth).await {
        Ok(user) => ok(user, "ok"),
        Err(err) => error_to_response(err),
    }
}

pub async fn refresh(
    req: HttpRequest,
    auth_service: web::Data<Arc<AuthService>>,
) -> impl Responder {
    let auth = match get_auth_from_request(&req) {
        Ok(auth) => auth,
        Err(err) => return error_to_response(err),
    };

    match auth_service.refresh(&auth).await {
        Ok(tokens) => ok(tokens, "Token refreshed"),
        Err(err) => error_to_response(err),
    }
}

pub async fn logout(
    req: HttpRequest,
    auth_service: web::Data<Arc<AuthService>>,
) -> impl Responder {
    let auth = match get_auth_from_request(&req) {
        Ok(auth) => auth,
        Err(err) => return error_to_response(err),
    };

    match auth_service.logout(&auth).await {
        Ok(()) => envelope(None::<()>, "User successfully signed out", StatusCode::OK),
        Err(err) => error_to_response(err),
    }
}

// ============== Post Handlers ==============

pub async fn list_posts(post_service: web::Data<Arc<PostService>>) -> impl Responder {
    tracing::info!("Listing posts");

    match post_service.list_posts().await {
        Ok(posts) => ok(posts, "ok"),
        Err(err) => error_to_response(err),
    }
}

pub async fn get_post(
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<String>,
) -> impl Responder {
    let post_id = match parse_post_id(&path) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    tracing::info!("Getting post with id={}", post_id);

    match post_service.get_post(post_id).await {
        Ok(post) => ok(post, "ok"),
        Err(err) => error_to_response(err),
    }
}

pub async fn create_post(
    req: HttpRequest,
    post_service: web::Data<Arc<PostService>>,
    body: Option<web::Json<PostInput>>,
) -> impl Responder {
    let auth = match get_auth_from_request(&req) {
        Ok(auth) => auth,
        Err(err) => return error_to_response(err),
    };

    tracing::info!("Creating post for user_id={}", auth.user_id);

    match post_service.create_post(body_or_default(body)).await {
        Ok(post) => ok(post, "created successfully"),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_post(
    req: HttpRequest,
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<String>,
    body: Option<web::Json<PostInput>>,
) -> impl Responder {
    let auth = match get_auth_from_request(&req) {
        Ok(auth) => auth,
        Err(err) => return error_to_response(err),
    };

    // A non-numeric id still runs the full validation gate and then misses,
    // like any unknown id.
    let post_id = parse_post_id(&path).unwrap_or(UNASSIGNED_POST_ID);

    tracing::info!("Updating post id={} for user_id={}", post_id, auth.user_id);

    match post_service.update_post(post_id, body_or_default(body)).await {
        Ok(post) => ok(post, "updated successfully"),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_post(
    req: HttpRequest,
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<String>,
) -> impl Responder {
    let auth = match get_auth_from_request(&req) {
        Ok(auth) => auth,
        Err(err) => return error_to_response(err),
    };

    let post_id = match parse_post_id(&path) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    tracing::info!("Deleting post id={} for user_id={}", post_id, auth.user_id);

    match post_service.delete_post(post_id).await {
        Ok(post) => ok(post, "deleted successfully"),
        Err(err) => error_to_response(err),
    }
}

pub async fn route_not_found(req: HttpRequest) -> HttpResponse {
    tracing::debug!("No route for {} {}", req.method(), req.path());
    envelope(None::<()>, "Not found", StatusCode::NOT_FOUND)
}

pub async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    tracing::debug!("Method {} not allowed for {}", req.method(), req.path());
    envelope(None::<()>, "Method not allowed", StatusCode::METHOD_NOT_ALLOWED)
}
