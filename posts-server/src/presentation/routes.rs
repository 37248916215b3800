use crate::presentation::http_handlers;
use crate::presentation::middleware::require_bearer_token;
use actix_web::middleware::from_fn;
use actix_web::{guard, web};

// A matched path with an unsupported method still answers in the envelope.
fn resource(path: &str) -> actix_web::Resource {
    web::resource(path).default_service(web::to(http_handlers::method_not_allowed))
}

/// Route table. Everything lives under `/api`; resources that need a caller
/// are wrapped in the bearer-token middleware individually because `/post`
/// is public for GET and protected for POST.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes - authentication
            .service(resource("/register").route(web::post().to(http_handlers::register)))
            .service(resource("/login").route(web::post().to(http_handlers::login)))
            // Protected routes - authentication
            .service(
                resource("/user-profile")
                    .route(web::get().to(http_handlers::user_profile))
                    .wrap(from_fn(require_bearer_token)),
            )
            .service(
                resource("/logout")
                    .route(web::post().to(http_handlers::logout))
                    .wrap(from_fn(require_bearer_token)),
            )
            .service(
                resource("/refresh")
                    .route(web::post().to(http_handlers::refresh))
                    .wrap(from_fn(require_bearer_token)),
            )
            // Posts: read-only routes are public
            .service(
                web::resource("/post")
                    .guard(guard::Get())
                    .route(web::get().to(http_handlers::list_posts)),
            )
            .service(
                web::resource("/post")
                    .guard(guard::Post())
                    .route(web::post().to(http_handlers::create_post))
                    .wrap(from_fn(require_bearer_token)),
            )
            .service(
                resource("/post/{id}").route(web::get().to(http_handlers::get_post)),
            )
            .service(
                resource("/updatePost/{id}")
                    .route(web::patch().to(http_handlers::update_post))
                    .wrap(from_fn(require_bearer_token)),
            )
            .service(
                resource("/deletePost/{id}")
                    .route(web::post().to(http_handlers::delete_post))
                    .wrap(from_fn(require_bearer_token)),
            )
            .default_service(web::to(http_handlers::route_not_found)),
    );
}
