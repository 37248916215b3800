use dotenvy::dotenv;
use std::sync::Arc;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use application::{auth_service::AuthService, post_service::PostService};
use data::{
    post_repository::{InMemoryPostRepository, PostRepository, PostgresPostRepository},
    token_denylist::{InMemoryTokenDenylist, PostgresTokenDenylist, TokenDenylist},
    user_repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
};
use infrastructure::{
    config::Config,
    database::{create_pool, run_migrations},
    jwt::JwtService,
    logging::init_logging,
};
use presentation::routes;

struct Stores {
    users: Arc<dyn UserRepository + Send + Sync>,
    posts: Arc<dyn PostRepository + Send + Sync>,
    denylist: Arc<dyn TokenDenylist + Send + Sync>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = Config::from_env()?;

    init_logging(config.log_format);

    tracing::info!("Starting posts server...");
    tracing::info!("HTTP server will listen on {}", config.http_addr());
    tracing::info!("CORS allowed origins: {}", config.cors_allowed_origins);

    let stores = open_stores(&config).await?;

    tracing::info!("Initializing services...");

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt_secret,
        chrono::Duration::minutes(config.jwt_ttl_minutes),
    )?);

    let auth_service = Arc::new(AuthService::new(
        stores.users,
        stores.denylist,
        jwt_service,
    ));
    let post_service = Arc::new(PostService::new(stores.posts));

    tracing::info!("Services initialized successfully");

    run_http_server(config, auth_service, post_service).await?;

    tracing::info!("Shutting down...");
    Ok(())
}

async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = create_pool(database_url, config.database_max_connections).await?;

            tracing::info!("Running database migrations...");
            run_migrations(&pool).await?;

            Ok(Stores {
                users: Arc::new(PostgresUserRepository::new(pool.clone())),
                posts: Arc::new(PostgresPostRepository::new(pool.clone())),
                denylist: Arc::new(PostgresTokenDenylist::new(pool)),
            })
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; using the in-memory store (data is lost on exit)");
            Ok(Stores {
                users: Arc::new(InMemoryUserRepository::new()),
                posts: Arc::new(InMemoryPostRepository::new()),
                denylist: Arc::new(InMemoryTokenDenylist::new()),
            })
        }
    }
}

/// Configure CORS for the HTTP server with allowed origins from .env
fn configure_cors(allowed_origins: &str) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .max_age(3600);

    for origin in allowed_origins.split(',').map(str::trim) {
        if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
            tracing::debug!("Added allowed CORS origin: {}", origin);
        }
    }

    cors
}

async fn run_http_server(
    config: Config,
    auth_service: Arc<AuthService>,
    post_service: Arc<PostService>,
) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, web, App, HttpServer};

    tracing::info!("Configuring HTTP server...");

    let addr = config.http_addr();
    let cors_allowed_origins = config.cors_allowed_origins.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&cors_allowed_origins))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(post_service.clone()))
            .configure(routes::configure)
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}
