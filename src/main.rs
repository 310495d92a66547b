//! Library Service Server
//!
//! Runs the full HTTP API. PostgreSQL is used when `DATABASE_URL` is set,
//! otherwise accounts and books live in memory for the lifetime of the process.
//! Mail goes through SMTP when `SMTP_HOST` is set and is logged otherwise.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use library_service::{
    api::{AppState, RouterBuilder},
    config::AppConfig,
    database::{
        run_migrations, BookRepository, MemoryBookRepository, MemoryUserRepository,
        PgBookRepository, PgUserRepository, UserRepository,
    },
    service::{
        AuthService, BookService, EmailTemplates, JwtService, LogMailer, Mailer, SmtpMailer,
        UserService,
    },
    utils::security::PasswordHasher,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Library Service v{}", library_service::VERSION);

    let config = AppConfig::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    log::info!("Configuration loaded and validated");

    let (users, books): (Arc<dyn UserRepository>, Arc<dyn BookRepository>) =
        match &config.database {
            Some(database) => {
                let pool = database
                    .create_pool()
                    .await
                    .context("failed to connect to the database")?;

                log::info!("Running database migrations...");
                run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;
                log::info!("Database migrations completed");

                (
                    Arc::new(PgUserRepository::new(pool.clone())),
                    Arc::new(PgBookRepository::new(pool)),
                )
            }
            None => {
                log::warn!("DATABASE_URL not set; using the in-memory store, data will not persist");
                (
                    Arc::new(MemoryUserRepository::new()),
                    Arc::new(MemoryBookRepository::new()),
                )
            }
        };

    let mailer: Arc<dyn Mailer> = match &config.email {
        Some(email) => {
            log::info!("Delivering mail through {}:{}", email.smtp_host, email.smtp_port);
            Arc::new(SmtpMailer::new(email).context("failed to configure SMTP")?)
        }
        None => {
            log::warn!("SMTP_HOST not set; verification emails will be logged, not sent");
            Arc::new(LogMailer)
        }
    };

    let jwt_service = Arc::new(JwtService::new(&config.jwt)?);
    let templates = EmailTemplates::new("Library Service")?;

    let auth_service = AuthService::new(
        users.clone(),
        jwt_service.clone(),
        mailer,
        templates,
        PasswordHasher::default(),
        config.auth.clone(),
    );

    let app_state = AppState {
        auth_service: Arc::new(auth_service),
        user_service: Arc::new(UserService::new(users)),
        book_service: Arc::new(BookService::new(books)),
        jwt_service,
        cookies: config.cookies.clone(),
    };

    log::info!(
        "Email verification required for login: {}",
        config.auth.require_verified_email
    );

    let app = RouterBuilder::with_all_routes().build(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.server.cors_origins)?)
            .into_inner(),
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    log::info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// `*` allows any origin without credentials; explicit origins may send cookies
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid CORS_ORIGINS entry")?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true))
}
