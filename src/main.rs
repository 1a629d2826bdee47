use actix_cors::Cors;
use actix_web::{http::header, middleware::Compress, web, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use tracksync::config::StoreBackend;
use tracksync::openapi::ApiDoc;
use tracksync::repo::{inmem::InMemRepo, pg::PgRepo, Repo};
use tracksync::token::TokenService;
use tracksync::{routes, AppConfig, AppState, RequestTimeout};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env().context("invalid configuration")?;
    info!(
        port = cfg.port,
        store = ?cfg.store,
        token_ttl_hours = cfg.jwt_ttl.num_hours(),
        request_timeout_secs = cfg.request_timeout.as_secs(),
        "Bootstrapping tracksync"
    );

    let mut pool = None;
    let repo: Arc<dyn Repo> = match cfg.store {
        StoreBackend::Postgres => {
            let pg = PgPoolOptions::new()
                .max_connections(cfg.db_max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .connect(&cfg.database_url)
                .await
                .context("failed to connect to postgres")?;
            sqlx::migrate!("./migrations")
                .run(&pg)
                .await
                .context("failed to run migrations")?;
            info!("Using Postgres repository backend");
            pool = Some(pg.clone());
            Arc::new(PgRepo::new(pg))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory repository backend; nothing survives a restart");
            Arc::new(InMemRepo::new())
        }
    };

    let state = web::Data::new(AppState::new(repo, TokenService::new(&cfg.jwt_secret, cfg.jwt_ttl)));
    let openapi = ApiDoc::openapi();
    let origins = cfg.allowed_origins.clone();
    let timeout = RequestTimeout::new(cfg.request_timeout);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(timeout)
            .wrap(build_cors(&origins))
            .wrap(Compress::default())
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .configure(routes::config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    // in-flight requests get this long after SIGINT/SIGTERM before workers are stopped
    .shutdown_timeout(cfg.shutdown_grace.as_secs())
    .bind(("0.0.0.0", cfg.port))?;

    info!("Listening on http://0.0.0.0:{}", cfg.port);
    server.run().await?;

    if let Some(pool) = pool {
        pool.close().await;
    }
    info!("shutdown complete");
    Ok(())
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(["GET", "POST", "PUT", "OPTIONS"])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600);
    origins.iter().fold(cors, |c, origin| c.allowed_origin(origin))
}
