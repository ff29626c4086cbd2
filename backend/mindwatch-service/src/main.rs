use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context};
use db_pool::{create_pool, DbConfig};
use mindwatch_service::{
    classifier::{Classifier, OnnxSequenceModel},
    feed::{FeedClient, TwitterClient},
    handlers,
    metrics::MetricsMiddleware,
    security::JwtKeys,
    store::{DocumentStore, PgDocumentStore},
    AppState, Config,
};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,mindwatch_service=debug,actix_web=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        service = %config.service_name,
        env = %config.app_env,
        "Starting mindwatch-service"
    );
    tracing::debug!(?config, "Configuration loaded");

    if config.uses_default_jwt_secret() {
        if config.is_production() {
            return Err(anyhow!("JWT_SECRET must be set in production"));
        }
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    // Database
    let mut db_config = DbConfig::from_env(&config.service_name).map_err(|e| anyhow!(e))?;
    db_config.database_name = Some(config.database_name.clone());
    db_config.log_config();
    let pool = create_pool(db_config)
        .await
        .context("Failed to connect to database")?;

    let pg_store = PgDocumentStore::new(pool, config.service_name.clone());
    pg_store.migrate().await.context("Failed to run migrations")?;
    let store: Arc<dyn DocumentStore> = Arc::new(pg_store);
    store.ping().await.context("Document store ping failed")?;

    // Classifier
    let model = OnnxSequenceModel::load(
        &config.model_path,
        config.tokenizer_path(),
        config.max_sequence_length,
    )
    .context("Failed to load classification model")?;
    let classifier = Arc::new(Classifier::new(Arc::new(model)));

    // Social feed
    let twitter = TwitterClient::new(config.twitter()).context("Failed to build Twitter client")?;
    if config.feed_verify_on_startup {
        twitter
            .verify()
            .await
            .context("Twitter API credential check failed")?;
    }
    let feed: Arc<dyn FeedClient> = Arc::new(twitter);

    let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_expiry_hours);
    let state = web::Data::new(AppState::new(store.clone(), feed, classifier, jwt));

    let addr = config.bind_address();
    let origins = config.cors_origins();
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(build_cors(&origins))
            .wrap(MetricsMiddleware)
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&addr)
    .with_context(|| format!("Failed to bind {}", addr))?
    .run()
    .await?;

    tracing::info!("HTTP server stopped, closing document store");
    store.close().await;
    Ok(())
}
