mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::db::DBClient;
use dotenv::dotenv;
use mail::sendmail::Mailer;
use routes::create_router;
use service::{
    booking_service::BookingService,
    job_service::JobService,
    notification_service::NotificationService,
    realtime::{RealtimeHub, HUB_CAPACITY},
    storage::StorageService,
    wallet_service::WalletService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub realtime: RealtimeHub,
    pub notification_service: Arc<NotificationService>,
    pub storage: Arc<StorageService>,
    pub mailer: Arc<Mailer>,
    pub booking_service: Arc<BookingService>,
    pub job_service: Arc<JobService>,
    pub wallet_service: Arc<WalletService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);

        let realtime = RealtimeHub::new(HUB_CAPACITY);
        let notification_service = Arc::new(NotificationService::new(db_client_arc.clone(), realtime.clone()));
        let storage = Arc::new(StorageService::new(&config));
        let mailer = Arc::new(Mailer::new(&config));

        let booking_service = Arc::new(BookingService::new(
            db_client_arc.clone(),
            notification_service.clone(),
            mailer.clone(),
            config.platform_fee_percent,
            config.frontend_url.clone(),
        ));
        let job_service = Arc::new(JobService::new(db_client_arc.clone(), notification_service.clone()));
        let wallet_service = Arc::new(WalletService::new(db_client_arc.clone(), notification_service.clone()));

        Self {
            env: config,
            db_client: db_client_arc,
            realtime,
            notification_service,
            storage,
            mailer,
            booking_service,
            job_service,
            wallet_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if config.run_migrations {
        if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::error!("🔥 Failed to run migrations: {:?}", err);
            std::process::exit(1);
        }
        tracing::info!("✅ Migrations applied");
    }

    let db_client = match config.redis_url {
        Some(ref redis_url) => DBClient::with_redis(pool, redis_url).await,
        None => {
            tracing::info!("ℹ️  Redis not configured - Running without token revocation (set REDIS_URL to enable)");
            DBClient::new(pool)
        }
    };

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    tokio::spawn(service::background_jobs::start_booking_expiry_job(app_state.clone()));
    tokio::spawn(service::background_jobs::start_token_cleanup_job(app_state.clone()));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);
    tracing::info!("📊 Cache status: {}", app_state.db_client.cache_status());

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("🔥 Server error: {}", err);
    }
}
