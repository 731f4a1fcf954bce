//! Tiendita gRPC server.
//!
//! Serves `ShopService` and `ShopAdminService` over one tonic endpoint,
//! plus the standard gRPC health service. State is a single
//! [`PgBackend`] shared by both services.
//!
//! [`PgBackend`]: tiendita_store::PgBackend

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tonic::transport::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiendita_grpc::proto::shop_admin_service_server::ShopAdminServiceServer;
use tiendita_grpc::proto::shop_service_server::ShopServiceServer;
use tiendita_grpc::{ShopAdminApi, ShopApi};
use tiendita_store::config::StoreConfig;
use tiendita_store::{PgBackend, ShopBackend, db};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StoreConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = StoreConfig::from_env().expect("Failed to load configuration");

    // Sentry must come up before the tracing subscriber.
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tiendita_grpc=info,tiendita_store=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p tiendita-cli -- migrate

    let backend: Arc<dyn ShopBackend> = Arc::new(PgBackend::new(pool));

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ShopServiceServer<ShopApi>>()
        .await;
    health_reporter
        .set_serving::<ShopAdminServiceServer<ShopAdminApi>>()
        .await;

    let addr = config.socket_addr();
    tracing::info!("grpc server listening on {}", addr);

    Server::builder()
        .add_service(health_service)
        .add_service(ShopServiceServer::new(ShopApi::new(backend.clone())))
        .add_service(ShopAdminServiceServer::new(ShopAdminApi::new(backend)))
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
