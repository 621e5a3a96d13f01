//! booking-desk server entry point.
//!
//! Loads configuration, picks a storage backend, and starts the Axum HTTP
//! server.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use booking_desk::api;
use booking_desk::app_state::AppState;
use booking_desk::config::{AppConfig, LogFormat};
use booking_desk::domain::{RolePolicy, SystemClock};
use booking_desk::persistence::memory::MemoryStore;
use booking_desk::persistence::postgres::PostgresStore;
use booking_desk::persistence::{BookingStore, CatalogStore, EmployeeStore, UserStore};
use booking_desk::service::{BookingService, CatalogService, EmployeeService, UserService};

/// One backend seen through each store trait.
struct Stores {
    bookings: Arc<dyn BookingStore>,
    catalog: Arc<dyn CatalogStore>,
    users: Arc<dyn UserStore>,
    employees: Arc<dyn EmployeeStore>,
}

impl Stores {
    fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: BookingStore + CatalogStore + UserStore + EmployeeStore + 'static,
    {
        Self {
            bookings: Arc::clone(&store) as _,
            catalog: Arc::clone(&store) as _,
            users: Arc::clone(&store) as _,
            employees: store as _,
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env().context("invalid LISTEN_ADDR")?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting booking-desk");

    // Pick storage
    let (stores, storage_backend) = if config.persistence_enabled {
        let store = PostgresStore::connect(&config)
            .await
            .context("failed to connect to PostgreSQL")?;
        (Stores::from_backend(Arc::new(store)), "postgres")
    } else {
        tracing::warn!("persistence disabled, records are kept in memory only");
        (Stores::from_backend(Arc::new(MemoryStore::new())), "memory")
    };

    // Build service layer
    let authorizer = Arc::new(RolePolicy);
    let clock = Arc::new(SystemClock);
    let booking_service = Arc::new(BookingService::new(
        stores.bookings,
        Arc::clone(&clock) as _,
        Arc::clone(&authorizer) as _,
    ));
    let catalog_service = Arc::new(CatalogService::new(
        stores.catalog,
        Arc::clone(&authorizer) as _,
    ));
    let user_service = Arc::new(UserService::new(
        stores.users,
        Arc::clone(&clock) as _,
        Arc::clone(&authorizer) as _,
    ));
    let employee_service = Arc::new(EmployeeService::new(stores.employees, clock, authorizer));

    // Build application state
    let app_state = AppState {
        booking_service,
        catalog_service,
        user_service,
        employee_service,
        default_page_size: config.default_page_size,
        storage_backend,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, storage = storage_backend, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
