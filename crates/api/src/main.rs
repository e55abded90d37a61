//! API server entry point.

use allocation::VendorListing;
use broker::NatsTransport;
use common::{LocationId, VendorId};
use domain::{GeoPoint, Money};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::config::Config;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Seeds the in-memory catalog with a few vendors around Lagos so the
/// server is usable out of the box.
fn seed_demo_vendors(catalog: &allocation::InMemoryVendorCatalog) {
    let listings = [
        (6.5244, 3.3792, 8_500, 500, 12.0, 4.6, 40),
        (6.4550, 3.3941, 8_200, 700, 24.0, 4.2, 25),
        (6.6018, 3.3515, 9_000, 400, 8.0, 4.8, 60),
    ];

    for (lat, lon, unit, fee, hours, rating, stock) in listings {
        catalog.add_listing(VendorListing {
            vendor_id: VendorId::new(),
            location_id: LocationId::new(),
            location: GeoPoint::new(lat, lon).expect("valid demo coordinates"),
            unit_price: Money::from_cents(unit),
            delivery_fee: Money::from_cents(fee),
            estimated_delivery_hours: hours,
            rating,
            available_quantity: stock,
        });
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration; a set-but-invalid variable is fatal
    let config = Config::from_env().expect("invalid configuration");

    // 2. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 3. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 4. Create the broker transport and application state
    let transport = NatsTransport::new(&config.broker_url).expect("invalid broker URL");
    let (state, catalog, _inventory) = api::create_default_state(transport, &config);
    seed_demo_vendors(&catalog);

    // 5. Start the broker supervisor and the reservation expiry sweep
    let supervisor = state.broker.clone();
    let broker_task = tokio::spawn(async move { supervisor.run().await });
    let sweep_task = tokio::spawn(allocation::run_expiry_sweep(
        state.coordinator.clone(),
        config.sweep_interval,
        state.shutdown.clone(),
    ));

    // 6. Build the application
    let app = api::create_app(state.clone(), metrics_handle);

    // 7. Start server
    let addr = config.addr();
    tracing::info!(%addr, broker_url = %config.broker_url, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 8. Stop background tasks
    state.shutdown.cancel();
    state.broker.shutdown();
    let _ = sweep_task.await;
    let _ = broker_task.await;

    tracing::info!("server shut down gracefully");
}
