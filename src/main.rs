use ecoride_rental::business_rules::PricingTable;
use ecoride_rental::config::AppConfig;
use ecoride_rental::rental::{EngineServices, RentalSystem};
use ecoride_rental::storage::FlatFileStore;
use ecoride_rental::{create_router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // RUST_LOG wins over the configured level when both are present
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("EcoRide Rental API - Starting...");

    let pricing = match &config.pricing_file {
        Some(path) => {
            tracing::info!("Loading pricing rules from {}", path.display());
            PricingTable::from_json_file(path).expect("Failed to load pricing rules")
        }
        None => PricingTable::default(),
    };

    let store = FlatFileStore::new(config.data_dir.clone());
    tracing::info!("Loading catalog from {}", store.dir().display());
    let services = EngineServices {
        pricing,
        ..EngineServices::default()
    };
    let mut system = RentalSystem::load(Box::new(store), services).expect("Failed to load catalog");

    if system.skipped_records() > 0 {
        tracing::warn!("{} malformed records were skipped while loading", system.skipped_records());
    }
    tracing::info!(
        "Loaded {} vehicles, {} customers, {} bookings",
        system.catalog().vehicles().len(),
        system.catalog().customers().len(),
        system.catalog().bookings().len()
    );

    if config.seed_sample_vehicles {
        match system.seed_sample_vehicles() {
            Ok(true) => tracing::info!("Sample fleet added"),
            Ok(false) => {}
            Err(e) => tracing::warn!("Failed to save sample fleet: {}", e),
        }
    }

    let state = AppState::new(system);
    let app = create_router(state.clone());

    // Start the Axum server
    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("EcoRide Rental API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    state.system.lock().await.metrics().log_summary();
    tracing::info!("EcoRide Rental API stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
