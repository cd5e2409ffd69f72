//! API server entry point.

use api::{Application, Config, LogFormat, Storage};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

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

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Configuration and tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Storage
    let storage = match &config.database_url {
        Some(url) => {
            tracing::info!("using PostgreSQL storage");
            Storage::postgres(url)
                .await
                .expect("failed to initialize PostgreSQL storage")
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory storage");
            Storage::in_memory()
        }
    };

    // 4. Wire the workflow, bus and consumers
    let application = Application::new(&config, storage);
    if config.seed_demo_data {
        application
            .seed_demo_data()
            .await
            .expect("failed to load demo data");
    }
    let consumer = application.consumer().spawn(application.bus.subscribe());

    // 5. Start server
    let app = api::create_app(application.state.clone(), metrics_handle);
    let addr = config.addr();
    tracing::info!(
        %addr,
        compensate = config.compensate_partial_reservations,
        strict_transitions = config.enforce_status_transitions,
        "starting API server"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    consumer.shutdown().await;
    tracing::info!("server shut down gracefully");
}
