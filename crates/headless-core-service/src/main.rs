use headless_core_service::{
    DefaultAppState, Headless, config::ServiceConfig, create_service, db::establish_connection,
};
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "headless_core_service=debug".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServiceConfig::from_env().unwrap_or_else(|err| {
        error!(error = %err, "Invalid configuration");
        std::process::exit(1);
    });

    if config.frontend.base_url.is_none() {
        warn!("HEADLESS_FRONTEND_URL is not set, links and public pages stay on the backend");
    }

    let connection = establish_connection(&config.database_url).unwrap_or_else(|err| {
        error!(database_url = %config.database_url, error = %err, "Failed to open database");
        std::process::exit(1);
    });

    info!(database_url = %config.database_url, "Connected to database");

    let headless = Headless::from_config(&config).unwrap_or_else(|err| {
        error!(error = %err, "Failed to build revalidation client");
        std::process::exit(1);
    });

    info!(
        request_timeout_secs = headless.request_timeout().as_secs(),
        "Configured request timeout"
    );

    let app_state = DefaultAppState::new(Arc::new(Mutex::new(connection)), headless);
    let app = create_service(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .unwrap_or_else(|err| {
            error!(bind_address = %config.bind_address, error = %err, "Failed to bind to address");
            std::process::exit(1);
        });

    info!(bind_address = %config.bind_address, "Server running");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!(error = %err, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight requests");
}
