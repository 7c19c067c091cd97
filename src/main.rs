use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use travels_api::build_app;
use travels_api::clients::{GoogleSheetsClient, Notifier, ResendNotifier, TabularStore};
use travels_api::config::EnvironmentConfig;
use travels_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚖 Travels API - fares & bookings");
    info!("================================");

    // Missing credentials stop the process before the listener binds
    let config = match EnvironmentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration error: {}", e);
            return Err(anyhow::anyhow!("configuration error: {}", e));
        }
    };
    info!("⚙️ Environment: {} ({:?})", config.environment, config.notification);

    let store: Arc<dyn TabularStore> = Arc::new(
        GoogleSheetsClient::new(config.google.clone(), config.sheet_id.clone(), config.store_timeout)
            .context("spreadsheet client")?,
    );

    let notifier: Option<Arc<dyn Notifier>> = match ResendNotifier::from_config(&config.notification)
        .context("notification client")?
    {
        Some(notifier) => Some(Arc::new(notifier)),
        None => {
            info!("📭 RESEND_API_KEY not set, operator e-mails disabled");
            None
        }
    };

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_url()))?;

    let app = build_app(AppState::new(config, store, notifier));

    info!("🌐 Server listening on http://{}", addr);
    info!("🔍 Endpoints:");
    info!("   GET|POST /.netlify/functions/travels-api?action=… (also /api/travels)");
    info!("            submitBooking, submitContact, submitCareer, submitLead");
    info!("            estimateFare, getTariff, getRoutes, getAllRoutes");
    info!("   POST     /.netlify/functions/submit-booking - legacy booking form");
    info!("   GET      /health");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Server error: {}", e);
            e
        })?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Ctrl+C received, shutting down...");
        },
        _ = terminate => {
            info!("🛑 SIGTERM received, shutting down...");
        },
    }
}
