use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use faq_answer_server::config::Args;
use faq_answer_server::error::StartupError;
use faq_answer_server::runtime::{OllamaRuntime, TextGenerator, health_checker};
use faq_answer_server::server::create_router;
use faq_answer_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("faq_answer_server=info,tower_http=info")),
        )
        .init();

    // parse cli arguments
    let args = Args::parse();

    let mut client = reqwest::Client::builder();
    if let Some(timeout) = args.generation_timeout() {
        client = client.timeout(timeout);
    }
    let client = client.build().map_err(StartupError::Client)?;

    // the model is loaded once, before the port opens
    let runtime = Arc::new(OllamaRuntime::new(client, &args.runtime_url, args.model.clone()));
    if let Err(e) = runtime.load().await {
        tracing::error!(error = %e, model = %args.model, "Model load failed");
        return Err(StartupError::ModelLoad(e));
    }

    tokio::spawn(health_checker(Arc::clone(&runtime), args.health_interval()));

    let generator: Arc<dyn TextGenerator> = runtime.clone();
    let app = create_router(Arc::new(AppState::new(generator)));

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        model = %runtime.model_name(),
        runtime = %runtime.endpoint(),
        "FAQ answer server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
    tracing::info!("Shutdown signal received");
}
