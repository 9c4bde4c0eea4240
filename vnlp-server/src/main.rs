//! Servidor Axum que expõe o pipeline de anotação via HTTP.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vnlp_core::Lifecycle;
use vnlp_server::config::Args;
use vnlp_server::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let lifecycle = Arc::new(Lifecycle::new());

    // Carregamento + aquecimento: nenhum socket é aberto antes disso
    let engine = {
        let lifecycle = Arc::clone(&lifecycle);
        let path = args.backend.clone();
        let set = args.annotators;
        tokio::task::spawn_blocking(move || lifecycle.start(path, set))
            .await
            .context("startup task aborted")?
            .with_context(|| format!("failed to start backend \"{}\"", args.backend.display()))?
    };

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("cannot listen on {}:{}", args.host, args.port))?;
    let backend = engine.info();
    info!(
        "🚀 Servidor vnlp iniciado em http://{}:{} [{}] com {} {}",
        args.host, args.port, args.annotators, backend.name, backend.version
    );

    axum::serve(listener, routes::router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    lifecycle.shutdown();
    Ok(())
}

/// Resolve em Ctrl+C ou SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Falha ao instalar handler de Ctrl+C: {e}");
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
                tracing::error!("Falha ao instalar handler de SIGTERM: {e}");
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
    info!("Sinal de encerramento recebido");
}
