use echo_function::{config::AppConfig, telemetry, AppError};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

fn main() {
    let config = match AppConfig::new() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    telemetry::init_tracing(config.log_format);
    debug!(
        "Configuration loaded: host={}, port={}, worker_threads={}, route_prefix={:?}, max_body_bytes={}",
        config.host, config.port, config.worker_threads, config.route_prefix, config.max_body_bytes
    );

    if let Err(e) = run(config) {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Arc<AppConfig>) -> Result<(), AppError> {
    info!(
        "Configuring tokio runtime with {} worker threads",
        config.worker_threads
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_stack_size(2 * 1024 * 1024)
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        echo_function::serve(listener, config, shutdown_signal()).await
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            debug!("CTRL+C signal received");
        },
        _ = terminate => {
            debug!("Terminate signal received");
        },
    }
    info!("Shutdown signal received, starting graceful shutdown");
}
