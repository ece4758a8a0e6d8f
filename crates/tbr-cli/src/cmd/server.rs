//! Server command

use anyhow::{Context, Result};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use tbr_core::{ServerConfig, open_bucket, server};
use tracing::info;

/// Serve the bucket until interrupted.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let store = open_bucket(&config.bucket_url)
        .with_context(|| format!("failed to open bucket {}", config.bucket_url))?;
    let app = server::router(store);
    let addr = config.addr();

    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    match &config.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .with_context(|| {
                    format!(
                        "failed to load TLS key pair {} / {}",
                        tls.cert_path.display(),
                        tls.key_path.display()
                    )
                })?;
            info!(addr = %addr, bucket = %config.bucket_url, "serving registry over https");
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .with_context(|| format!("failed to serve on {addr}"))?;
        }
        None => {
            info!(addr = %addr, bucket = %config.bucket_url, "serving registry over http");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .with_context(|| format!("failed to serve on {addr}"))?;
        }
    }

    info!("server stopped");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: Handle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
        handle.graceful_shutdown(None);
    }
}
