//! Allure report viewer server.
//!
//! Serves a dashboard of the Allure reports stored in an S3 bucket and proxies
//! the files of each report. The server expects to sit behind a load balancer
//! that authenticates callers and injects an identity header.
//!
//! # Usage
//!
//! ```text
//! REPORT_BUCKET=allure-reports GATEWAY_LISTEN=0.0.0.0:8080 allure-viewer-server
//! allure-viewer-server --health-check
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `REPORT_BUCKET` | *(required)* | Bucket holding the report bundles |
//! | `AWS_REGION` | `us-east-1` | Bucket region |
//! | `S3_ENDPOINT_URL` | *(unset)* | Custom S3 endpoint |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style bucket addressing |
//! | `CALLBACK_PATH` | `/oauth2/idpresponse` | Identity-provider callback, served as the dashboard |
//! | `IDENTITY_HEADER` | `x-amzn-oidc-identity` | Header carrying the caller identity |
//! | `PROBE_CONCURRENCY` | `8` | Concurrent entry-file probes per dashboard load |
//! | `STORE_TIMEOUT_MS` | `10000` | Deadline for each S3 call |
//! | `REQUEST_TIMEOUT_MS` | `20000` | Total store budget for one request |
//! | `CACHE_MAX_AGE_SECS` | `3600` | `max-age` for proxied files |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use allure_viewer_core::{ObjectStore, ViewerConfig};
use allure_viewer_http::service::HEALTH_PATH;
use allure_viewer_http::{Router, ViewerHttpService};
use allure_viewer_s3::S3ObjectStore;
use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported in the startup log.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bind address used when `GATEWAY_LISTEN` is unset.
const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: ViewerHttpService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Let in-flight dashboard and file requests finish.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Request the health endpoint of a locally running server.
///
/// Succeeds only when the server answers `200 OK` with a `running` status
/// document; any connection or protocol failure is an error.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_healthy_response(response: &str) -> bool {
    // Status line plus the status field of the JSON body.
    response.contains("200 OK") && response.contains("\"running\"")
}

/// Address to probe for a server bound to `listen_addr`.
fn health_probe_addr(listen_addr: &str) -> String {
    listen_addr.replace("0.0.0.0", "127.0.0.1")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK. Only needs the
    // listen address, so a missing bucket setting does not fail the probe.
    if std::env::args().any(|a| a == "--health-check") {
        let listen = std::env::var("GATEWAY_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_owned());
        let healthy = run_health_check(&health_probe_addr(&listen)).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = ViewerConfig::from_env().context("invalid viewer configuration")?;
    init_tracing(&config.log_level)?;

    // One store client for the process, shared by the catalog and the proxy.
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::from_config(&config).await);
    let router = Router::from_config(store, &config);
    let service = ViewerHttpService::from_config(router, &config);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        bucket = %config.bucket,
        callback_path = %config.callback_path,
        probe_concurrency = config.probe_concurrency,
        request_timeout_ms = config.request_timeout_ms,
        version = VERSION,
        "starting Allure report viewer",
    );

    serve(listener, service).await
}
