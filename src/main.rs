use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use live_chess::api::router::create_router;
use live_chess::api::state::AppState;
use live_chess::config::AppConfig;

const DEFAULT_LOG_FILTER: &str = "live_chess=info,tower_http=info";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env();

    // Exit status only; used as a container HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let code = match check_health(config.port).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("health check failed: {e}");
                1
            }
        };
        std::process::exit(code);
    }

    init_tracing();

    let bind_addr = config.bind_addr();
    let max_matches = config.max_matches;
    let listener = TcpListener::bind(&bind_addr).await?;
    let app = create_router(AppState::new(config));

    tracing::info!(
        max_matches,
        version = env!("CARGO_PKG_VERSION"),
        "live-chess listening on {bind_addr}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested, draining connections");
    }
}

/// GET /health on the local server and require a 200.
async fn check_health(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await?;
    stream
        .write_all(
            format!("GET /health HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n\r\n")
                .as_bytes(),
        )
        .await?;

    let mut head = [0u8; 64];
    let n = stream.read(&mut head).await?;
    let status_line = String::from_utf8_lossy(&head[..n]);
    let status_line = status_line.lines().next().unwrap_or_default();
    if is_ok_status(status_line) {
        Ok(())
    } else {
        Err(format!("unexpected response: {status_line}").into())
    }
}

fn is_ok_status(status_line: &str) -> bool {
    let mut parts = status_line.split_whitespace();
    matches!(
        (parts.next(), parts.next()),
        (Some(version), Some("200")) if version.starts_with("HTTP/1.")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_parsing() {
        assert!(is_ok_status("HTTP/1.1 200 OK"));
        assert!(is_ok_status("HTTP/1.0 200"));
        assert!(!is_ok_status("HTTP/1.1 503 Service Unavailable"));
        assert!(!is_ok_status("garbage"));
        assert!(!is_ok_status(""));
    }

    #[tokio::test]
    async fn health_check_against_live_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = create_router(AppState::new(AppConfig::default()));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        assert!(check_health(port).await.is_ok());
    }
}
