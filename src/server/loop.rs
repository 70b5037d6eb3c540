// Server loop module
// Accepts connections until shutdown, then drains the active ones

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use super::signal::{shutdown_requested, ShutdownSignal};
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop until `shutdown` is triggered.
///
/// Must be called from within a `LocalSet`. Returns once every connection has
/// finished or the grace period has elapsed.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<ShutdownSignal>,
) {
    let stop = shutdown_requested(shutdown.subscribe());
    tokio::pin!(stop);

    loop {
        tokio::select! {
            accept_result = listener.accept() => match accept_result {
                Ok((stream, peer_addr)) => {
                    accept_connection(stream, peer_addr, &state, shutdown.subscribe());
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            () = &mut stop => break,
        }
    }

    // Stop accepting before waiting on the remaining connections
    drop(listener);
    drain_connections(&state).await;
}

async fn drain_connections(state: &AppState) {
    logger::log_shutdown_started(state.active_connections.load(Ordering::SeqCst));

    let deadline =
        Instant::now() + Duration::from_secs(state.config.performance.shutdown_grace_period);
    let mut remaining = state.active_connections.load(Ordering::SeqCst);
    while remaining > 0 && Instant::now() < deadline {
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        remaining = state.active_connections.load(Ordering::SeqCst);
    }

    logger::log_shutdown_complete(remaining);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::task::LocalSet;

    async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn test_state(dir: &tempfile::TempDir, configure: impl FnOnce(&mut Config)) -> Arc<AppState> {
        let public = dir.path().join("public");
        std::fs::create_dir(&public).unwrap();
        std::fs::write(public.join("index.html"), "<h1>relay</h1>").unwrap();

        let mut config = Config::default().with_roots(&public, &dir.path().join("uploads"));
        config.logging.access_log = false;
        configure(&mut config);
        Arc::new(AppState::new(config))
    }

    #[tokio::test]
    async fn test_serves_over_tcp_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, |_| {});
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(ShutdownSignal::new());

        let local = LocalSet::new();
        let server = local.spawn_local(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&shutdown),
        ));

        local
            .run_until(async {
                let response = raw_request(
                    addr,
                    "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
                assert!(response.ends_with("<h1>relay</h1>"));

                shutdown.trigger();
                tokio::time::timeout(Duration::from_secs(5), server)
                    .await
                    .unwrap()
                    .unwrap();
            })
            .await;

        assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, |c| c.performance.max_connections = Some(0));
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(ShutdownSignal::new());

        let local = LocalSet::new();
        local.spawn_local(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&shutdown),
        ));

        local
            .run_until(async {
                // Rejected connections are closed before anything is read
                let mut stream = TcpStream::connect(addr).await.unwrap();
                let mut response = Vec::new();
                let read = tokio::time::timeout(
                    Duration::from_secs(5),
                    stream.read_to_end(&mut response),
                )
                .await
                .unwrap();
                assert!(read.map_or(true, |n| n == 0));
                shutdown.trigger();
            })
            .await;
    }
}
