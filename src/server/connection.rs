// Connection handling module
// Accepts a single TCP connection and serves it on a local task

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::watch;

use super::signal::shutdown_requested;
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Releases one slot of the active-connection counter when dropped
struct ConnectionSlot(Arc<AppState>);

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.active_connections.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Accept a connection, enforcing `max_connections`, and serve it in the background.
///
/// Must be called from within a `LocalSet`.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);
    let slot = ConnectionSlot(Arc::clone(state));

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    tokio::task::spawn_local(serve_connection(stream, peer_addr, slot, shutdown));
}

/// Serve HTTP/1 requests on `stream` until the client closes it, the
/// connection timeout expires, or shutdown is requested.
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    slot: ConnectionSlot,
    shutdown: watch::Receiver<bool>,
) {
    let state = Arc::clone(&slot.0);
    let performance = &state.config.performance;

    let mut builder = http1::Builder::new();
    builder.keep_alive(performance.keep_alive);

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        TokioIo::new(stream),
        service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
    );
    tokio::pin!(conn);

    let serve = async {
        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown_requested(shutdown) => {
                // Finish the in-flight request, then close
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        }
    };

    let timeout = Duration::from_secs(performance.connection_timeout);
    match tokio::time::timeout(timeout, serve).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => logger::log_warning(&format!(
            "Connection from {peer_addr} timed out after {} seconds",
            timeout.as_secs()
        )),
    }

    drop(slot);
}
