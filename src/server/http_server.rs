use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info, warn};

use super::request::from_transport;
use super::response::to_transport;
use crate::dispatcher::{Dispatcher, HandlerResponse};

/// How long a worker blocks in `recv` before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Blocking HTTP/1.1 transport in front of a [`Dispatcher`].
///
/// A fixed pool of OS threads pulls requests off one listening socket; each
/// request is dispatched on the thread that received it.
pub struct HttpServer {
    dispatcher: Arc<Dispatcher>,
    workers: usize,
}

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it gracefully,
/// or joining the worker threads.
pub struct ServerHandle {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// The bound address; useful when started on port 0.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` error if the server doesn't become ready within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Signal every worker to stop and wait for them. In-flight requests
    /// finish first.
    pub fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        for worker in self.workers {
            if worker.join().is_err() {
                error!("Server worker panicked during shutdown");
            }
        }
        info!(addr = %self.addr, "HTTP server stopped");
    }

    /// Block until all workers exit.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread panicked.
    pub fn join(self) -> thread::Result<()> {
        for worker in self.workers {
            worker.join()?;
        }
        Ok(())
    }
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, workers: usize) -> Self {
        Self {
            dispatcher,
            workers: workers.max(1),
        }
    }

    /// Bind `addr` and start the worker threads.
    ///
    /// # Errors
    ///
    /// The address cannot be bound or a worker thread cannot be spawned.
    pub fn start(self, addr: &str) -> io::Result<ServerHandle> {
        let server = tiny_http::Server::http(addr).map_err(|e| io::Error::other(e.to_string()))?;
        let bound = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "not a TCP address"))?;
        let server = Arc::new(server);
        let stop = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(self.workers);
        for idx in 0..self.workers {
            let server = Arc::clone(&server);
            let stop = Arc::clone(&stop);
            let dispatcher = Arc::clone(&self.dispatcher);
            let handle = thread::Builder::new()
                .name(format!("kickstart-worker-{idx}"))
                .spawn(move || worker_loop(&server, &dispatcher, &stop))?;
            workers.push(handle);
        }

        info!(addr = %bound, workers = self.workers, "HTTP server listening");
        Ok(ServerHandle {
            addr: bound,
            stop,
            workers,
        })
    }
}

fn worker_loop(server: &tiny_http::Server, dispatcher: &Dispatcher, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        let mut request = match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                error!(error = %e, "Failed to accept request");
                continue;
            }
        };

        let response = match from_transport(&mut request) {
            Ok(req) => {
                let request_id = req.request_id.to_string();
                let res = dispatcher.dispatch(req);
                to_transport(&res, &request_id)
            }
            Err(e) => {
                let status = e.status();
                warn!(
                    method = %request.method(),
                    url = %request.url(),
                    status,
                    error = %e,
                    "Rejected request before dispatch"
                );
                let message = match status {
                    413 => "Payload Too Large",
                    _ => "Bad Request",
                };
                to_transport(&HandlerResponse::error(status, message), "")
            }
        };

        if let Err(e) = request.respond(response) {
            warn!(error = %e, "Failed to write response");
        }
    }
}
