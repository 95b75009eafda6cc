use crate::{
    errors::{BindError, HandlerError},
    http::{request::Request, response::Response},
    limits::{ConnLimits, ServerLimits},
    server::connection::HttpConnection,
};
use std::{
    future::{self, Future},
    io,
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};
use tokio::{
    net::TcpListener,
    sync::{watch, OwnedSemaphorePermit, Semaphore},
};

/// Pause after a failed `accept()`, so a persistent failure (e.g. `EMFILE`)
/// does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A trait for handling HTTP requests and generating responses.
///
/// The handler receives the parsed [`Request`] by value, including its body
/// stream, and returns the [`Response`] to send. Returning `Err` or panicking
/// produces `500 Internal Server Error` with the error text as body.
/// Use `&self` for data shared across connections (e.g. a database pool).
///
/// # Examples
///
/// ```
/// use simple_httpd::{Handler, HandlerError, Request, Response, StatusCode};
///
/// struct MyHandler;
///
/// impl Handler for MyHandler {
///     async fn handle(&self, req: Request) -> Result<Response, HandlerError> {
///         if req.path() == "/echo" {
///             Ok(Response::text("Echo response"))
///         } else {
///             Ok(Response::status(StatusCode::NotFound).body("Not found :("))
///         }
///     }
/// }
/// ```
pub trait Handler
where
    Self: Sync + Send + 'static,
{
    /// Processes an HTTP request and generates a response.
    fn handle(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, HandlerError>> + Send;
}

/// [`Handler`] backed by a function, see [`handler_fn`].
#[derive(Debug, Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps an async function or closure into a [`Handler`].
///
/// # Examples
///
/// ```
/// use simple_httpd::{handler_fn, HandlerError, Request, Response};
///
/// async fn hello(req: Request) -> Result<Response, HandlerError> {
///     let name = req.query().value("name").unwrap_or("world");
///     Ok(Response::text(format!("Hello, {name}!")))
/// }
///
/// let handler = handler_fn(hello);
/// let closure = handler_fn(|_: Request| async { Ok::<_, HandlerError>(Response::json("{}")) });
/// ```
#[inline]
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send,
{
    #[inline]
    fn handle(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, HandlerError>> + Send {
        (self.f)(request)
    }
}

/// An HTTP server answering one request per connection.
///
/// Every accepted connection is served on its own task: the request is
/// parsed, passed to the [`Handler`], the response is written with
/// `Connection: close`, and the connection is closed. A slow client only
/// holds up its own task.
///
/// # Examples
///
/// ```no_run
/// use simple_httpd::{handler_fn, HandlerError, Request, Response, Server};
///
/// #[tokio::main]
/// async fn main() -> Result<(), simple_httpd::BindError> {
///     let handler = handler_fn(|_: Request| async {
///         Ok::<_, HandlerError>(Response::text("Hello world!"))
///     });
///
///     Server::builder(handler)
///         .bind(([127, 0, 0, 1], 8080).into())
///         .await?
///         .launch()
///         .await;
///
///     Ok(())
/// }
/// ```
pub struct Server<H: Handler> {
    listener: TcpListener,
    connection: Arc<HttpConnection<H>>,
    server_limits: ServerLimits,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<H: Handler> Server<H> {
    /// Creates a new builder around `handler`.
    #[inline]
    pub fn builder(handler: H) -> ServerBuilder<H> {
        ServerBuilder {
            handler,
            server_limits: None,
            connection_limits: None,
        }
    }

    /// Binds `addr` with default limits and serves until stopped.
    ///
    /// Returns early only when binding fails.
    pub async fn serve(addr: SocketAddr, handler: H) -> Result<(), BindError> {
        Self::builder(handler).bind(addr).await?.launch().await;
        Ok(())
    }

    /// Address of the listening socket.
    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a handle that stops [`launch`](Self::launch) from any task.
    #[inline]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Accepts connections until [`ShutdownHandle::shutdown`] is called.
    ///
    /// Failed accepts are logged and skipped. On stop the listening socket is
    /// closed; connections already accepted are served to completion.
    pub async fn launch(self) {
        let Server {
            listener,
            connection,
            server_limits,
            mut shutdown_rx,
            ..
        } = self;

        let slots = server_limits
            .max_connections
            .map(|max| Arc::new(Semaphore::new(max)));

        loop {
            let permit = match &slots {
                Some(slots) => tokio::select! {
                    biased;

                    _ = stopped(&mut shutdown_rx) => break,
                    permit = slots.clone().acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        Err(_) => break,
                    },
                },
                None => None,
            };

            tokio::select! {
                biased;

                _ = stopped(&mut shutdown_rx) => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => Self::dispatch(&connection, stream, peer, permit),
                    Err(err) => accept_failed(err).await,
                },
            }
        }

        match listener.local_addr() {
            Ok(addr) => tracing::info!(address = %addr, "server stopped"),
            Err(_) => tracing::info!("server stopped"),
        }
    }

    #[inline]
    fn dispatch(
        connection: &Arc<HttpConnection<H>>,
        stream: tokio::net::TcpStream,
        peer: SocketAddr,
        permit: Option<OwnedSemaphorePermit>,
    ) {
        let connection = connection.clone();

        tokio::spawn(async move {
            connection.run(stream, peer).await;
            drop(permit);
        });
    }
}

async fn accept_failed(err: io::Error) {
    tracing::warn!(error = %err, "failed to accept connection");
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

async fn stopped(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            future::pending::<()>().await;
        }
    }
}

/// Stops a running [`Server`]. Cheap to clone and safe to use from any task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Makes the accept loop exit and close the listening socket.
    ///
    /// A pending `accept()` is interrupted. Calling it more than once, or
    /// before [`Server::launch`], is fine.
    #[inline]
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// Builder for configuring and creating [`Server`] instances.
pub struct ServerBuilder<H: Handler> {
    handler: H,
    server_limits: Option<ServerLimits>,
    connection_limits: Option<ConnLimits>,
}

impl<H: Handler> ServerBuilder<H> {
    /// Configures connection admission.
    #[inline]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    /// Configures per-connection buffering.
    #[inline]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Binds a listening socket to `addr` and creates the [`Server`].
    ///
    /// Binding is the only fatal error; nothing is retried.
    pub async fn bind(self, addr: SocketAddr) -> Result<Server<H>, BindError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BindError { addr, source })?;

        Ok(self.listener(listener))
    }

    /// Creates the [`Server`] on an already bound listener.
    pub fn listener(self, listener: TcpListener) -> Server<H> {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(address = %addr, "listening"),
            Err(err) => tracing::warn!(error = %err, "listening on unknown address"),
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Server {
            listener,
            connection: Arc::new(HttpConnection::new(
                Arc::new(self.handler),
                self.connection_limits.unwrap_or_default(),
            )),
            server_limits: self.server_limits.unwrap_or_default().normalized(),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;
    use std::time::Duration;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
        task::JoinHandle,
        time::{sleep, timeout, Instant},
    };

    struct Router;

    impl Handler for Router {
        async fn handle(&self, mut req: Request) -> Result<Response, HandlerError> {
            match req.path() {
                "/search" => Ok(Response::text(req.query().value("q").unwrap_or(""))),
                "/echo" => {
                    let body = req.body_mut().read_to_vec().await?;
                    Ok(Response::new("HTTP/1.1 200 OK").body(body))
                }
                "/stream" => Ok(Response::new("HTTP/1.1 200 OK").stream(req.into_body())),
                "/slow" => {
                    sleep(Duration::from_millis(300)).await;
                    Ok(Response::text(format!("slow {}", req.query().value("id").unwrap_or(""))))
                }
                "/fail" => Err("handler exploded".into()),
                _ => Ok(Response::status(StatusCode::NotFound).body("not found")),
            }
        }
    }

    async fn start(limits: ServerLimits) -> (SocketAddr, ShutdownHandle, JoinHandle<()>) {
        let server = Server::builder(Router)
            .server_limits(limits)
            .bind(([127, 0, 0, 1], 0).into())
            .await
            .unwrap();

        let addr = server.local_addr().unwrap();
        let handle = server.shutdown_handle();
        (addr, handle, tokio::spawn(server.launch()))
    }

    async fn request(addr: SocketAddr, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw).await.unwrap();

        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn query_request() {
        let (addr, handle, _) = start(ServerLimits::default()).await;

        let out = request(addr, b"GET /search?q=rust%20lang HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(out.starts_with("HTTP/1.1 200 OK\r\nConnection: close\r\n"));
        assert!(out.ends_with("\r\n\r\nrust lang"));

        handle.shutdown();
    }

    #[tokio::test]
    async fn echo_body() {
        let (addr, handle, _) = start(ServerLimits::default()).await;

        #[rustfmt::skip]
        let cases: [(&[u8], &str); 3] = [
            (b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello", "hello"),
            (b"POST /echo HTTP/1.1\r\nContent-Length: 0\r\n\r\n",      ""),
            (b"POST /stream HTTP/1.1\r\nContent-Length: 6\r\n\r\nstream", "stream"),
        ];

        for (raw, body) in cases {
            let out = request(addr, raw).await;

            assert!(out.starts_with("HTTP/1.1 200 OK\r\nConnection: close\r\n"));
            assert!(out.ends_with(&format!("\r\n\r\n{body}")));
        }

        handle.shutdown();
    }

    #[tokio::test]
    async fn handler_error_is_500() {
        let (addr, handle, _) = start(ServerLimits::default()).await;

        let out = request(addr, b"GET /fail HTTP/1.1\r\n\r\n").await;
        assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\nConnection: close\r\n"));
        assert!(out.contains("\r\nContent-Type: text/plain\r\n"));
        assert!(out.ends_with("\r\n\r\nhandler exploded"));

        handle.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn no_cross_talk() {
        let (addr, handle, _) = start(ServerLimits::default()).await;

        let slow = tokio::spawn(request(addr, b"GET /slow?id=1 HTTP/1.1\r\n\r\n"));
        sleep(Duration::from_millis(50)).await;

        let fast = timeout(
            Duration::from_millis(250),
            request(addr, b"GET /search?q=fast HTTP/1.1\r\n\r\n"),
        )
        .await
        .expect("fast request must not wait for the slow one");

        assert!(fast.ends_with("\r\n\r\nfast"));
        assert!(slow.await.unwrap().ends_with("\r\n\r\nslow 1"));

        handle.shutdown();
    }

    #[tokio::test]
    async fn bounded_connections() {
        let limits = ServerLimits {
            max_connections: Some(1),
            ..ServerLimits::default()
        };
        let (addr, handle, _) = start(limits).await;

        let started = Instant::now();
        let first = tokio::spawn(request(addr, b"GET /slow?id=1 HTTP/1.1\r\n\r\n"));
        let second = tokio::spawn(request(addr, b"GET /slow?id=2 HTTP/1.1\r\n\r\n"));

        assert!(first.await.unwrap().ends_with("slow 1"));
        assert!(second.await.unwrap().ends_with("slow 2"));

        // One slot: the two 300ms handlers ran one after the other.
        assert!(started.elapsed() >= Duration::from_millis(600));

        handle.shutdown();
    }

    #[tokio::test]
    async fn unbounded_connections_overlap() {
        let (addr, handle, _) = start(ServerLimits::default()).await;

        let started = Instant::now();
        let first = tokio::spawn(request(addr, b"GET /slow?id=1 HTTP/1.1\r\n\r\n"));
        let second = tokio::spawn(request(addr, b"GET /slow?id=2 HTTP/1.1\r\n\r\n"));

        assert!(first.await.unwrap().ends_with("slow 1"));
        assert!(second.await.unwrap().ends_with("slow 2"));
        assert!(started.elapsed() < Duration::from_millis(600));

        handle.shutdown();
    }

    #[tokio::test]
    async fn zero_connection_limit_still_serves() {
        let limits = ServerLimits {
            max_connections: Some(0),
            ..ServerLimits::default()
        };
        let (addr, handle, _) = start(limits).await;

        let out = timeout(
            Duration::from_secs(1),
            request(addr, b"GET /search?q=open HTTP/1.1\r\n\r\n"),
        )
        .await
        .expect("a zero limit must not block the accept loop");
        assert!(out.ends_with("\r\n\r\nopen"));

        handle.shutdown();
    }

    #[tokio::test]
    async fn accept_error_backs_off() {
        let started = Instant::now();
        accept_failed(io::Error::from(io::ErrorKind::Other)).await;

        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn shutdown_stops_accepting() {
        let (addr, handle, task) = start(ServerLimits::default()).await;

        handle.shutdown();
        handle.shutdown();
        timeout(Duration::from_secs(1), task).await.unwrap().unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = match Server::builder(Router).bind(addr).await {
            Ok(_) => panic!("address is already in use"),
            Err(err) => err,
        };

        assert_eq!(err.addr(), addr);
        assert_eq!(err.source.kind(), io::ErrorKind::AddrInUse);
    }
}
