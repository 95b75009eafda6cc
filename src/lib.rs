//! simple_httpd - a small, concurrent HTTP/1.x server core
//!
//! Accepts TCP connections, parses one request per connection, hands it to a
//! user [`Handler`] and writes the handler's [`Response`] back before closing
//! the connection. Every connection runs on its own Tokio task, so a slow
//! client never holds up another one.
//!
//! # Protocol Support
//!
//! - **One request per connection**: every response carries `Connection: close`
//! - **Request bodies**: exactly `Content-Length` bytes, exposed as a stream ([`Body`])
//! - **Response bodies**: in memory or streamed from any `AsyncRead`
//! - **Query strings**: form-style decoding with repeated keys ([`query`])
//!
//! Chunked transfer coding, keep-alive, pipelining and TLS are not supported.
//!
//! # Error handling
//!
//! A handler that returns `Err` or panics produces
//! `500 Internal Server Error` with a `text/plain` body describing the
//! failure. Malformed request lines and header lines are answered the same
//! way. A connection that closes before sending a request line is dropped
//! silently. Only binding the listening socket is fatal ([`BindError`]).
//!
//! # Line framing
//!
//! The request head is split into lines leniently: a line ends once both a
//! `CR` and an `LF` have been seen since it started, in either order and not
//! necessarily adjacent. `CR` and `LF` bytes are never part of a line. The
//! first empty line ends the head. A bare `LF` therefore does not end a line
//! on its own.
//!
//! # Examples
//!
//! Quick start:
//! ```no_run
//! use simple_httpd::{Handler, HandlerError, Request, Response, Server};
//!
//! struct MyHandler;
//!
//! impl Handler for MyHandler {
//!     async fn handle(&self, _: Request) -> Result<Response, HandlerError> {
//!         Ok(Response::text("Hello World!"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), simple_httpd::BindError> {
//!     Server::serve(([127, 0, 0, 1], 8080).into(), MyHandler).await
//! }
//! ```
//! Routing and bodies:
//! ```no_run
//! use simple_httpd::{handler_fn, HandlerError, Request, Response, Server, StatusCode};
//!
//! async fn route(mut req: Request) -> Result<Response, HandlerError> {
//!     match (req.method(), req.path()) {
//!         ("GET", "/hello") => {
//!             let name = req.query().value("name").unwrap_or("world");
//!             Ok(Response::text(format!("Hello, {name}!")))
//!         }
//!         ("POST", "/echo") => {
//!             let body = req.body_mut().read_to_vec().await?;
//!             Ok(Response::status(StatusCode::Ok).body(body))
//!         }
//!         _ => Ok(Response::status(StatusCode::NotFound).body("Not found")),
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), simple_httpd::BindError> {
//!     Server::serve(([127, 0, 0, 1], 8080).into(), handler_fn(route)).await
//! }
//! ```
//! Advanced configuration and shutdown:
//! ```no_run
//! use simple_httpd::{handler_fn, HandlerError, Request, Response, Server};
//! use simple_httpd::limits::{ConnLimits, ServerLimits};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), simple_httpd::BindError> {
//!     let handler = handler_fn(|_: Request| async {
//!         Ok::<_, HandlerError>(Response::json(r#"{"status":"ok"}"#))
//!     });
//!
//!     let server = Server::builder(handler)
//!         .server_limits(ServerLimits {
//!             max_connections: Some(1024),
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             read_buffer_size: 16 * 1024,
//!             ..ConnLimits::default()
//!         })
//!         .bind(([0, 0, 0, 0], 8080).into())
//!         .await?;
//!
//!     let handle = server.shutdown_handle();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         handle.shutdown();
//!     });
//!
//!     server.launch().await;
//!     Ok(())
//! }
//! ```

pub(crate) mod http {
    pub(crate) mod body;
    pub(crate) mod line;
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::{BindError, HandlerError},
    http::{
        body::Body,
        query,
        request::Request,
        response::{Response, ResponseBody},
        types::{FieldMap, Headers, QueryParameters, RequestLine, StatusCode},
    },
    server::server_impl::{handler_fn, Handler, HandlerFn, Server, ServerBuilder, ShutdownHandle},
};
