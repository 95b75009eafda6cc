//! Server configuration: admission control and per-connection buffering.
//!
//! The defaults reproduce the plain model: every accepted connection gets
//! its own task right away, nothing is capped, nothing times out. A stalled
//! client keeps its task (and only its task) waiting.
//!
//! # Examples
//!
//! ```no_run
//! use simple_httpd::{handler_fn, HandlerError, Request, Response, Server};
//! use simple_httpd::limits::{ConnLimits, ServerLimits};
//! use std::net::SocketAddr;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let addr: SocketAddr = "127.0.0.1:8080".parse()?;
//!     let handler = handler_fn(|_: Request| async {
//!         Ok::<_, HandlerError>(Response::text("hi"))
//!     });
//!
//!     Server::builder(handler)
//!         .server_limits(ServerLimits {
//!             max_connections: Some(512),
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             read_buffer_size: 16 * 1024,
//!             ..ConnLimits::default()
//!         })
//!         .bind(addr)
//!         .await?
//!         .launch()
//!         .await;
//!
//!     Ok(())
//! }
//! ```

use tokio::sync::Semaphore;

/// Controls connection admission.
///
/// # Connection management
/// ```text
///        [------------]
///        [ Tcp accept ] <==========================\\
///        [------------]                            ||
///              ||                                  ||
///              \/                                  ||
///   [------------------------]                     ||
///   [ spawn connection task  ] ====================//
///   [------------------------]
///              ||
///              \/
///   parse -> handler -> write response -> close
/// ```
///
/// With `max_connections` set, the accept loop first waits for a free slot,
/// so at most that many connections are being served at once. Further clients
/// wait in the kernel backlog. The value is clamped to
/// `1..=Semaphore::MAX_PERMITS`, so `Some(0)` serves one connection at a time.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Maximum number of connections served concurrently (default: `None`, unbounded).
    pub max_connections: Option<usize>,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: None,

            _priv: (),
        }
    }
}

/// Per-connection stream buffering.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Capacity of the buffered reader over the socket (default: `8 KiB`).
    ///
    /// The request body shares this buffer, so it also bounds how much of the
    /// body is read ahead of the handler.
    pub read_buffer_size: usize,

    /// Capacity of the buffered writer over the socket (default: `8 KiB`).
    pub write_buffer_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ConnLimits {
    fn default() -> Self {
        Self {
            read_buffer_size: 8 * 1024,
            write_buffer_size: 8 * 1024,

            _priv: (),
        }
    }
}

impl ServerLimits {
    #[inline]
    pub(crate) fn normalized(mut self) -> Self {
        self.max_connections = self
            .max_connections
            .map(|max| max.clamp(1, Semaphore::MAX_PERMITS));
        self
    }
}

impl ConnLimits {
    // A zero capacity would make every read return end of stream.
    #[inline]
    pub(crate) fn normalized(mut self) -> Self {
        self.read_buffer_size = self.read_buffer_size.max(1);
        self.write_buffer_size = self.write_buffer_size.max(1);
        self
    }
}
