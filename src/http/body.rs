//! Request body bounded by `Content-Length`.

use std::{
    fmt, io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncBufRead, AsyncRead, AsyncReadExt, ReadBuf, Take};

pub(crate) type Source = Box<dyn AsyncBufRead + Send + Unpin>;

/// The request body as a byte stream.
///
/// Yields at most `Content-Length` bytes from the connection, then reports
/// end of stream. Reads past the end return `0` immediately without touching
/// the connection. If the peer closes early the stream ends early as well.
///
/// # Examples
/// ```
/// use simple_httpd::{Request, Response, HandlerError};
///
/// async fn echo(mut req: Request) -> Result<Response, HandlerError> {
///     let body = req.body_mut().read_to_vec().await?;
///     Ok(Response::text(String::from_utf8_lossy(&body)))
/// }
/// ```
pub struct Body {
    inner: Take<Source>,
    content_length: u64,
}

impl Body {
    #[inline]
    pub(crate) fn new(source: Source, content_length: u64) -> Self {
        Self {
            inner: source.take(content_length),
            content_length,
        }
    }

    /// The declared `Content-Length`, `0` if it was absent or invalid.
    #[inline]
    pub const fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Bytes left before the body ends.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }

    /// Reads the rest of the body into memory.
    pub async fn read_to_vec(&mut self) -> Result<Vec<u8>, io::Error> {
        let mut buffer = Vec::with_capacity(self.remaining().min(64 * 1024) as usize);
        self.inner.read_to_end(&mut buffer).await?;
        Ok(buffer)
    }
}

impl AsyncRead for Body {
    #[inline]
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncBufRead for Body {
    #[inline]
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        Pin::new(&mut self.get_mut().inner).poll_fill_buf(cx)
    }

    #[inline]
    fn consume(mut self: Pin<&mut Self>, amt: usize) {
        Pin::new(&mut self.inner).consume(amt)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("content_length", &self.content_length)
            .field("remaining", &self.remaining())
            .finish()
    }
}
