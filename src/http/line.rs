//! Line framing for the request head.
//!
//! A line ends once both a `\r` and a `\n` byte have been seen since the
//! line started, whether or not they are adjacent. Neither byte is ever part
//! of the returned line. So `"GET / HTTP/1.1\r\n"` and `"GET /\r HTTP/1.1\n"`
//! both produce the bytes of a single line, while a lone `\n` keeps the line
//! open until a `\r` arrives.

use memchr::memchr2;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub(crate) struct LineReader<R> {
    inner: R,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    #[inline]
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the underlying reader, positioned right after the last terminator read.
    #[inline]
    pub(crate) fn into_inner(self) -> R {
        self.inner
    }

    /// Reads the next line without its terminator.
    ///
    /// Returns `None` when no byte was accumulated, which is either a blank
    /// line or the end of the stream.
    pub(crate) async fn read_line(&mut self) -> Result<Option<Vec<u8>>, io::Error> {
        let mut line = Vec::new();
        let (mut cr, mut lf) = (false, false);

        while !(cr && lf) {
            let used = {
                let available = self.inner.fill_buf().await?;
                if available.is_empty() {
                    break;
                }

                match memchr2(b'\r', b'\n', available) {
                    Some(0) => {
                        match available[0] {
                            b'\r' => cr = true,
                            _ => lf = true,
                        }
                        1
                    }
                    Some(pos) => {
                        line.extend_from_slice(&available[..pos]);
                        pos
                    }
                    None => {
                        line.extend_from_slice(available);
                        available.len()
                    }
                }
            };

            self.inner.consume(used);
        }

        Ok((!line.is_empty()).then_some(line))
    }
}
