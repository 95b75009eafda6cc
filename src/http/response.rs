//! HTTP response representation and its wire serializer.

use crate::http::types::{self, StatusCode};
use indexmap::IndexMap;
use std::{error::Error, fmt, io};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// HTTP response returned by a [`Handler`](crate::Handler).
///
/// Holds a raw status line, headers in insertion order and a body. On the
/// wire the server always adds `Connection: close` right after the status
/// line and closes the connection after the body, so no framing header is
/// required. `Content-Length` is set automatically only for in-memory bodies
/// built through [`body`](Response::body) or the typed constructors.
///
/// # Examples
/// ```
/// use simple_httpd::{Response, StatusCode};
///
/// let resp = Response::status(StatusCode::NotFound)
///     .header("Content-Type", "text/plain")
///     .body("nothing here");
///
/// assert_eq!(resp.status_line(), "HTTP/1.1 404 Not Found");
/// assert_eq!(resp.headers()["Content-Length"], "12");
/// ```
pub struct Response {
    status_line: String,
    headers: IndexMap<String, String>,
    body: ResponseBody,
    // `Content-Length` was added by `body()`, not by the caller.
    auto_length: bool,
}

/// Body of a [`Response`].
pub enum ResponseBody {
    Bytes(Vec<u8>),
    /// Copied to the connection until end of stream.
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl Response {
    /// Creates a response with a raw status line such as `"HTTP/1.1 200 OK"`.
    ///
    /// The line is written as is, without a terminator.
    #[inline]
    pub fn new(status_line: impl Into<String>) -> Self {
        Self {
            status_line: status_line.into(),
            headers: IndexMap::new(),
            body: ResponseBody::Bytes(Vec::new()),
            auto_length: false,
        }
    }

    /// Creates a response with the canonical `HTTP/1.1` status line of `status`.
    #[inline]
    pub fn status(status: StatusCode) -> Self {
        Self::new(status.status_line())
    }

    /// Sets a header. Setting an existing name replaces its value in place.
    ///
    /// A `Content-Length` set here is kept as is, also for streamed bodies.
    #[inline]
    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        if name.eq_ignore_ascii_case("Content-Length") {
            self.auto_length = false;
        }

        self.headers.insert(name, value.to_string());
        self
    }

    /// Sets an in-memory body and its `Content-Length`.
    #[inline]
    pub fn body(self, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let mut resp = self.header("Content-Length", body.len());
        resp.body = ResponseBody::Bytes(body);
        resp.auto_length = true;
        resp
    }

    /// Sets a streaming body.
    ///
    /// A `Content-Length` added earlier by [`body`](Self::body) or a typed
    /// constructor is removed. One set through [`header`](Self::header) is
    /// kept and must match the stream.
    ///
    /// # Examples
    /// ```
    /// use simple_httpd::Response;
    ///
    /// let file = std::io::Cursor::new(b"streamed".to_vec());
    /// let resp = Response::new("HTTP/1.1 200 OK").stream(file);
    ///
    /// assert!(resp.headers().get("Content-Length").is_none());
    /// ```
    #[inline]
    pub fn stream<R>(mut self, reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        if self.auto_length {
            self.headers.shift_remove("Content-Length");
            self.auto_length = false;
        }

        self.body = ResponseBody::Stream(Box::new(reader));
        self
    }

    #[inline]
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    #[inline]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.headers
    }

    #[inline]
    pub fn body_ref(&self) -> &ResponseBody {
        &self.body
    }

    #[inline]
    pub fn into_body(self) -> ResponseBody {
        self.body
    }
}

// Typed constructors
impl Response {
    #[inline]
    fn with_content_type(content_type: &str, body: impl Into<String>) -> Self {
        Self::status(StatusCode::Ok)
            .header("Content-Type", content_type)
            .body(body.into())
    }

    /// `200 OK` with `Content-Type: application/json`.
    #[inline]
    pub fn json(json: impl Into<String>) -> Self {
        Self::with_content_type("application/json", json)
    }

    /// `200 OK` with `Content-Type: text/html; charset=UTF-8`.
    #[inline]
    pub fn html(html: impl Into<String>) -> Self {
        Self::with_content_type("text/html; charset=UTF-8", html)
    }

    /// `200 OK` with `Content-Type: text/plain; charset=UTF-8`.
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content_type("text/plain; charset=UTF-8", text)
    }

    #[inline]
    pub fn css(css: impl Into<String>) -> Self {
        Self::with_content_type("text/css; charset=UTF-8", css)
    }

    #[inline]
    pub fn js(js: impl Into<String>) -> Self {
        Self::with_content_type("text/javascript; charset=UTF-8", js)
    }

    /// `500 Internal Server Error` with a plain text diagnostic body.
    ///
    /// The body is the error followed by its `source()` chain, one per line.
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        let mut text = err.to_string();

        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str("\ncaused by: ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::internal_error(text)
    }

    pub(crate) fn internal_error(message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message.push_str(StatusCode::InternalServerError.reason());
        }

        Self::status(StatusCode::InternalServerError)
            .header("Content-Type", "text/plain")
            .body(message)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status_line", &self.status_line)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

pub(crate) mod write {
    use super::*;

    /// Writes `response` in wire format and flushes `writer`.
    ///
    /// ```text
    /// STATUS-LINE CRLF
    /// Connection: close CRLF
    /// (NAME ": " VALUE CRLF)*
    /// CRLF
    /// BODY
    /// ```
    ///
    /// Returns the number of body bytes written.
    pub(crate) async fn write_response<W>(writer: &mut W, response: Response) -> io::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut head = Vec::with_capacity(128);

        types::write_latin1(&response.status_line, &mut head);
        head.extend_from_slice(b"\r\nConnection: close\r\n");

        for (name, value) in &response.headers {
            types::write_latin1(name, &mut head);
            head.extend_from_slice(b": ");
            types::write_latin1(value, &mut head);
            head.extend_from_slice(b"\r\n");
        }
        head.extend_from_slice(b"\r\n");

        writer.write_all(&head).await?;

        let written = match response.body {
            ResponseBody::Bytes(bytes) => {
                writer.write_all(&bytes).await?;
                bytes.len() as u64
            }
            ResponseBody::Stream(mut reader) => tokio::io::copy(&mut reader, writer).await?,
        };

        writer.flush().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::{write::write_response, *};
    use crate::http::line::LineReader;
    use tokio::io::AsyncReadExt;

    async fn serialize(response: Response) -> Vec<u8> {
        let mut out = Vec::new();
        write_response(&mut out, response).await.unwrap();
        out
    }

    #[tokio::test]
    async fn wire_format() {
        #[rustfmt::skip]
        let cases: [(Response, &str); 6] = [
            (
                Response::new("HTTP/1.1 204 No Content"),
                "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n",
            ),
            (
                Response::new("HTTP/1.1 200 OK").header("X-A", 1).header("X-B", "two"),
                "HTTP/1.1 200 OK\r\nConnection: close\r\nX-A: 1\r\nX-B: two\r\n\r\n",
            ),
            (
                Response::status(StatusCode::Created).body("done"),
                "HTTP/1.1 201 Created\r\nConnection: close\r\nContent-Length: 4\r\n\r\ndone",
            ),
            (
                Response::new("HTTP/1.1 200 OK").stream(&b"raw stream"[..]),
                "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\nraw stream",
            ),
            (
                Response::text("x").stream(&b"longer streamed body"[..]),
                "HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\nlonger streamed body",
            ),
            (
                Response::new("HTTP/1.1 200 OK").header("Content-Length", 3).stream(&b"abc"[..]),
                "HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 3\r\n\r\nabc",
            ),
        ];

        for (response, expected) in cases {
            assert_eq!(String::from_utf8(serialize(response).await).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn header_replaced_in_place() {
        let resp = Response::new("HTTP/1.1 200 OK")
            .header("A", "1")
            .header("B", "2")
            .header("A", "3");

        let out = serialize(resp).await;
        assert_eq!(out, b"HTTP/1.1 200 OK\r\nConnection: close\r\nA: 3\r\nB: 2\r\n\r\n");
    }

    #[tokio::test]
    async fn round_trip() {
        let body: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let resp = Response::new("HTTP/1.1 299 Custom")
            .header("Content-Type", "application/octet-stream")
            .header("X-Order", "kept")
            .header("X-Latin", "caf\u{e9}")
            .stream(std::io::Cursor::new(body.clone()));

        let wire = serialize(resp).await;
        let mut lines = LineReader::new(&wire[..]);

        let status = lines.read_line().await.unwrap().unwrap();
        assert_eq!(status, b"HTTP/1.1 299 Custom");

        let mut headers = Vec::new();
        while let Some(line) = lines.read_line().await.unwrap() {
            headers.push(types::latin1_to_string(&line));
        }
        assert_eq!(
            headers,
            [
                "Connection: close",
                "Content-Type: application/octet-stream",
                "X-Order: kept",
                "X-Latin: caf\u{e9}",
            ]
        );

        let mut rest = Vec::new();
        lines.into_inner().read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, body);
    }

    #[tokio::test]
    async fn typed_constructors() {
        #[rustfmt::skip]
        let cases = [
            (Response::json("{}"),      "application/json"),
            (Response::html("<p/>"),    "text/html; charset=UTF-8"),
            (Response::text("hi"),      "text/plain; charset=UTF-8"),
            (Response::css("p{}"),      "text/css; charset=UTF-8"),
            (Response::js("f()"),       "text/javascript; charset=UTF-8"),
        ];

        for (resp, content_type) in cases {
            assert_eq!(resp.status_line(), "HTTP/1.1 200 OK");
            assert_eq!(resp.headers()["Content-Type"], content_type);
        }
    }

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("lookup failed")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[tokio::test]
    async fn error_response() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::NotFound, "no such user"));
        let resp = Response::from_error(&err);

        assert_eq!(resp.status_line(), "HTTP/1.1 500 Internal Server Error");
        assert_eq!(resp.headers()["Content-Type"], "text/plain");

        let out = String::from_utf8(serialize(resp).await).unwrap();
        assert!(out.ends_with("\r\n\r\nlookup failed\ncaused by: no such user"));

        let resp = Response::internal_error("");
        match resp.into_body() {
            ResponseBody::Bytes(bytes) => assert_eq!(bytes, b"Internal Server Error"),
            ResponseBody::Stream(_) => panic!("expected in-memory body"),
        }
    }
}
