use crate::{
    errors::ErrorKind,
    http::{
        body::Body,
        line::LineReader,
        query::Query,
        types::{self, Headers, QueryParameters, RequestLine},
    },
};
use std::{io, net::SocketAddr};
use tokio::io::AsyncBufRead;

/// A parsed HTTP request.
///
/// # Wire format
///
/// ```text
/// METHOD SP PATH[?QUERY] SP VERSION CRLF
/// (NAME ":" VALUE CRLF)*
/// CRLF
/// BODY
/// ```
///
/// - The request line is split on whitespace into exactly three tokens.
///   Method and version are not validated.
/// - `QUERY` is decoded into [`QueryParameters`], see [`Query`].
/// - A header line is split on its first `:`, name and value are trimmed.
///   Names are stored as received; use [`Headers::get_ignore_case`] for
///   case-insensitive lookups.
/// - `BODY` is exactly `Content-Length` bytes. A missing or non-numeric
///   `Content-Length` means an empty body. `Transfer-Encoding` is not
///   interpreted.
/// - `Content-Length` is the one header the parser reads itself, and it is
///   matched case-insensitively: `content-length: 3` also frames a 3-byte
///   body. Strict servers that only look up the exact `Content-Length` name
///   would read an empty body there.
///
/// The head is read as ISO-8859-1, so every byte maps to one `char`.
/// Line endings are lenient, see the note on [line framing](crate#line-framing).
#[derive(Debug)]
pub struct Request {
    request_line: RequestLine,
    headers: Headers,
    query: QueryParameters,
    body: Body,

    pub(crate) peer_addr: Option<SocketAddr>,
}

// Public API
impl Request {
    /// Reads a request head from `reader`; the body streams from what follows.
    ///
    /// Malformed input is reported as [`io::ErrorKind::InvalidData`], an empty
    /// stream as [`io::ErrorKind::UnexpectedEof`].
    ///
    /// # Examples
    /// ```
    /// # #[tokio::main]
    /// # async fn main() -> std::io::Result<()> {
    /// use simple_httpd::Request;
    ///
    /// let raw: &'static [u8] = b"GET /search?q=rust%20lang HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let req = Request::read_from(raw).await?;
    ///
    /// assert_eq!(req.path(), "/search");
    /// assert_eq!(req.query().value("q"), Some("rust lang"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn read_from<R>(reader: R) -> Result<Request, io::Error>
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self::parse(reader).await.map_err(|err| match err {
            ErrorKind::Io(err) => err.0,
            ErrorKind::EmptyRequest => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        })
    }

    #[inline]
    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    #[inline]
    pub fn method(&self) -> &str {
        self.request_line.method()
    }

    /// The path without the query string.
    #[inline]
    pub fn path(&self) -> &str {
        self.request_line.path()
    }

    #[inline]
    pub fn version(&self) -> &str {
        self.request_line.version()
    }

    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the first value of the header `name`, matched case-sensitively.
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    #[inline]
    pub fn query(&self) -> &QueryParameters {
        &self.query
    }

    #[inline]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[inline]
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    #[inline]
    pub fn into_body(self) -> Body {
        self.body
    }

    /// Remote address of the connection, `None` outside a server.
    #[inline]
    pub const fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}

// Parsing
impl Request {
    pub(crate) async fn parse<R>(reader: R) -> Result<Request, ErrorKind>
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let mut lines = LineReader::new(reader);

        let first_line = lines.read_line().await?.ok_or(ErrorKind::EmptyRequest)?;
        let (request_line, raw_query) = Self::parse_request_line(&first_line)?;

        let mut query = QueryParameters::new();
        if let Some(raw_query) = raw_query {
            Query::parse_into(&mut query, &raw_query);
        }

        let mut headers = Headers::new();
        while let Some(line) = lines.read_line().await? {
            Self::parse_header(&mut headers, &line)?;
        }

        let content_length = Self::content_length(&headers);
        let body = Body::new(Box::new(lines.into_inner()), content_length);

        Ok(Request {
            request_line,
            headers,
            query,
            body,
            peer_addr: None,
        })
    }

    fn parse_request_line(line: &[u8]) -> Result<(RequestLine, Option<String>), ErrorKind> {
        let line = types::latin1_to_string(line);

        let mut tokens = line.splitn(3, |c: char| c.is_ascii_whitespace());
        let (Some(method), Some(target), Some(version)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ErrorKind::InvalidRequestLine(line));
        };

        if method.is_empty() || target.is_empty() || version.is_empty() {
            return Err(ErrorKind::InvalidRequestLine(line));
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (target, None),
        };

        let request_line = RequestLine {
            method: method.to_owned(),
            path: path.to_owned(),
            version: version.to_owned(),
        };

        Ok((request_line, query))
    }

    fn parse_header(headers: &mut Headers, line: &[u8]) -> Result<(), ErrorKind> {
        let line = types::latin1_to_string(line);

        let Some((name, value)) = line.split_once(':') else {
            return Err(ErrorKind::InvalidHeader(line));
        };

        headers.insert(trim(name).to_owned(), trim(value).to_owned());
        Ok(())
    }

    fn content_length(headers: &Headers) -> u64 {
        let Some(value) = headers.get_ignore_case("Content-Length") else {
            return 0;
        };

        types::slice_to_u64(value.as_bytes()).unwrap_or_else(|| {
            tracing::debug!(value, "ignoring invalid Content-Length, assuming empty body");
            0
        })
    }
}

#[inline]
fn trim(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_ascii_whitespace())
}
