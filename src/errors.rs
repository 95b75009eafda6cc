use std::{error, fmt, io, net::SocketAddr};

/// Error type returned by a [`Handler`](crate::Handler).
///
/// Any error converts into it with `?`. The server answers with
/// `500 Internal Server Error` carrying the error's description.
pub type HandlerError = Box<dyn error::Error + Send + Sync>;

/// The listening socket could not be bound.
#[derive(Debug)]
pub struct BindError {
    pub(crate) addr: SocketAddr,
    pub(crate) source: io::Error,
}

impl BindError {
    /// Address that failed to bind.
    #[inline]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl error::Error for BindError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to bind {}: {}", self.addr, self.source)
    }
}

/// Per-connection failures raised while reading a request.
#[derive(Debug, PartialEq)]
pub(crate) enum ErrorKind {
    /// Peer closed the stream before sending a request line.
    EmptyRequest,
    InvalidRequestLine(String),
    InvalidHeader(String),
    Io(IoError),
}

impl ErrorKind {
    /// Whether a response can still be framed for this failure.
    #[inline]
    pub(crate) const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidRequestLine(_) | Self::InvalidHeader(_))
    }
}

impl error::Error for ErrorKind {}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRequest => write!(f, "connection closed before a request line was received"),
            Self::InvalidRequestLine(line) => write!(f, "malformed request line: {line:?}"),
            Self::InvalidHeader(line) => write!(f, "malformed header line: {line:?}"),
            Self::Io(err) => write!(f, "I/O error: {}", err.0),
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}
