use crate::{
    http::{
        request::Request,
        response::{write, Response},
    },
    limits::ConnLimits,
    server::server_impl::Handler,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter},
    net::TcpStream,
    task::JoinError,
};

/// Serves exactly one request on one connection.
pub(crate) struct HttpConnection<H: Handler> {
    handler: Arc<H>,
    conn_limits: ConnLimits,
}

impl<H: Handler> HttpConnection<H> {
    #[inline]
    pub(crate) fn new(handler: Arc<H>, conn_limits: ConnLimits) -> Self {
        Self {
            handler,
            conn_limits: conn_limits.normalized(),
        }
    }

    /// Parses, handles and answers one request, then closes `stream`.
    pub(crate) async fn run(&self, stream: TcpStream, peer: SocketAddr) {
        tracing::trace!(%peer, "connection opened");

        let (read_half, write_half) = stream.into_split();
        self.serve(read_half, write_half, Some(peer)).await;

        tracing::trace!(%peer, "connection closed");
    }

    pub(crate) async fn serve<R, W>(&self, reader: R, writer: W, peer: Option<SocketAddr>)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Unpin,
    {
        let reader = BufReader::with_capacity(self.conn_limits.read_buffer_size, reader);
        let mut writer = BufWriter::with_capacity(self.conn_limits.write_buffer_size, writer);

        let response = match Request::parse(reader).await {
            Ok(mut request) => {
                request.peer_addr = peer;
                self.respond(request).await
            }
            Err(err) if err.is_recoverable() => {
                tracing::debug!(?peer, error = %err, "rejecting malformed request");
                Response::internal_error(err.to_string())
            }
            Err(err) => {
                tracing::debug!(?peer, error = %err, "abandoning connection");
                return;
            }
        };

        match write::write_response(&mut writer, response).await {
            Ok(written) => tracing::trace!(?peer, body_bytes = written, "response sent"),
            Err(err) => {
                tracing::debug!(?peer, error = %err, "failed to write response");
                return;
            }
        }

        if let Err(err) = writer.shutdown().await {
            tracing::trace!(?peer, error = %err, "shutdown failed");
        }
    }

    /// Runs the handler on its own task so a panic is reported like an error.
    async fn respond(&self, request: Request) -> Response {
        let handler = self.handler.clone();
        let method = request.method().to_owned();
        let path = request.path().to_owned();

        match tokio::spawn(async move { handler.handle(request).await }).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::error!(%method, %path, error = %err, "handler failed");
                Response::from_error(&*err)
            }
            Err(err) => {
                let message = panic_message(err);
                tracing::error!(%method, %path, error = %message, "handler panicked");
                Response::internal_error(message)
            }
        }
    }
}

fn panic_message(err: JoinError) -> String {
    let payload = match err.try_into_panic() {
        Ok(payload) => payload,
        Err(err) => return err.to_string(),
    };

    let detail = match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast_ref::<&'static str>() {
            Some(message) => message.to_string(),
            None => return "handler panicked".to_string(),
        },
    };

    format!("handler panicked: {detail}")
}
