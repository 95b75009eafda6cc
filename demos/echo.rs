use simple_httpd::{Handler, HandlerError, Request, Response, Server, StatusCode};

struct Echo;

impl Handler for Echo {
    async fn handle(&self, req: Request) -> Result<Response, HandlerError> {
        let mut resp = Response::status(StatusCode::Ok);

        if let Some(content_type) = req.headers().get_ignore_case("Content-Type") {
            resp = resp.header("Content-Type", content_type);
        }

        let body = req.into_body();
        Ok(resp
            .header("Content-Length", body.content_length())
            .stream(body))
    }
}

#[tokio::main]
async fn main() -> Result<(), simple_httpd::BindError> {
    tracing_subscriber::fmt::init();

    let server = Server::builder(Echo)
        .bind(([127, 0, 0, 1], 8080).into())
        .await?;

    let handle = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.shutdown();
        }
    });

    server.launch().await;
    Ok(())
}
