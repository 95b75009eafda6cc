use simple_httpd::{
    handler_fn,
    limits::{ConnLimits, ServerLimits},
    HandlerError, Request, Response, Server, StatusCode,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[tokio::main]
async fn main() -> Result<(), simple_httpd::BindError> {
    tracing_subscriber::fmt::init();

    let counter = Arc::new(AtomicUsize::new(0));

    let handler = handler_fn(move |req: Request| {
        let counter = counter.clone();

        async move {
            match req.path() {
                "/count" => {
                    let count = counter.fetch_add(1, Ordering::Relaxed) + 1;
                    Ok(Response::json(format!(r#"{{"count_request": {count}}}"#)))
                }
                "/fail" => Err::<Response, HandlerError>("this route always fails".into()),
                _ => Ok(Response::status(StatusCode::NotFound)
                    .header("Content-Type", "application/json")
                    .body(r#"{"error": "Not Found"}"#)),
            }
        }
    });

    Server::builder(handler)
        .server_limits(ServerLimits {
            max_connections: Some(256),
            ..ServerLimits::default()
        })
        .connection_limits(ConnLimits {
            read_buffer_size: 4 * 1024,
            write_buffer_size: 4 * 1024,
            ..ConnLimits::default()
        })
        .bind(([127, 0, 0, 1], 8080).into())
        .await?
        .launch()
        .await;

    Ok(())
}
