use simple_httpd::{Handler, HandlerError, Request, Response, Server};

struct HelloWorld;

impl Handler for HelloWorld {
    async fn handle(&self, _: Request) -> Result<Response, HandlerError> {
        Ok(Response::text("Hello, world!"))
    }
}

#[tokio::main]
async fn main() -> Result<(), simple_httpd::BindError> {
    tracing_subscriber::fmt::init();

    Server::serve(([127, 0, 0, 1], 8080).into(), HelloWorld).await
}
