use simple_httpd::{Handler, HandlerError, Request, Response, Server};
use std::fmt::Write;
use tracing_subscriber::EnvFilter;

struct Inspector;

impl Handler for Inspector {
    async fn handle(&self, mut req: Request) -> Result<Response, HandlerError> {
        let mut out = String::new();

        writeln!(out, "peer:    {:?}", req.peer_addr())?;
        writeln!(out, "method:  {}", req.method())?;
        writeln!(out, "path:    {}", req.path())?;
        writeln!(out, "version: {}", req.version())?;

        writeln!(out, "\nquery:")?;
        for (key, values) in req.query().multi() {
            writeln!(out, "  {key} = {values:?}")?;
        }

        writeln!(out, "\nheaders:")?;
        for (name, value) in req.headers().iter() {
            writeln!(out, "  {name}: {value}")?;
        }

        let body = req.body_mut().read_to_vec().await?;
        writeln!(out, "\nbody ({} bytes):", body.len())?;
        out.push_str(&String::from_utf8_lossy(&body));

        Ok(Response::text(out))
    }
}

#[tokio::main]
async fn main() -> Result<(), simple_httpd::BindError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("simple_httpd=trace".parse().unwrap()))
        .init();

    Server::serve(([127, 0, 0, 1], 8080).into(), Inspector).await
}
