use httpwire::config::Config;
use httpwire::http::request::Request;
use httpwire::http::response::{ResponseBuffer, StatusCode, default_headers};
use httpwire::proxy::ProxyHandler;
use httpwire::server::{self, Handler, HandlerError, Server};
use tracing_subscriber::EnvFilter;

const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>
";

const SERVER_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>
";

const SUCCESS_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>
";

struct Routes {
    proxy: ProxyHandler,
}

impl Handler for Routes {
    async fn call(&self, sink: &mut ResponseBuffer, req: &Request) -> Result<(), HandlerError> {
        if self.proxy.matches(req.target()) {
            return self.proxy.call(sink, req).await;
        }

        let (status, page) = match req.target() {
            "/yourproblem" => (StatusCode::BAD_REQUEST, BAD_REQUEST_PAGE),
            "/myproblem" => (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_PAGE),
            _ => (StatusCode::OK, SUCCESS_PAGE),
        };

        let mut headers = default_headers(page.len());
        headers.insert("Content-Type", "text/html");

        let writer = sink.writer();
        writer.write_status_line(status).await?;
        writer.write_headers(&headers).await?;
        writer.write_body(page.as_bytes()).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let routes = Routes {
        proxy: ProxyHandler::new(&cfg.proxy)?,
    };

    let server = Server::serve(&cfg.server, &cfg.parser, routes).await?;
    tracing::info!("Server started on {}", server.local_addr());

    server::shutdown_signal().await?;
    tracing::info!("Shutdown signal received");

    server.close().await?;
    tracing::info!("Server gracefully stopped");

    Ok(())
}
