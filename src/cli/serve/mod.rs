//! Module server: routes requests through the response pipeline.

mod handler;
mod lifecycle;
mod path;
mod response;
mod route;

pub use handler::ServeContext;
pub use lifecycle::setup_shutdown_handler;

use crate::{config::ServerConfig, debug, log};
use anyhow::{Context, Result};
use std::sync::Arc;
use tiny_http::{Method, Request, Server};
use tokio::runtime::Handle;

/// Request header carrying the client variant discriminator.
pub const VARIANT_HEADER: &str = "X-Client-Variant";

/// Bind the HTTP server and serve until shutdown.
pub fn serve(config: Arc<ServerConfig>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let ctx = Arc::new(ServeContext::new(Arc::clone(&config)));

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    lifecycle::register_server(Arc::clone(&server));

    log!("serve"; "http://{}", addr);
    run_request_loop(&server, ctx, runtime.handle(), config.serve.workers)
}

fn run_request_loop(
    server: &Server,
    ctx: Arc<ServeContext>,
    runtime: &Handle,
    workers: usize,
) -> Result<()> {
    // Requests block on the pipeline, so each one gets a pool thread
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("failed to create thread pool")?;

    for request in server.incoming_requests() {
        let ctx = Arc::clone(&ctx);
        let runtime = runtime.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx, &runtime) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext, runtime: &Handle) -> Result<()> {
    if lifecycle::is_shutdown() {
        return response::respond_status(request, 503, "503 Service Unavailable");
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_status(request, 405, "405 Method Not Allowed");
    }

    let Some(url_path) = path::normalize_url(request.url()) else {
        return response::respond_not_found(request);
    };
    let Some(route) = ctx.router.route(&url_path) else {
        debug!("serve"; "no route for {}", url_path);
        return response::respond_not_found(request);
    };

    let variant = response::request_header(&request, VARIANT_HEADER)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0);

    match runtime.block_on(handler::prepare(ctx, &route, variant)) {
        Ok(prepared) => response::respond_prepared(request, prepared),
        Err(e) => {
            log!("serve"; "{}: {}", url_path, e);
            response::respond_not_found(request)
        }
    }
}
