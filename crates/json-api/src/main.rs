//! Gatehouse JSON API Server

use std::process;

use salvo::prelude::*;
use tracing::{error, info};

use gatehouse_app::{context::AppContext, mail};

use crate::{config::ServerConfig, state::State};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod auth;
mod config;
mod extensions;
mod healthcheck;
mod login;
mod me;
mod observability;
mod router;
mod sessions;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;

/// Gatehouse JSON API Server entry point
///
/// Builds every process-wide service, including the database password
/// rotation, before the listener is bound. Any startup failure exits with
/// status 1.
#[tokio::main]
pub async fn main() {
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(e) = observability::init(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "subscriber failed to initialize, stderr is the only sink"
        )]
        {
            eprintln!("Observability error: {e}");
        }

        process::exit(1);
    }

    let mailer = mail::connect(config.mail.settings()).await;

    let app = match AppContext::bootstrap(&config.app_settings(), mailer).await {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            process::exit(1);
        }
    };

    let service = router::service(
        State::from_app_context(&app),
        config.server.request_timeout(),
        router::app_router(),
    );

    let addr = config.socket_addr();

    let listener = match TcpListener::new(addr.clone()).try_bind().await {
        Ok(listener) => listener,
        Err(bind_error) => {
            error!("failed to bind {addr}: {bind_error}");

            app.db.close().await;

            process::exit(1);
        }
    };

    info!("listening on {addr}");

    let server = Server::new(listener);

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(service).await;

    app.db.close().await;

    info!("server stopped");
}
