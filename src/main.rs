/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{Context, Result};
use clap::Parser;
use stockhub::{router, AppState, Cli, QuizCatalog, SessionPool, UciEngine};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.engine_config();
    tracing::info!(
        engine = %config.path.display(),
        capacity = cli.capacity,
        depth = config.depth,
        "starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let pool = SessionPool::new(cli.capacity, move || UciEngine::spawn(&config));
    let app = router(AppState {
        pool,
        quiz: QuizCatalog::builtin(),
    });

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", cli.bind))?;
    tracing::info!("listening on {}", cli.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            // If the signal handler can't be installed, run until killed.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("Server stopped unexpectedly")
}
