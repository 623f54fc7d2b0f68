//! James: web server entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI flags, load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Build providers, personas, workflow, memory log
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Serve until shutdown

use james::{cli, config, error, logger, server};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), error::AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = cli::parse(std::env::args().skip(1))?;
    if args.help {
        print!("{}", cli::usage("james"));
        return Ok(());
    }

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    info!(
        bot_name = %config.bot_name,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        api_base = %config.llm.api_base,
        provider = %config.llm.provider,
        "config loaded"
    );

    let state = server::AppState::from_config(&config)?;
    let router = server::build_router(state, &config.server.static_dir);

    // Shared shutdown token: Ctrl-C cancels it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    let listener = server::bind(&config.server.bind).await?;
    server::serve(listener, router, shutdown).await
}
