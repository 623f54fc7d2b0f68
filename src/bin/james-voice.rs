//! james-voice: speech synthesis sidecar.
//!
//! Loads both voice models at startup. If loading fails the server still
//! starts and answers every request with a structured error, so the web
//! front-end can report the problem instead of timing out.

use james::voice::{VoiceGateway, sidecar};
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
    let _ = dotenvy::dotenv();

    let args = cli::parse(std::env::args().skip(1))?;
    if args.help {
        print!("{}", cli::usage("james-voice"));
        return Ok(());
    }

    let config = config::load(args.config_path.as_deref())?;
    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    info!(bind = %config.voice.bind, "starting voice sidecar");
    let gateway = VoiceGateway::load(&config.voice).await;
    let router = sidecar::build_router(gateway);

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    let listener = server::bind(&config.voice.bind).await?;
    server::serve(listener, router, shutdown).await
}
