use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use vidra::logging::init_logger;
use vidra::telegram::bot::{create_bot, setup_bot_commands};
use vidra::telegram::handlers::{schema, HandlerDeps};
use vidracore::config;

/// Main entry point for the Telegram bot.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present, before config
    // statics are first read.
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    log::info!("Starting vidra (yt-dlp: {})", &*config::YTDL_BIN);

    let bot = create_bot()?;

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let deps = HandlerDeps::new();

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shut down");
    Ok(())
}
