//! Delivery sink: hands a fetched file to Telegram as an attachment.
//!
//! Audio goes out with title/performer/duration metadata; video with a
//! duration and a width/height hint equal to the requested resolution
//! (not probed from the file). One attempt only — a transport failure is
//! the job's failure.

use teloxide::prelude::*;
use teloxide::types::InputFile;

use vidracore::error::AppResult;
use vidracore::fetch::FetchedFile;
use vidracore::quality::Quality;

use crate::telegram::Bot;

pub async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    fetched: &FetchedFile,
    quality: Quality,
    caption_suffix: &str,
) -> AppResult<()> {
    let duration = fetched.duration_secs.min(u64::from(u32::MAX)) as u32;

    match quality {
        Quality::AudioOnly => {
            log::info!("Uploading audio \"{}\" ({:.1} MiB)", fetched.title, fetched.size_mib());
            bot.send_audio(chat_id, InputFile::file(fetched.path.clone()))
                .caption(format!("{}{}", fetched.title, caption_suffix))
                .title(fetched.title.clone())
                .performer(fetched.uploader.clone())
                .duration(duration)
                .await?;
        }
        Quality::Resolution(height) => {
            log::info!(
                "Uploading video \"{}\" at {}p ({:.1} MiB)",
                fetched.title,
                height,
                fetched.size_mib()
            );
            bot.send_video(chat_id, InputFile::file(fetched.path.clone()))
                .caption(format!("{}{}", fetched.title, caption_suffix))
                .duration(duration)
                .width(height)
                .height(height)
                .supports_streaming(true)
                .await?;
        }
    }

    Ok(())
}
