//! Send helpers shared by handlers and the notifier
//!
//! All rich replies go out as HTML with link previews disabled — the alert
//! bodies carry marketplace deep links and an unfurled preview would bury
//! the text.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, KeyboardMarkup, LinkPreviewOptions, ParseMode};

fn no_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Send an HTML-formatted message, optionally attaching a reply keyboard
///
/// # Errors
///
/// Returns an error if the send fails.
pub async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: Option<KeyboardMarkup>,
) -> Result<()> {
    let request = bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .link_preview_options(no_preview());
    match keyboard {
        Some(kb) => request.reply_markup(kb).await?,
        None => request.await?,
    };
    Ok(())
}

/// Send a plain-text message with a reply keyboard
///
/// # Errors
///
/// Returns an error if the send fails.
pub async fn send_plain(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: KeyboardMarkup,
) -> Result<()> {
    bot.send_message(chat_id, text).reply_markup(keyboard).await?;
    Ok(())
}
