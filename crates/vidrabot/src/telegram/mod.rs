//! Telegram integration: bot setup, handlers, keyboards, delivery.

pub mod bot;
pub mod callback;
pub mod deliver;
pub mod flow;
pub mod handlers;
pub mod keyboard;

use teloxide::types::InlineKeyboardButton;

/// The bot type used throughout this crate.
pub type Bot = teloxide::Bot;

/// Shorthand for an inline callback button.
pub fn cb(label: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label.into(), data.into())
}
