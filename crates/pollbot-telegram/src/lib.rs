//! Telegram Bot API transport.
//!
//! Request types pick their own encoding (JSON or multipart), the client sends
//! them and unwraps the response envelope, and [`api::TelegramApi`] is the port
//! the polling runtime drives.

pub mod api;
pub mod client;
pub mod envelope;
pub mod fields;
pub mod form;
pub mod inline;
pub mod keyboard;
pub mod requests;
pub mod types;

pub use api::TelegramApi;
pub use client::{ClientConfig, TelegramClient};
pub use form::InputFile;
pub use types::{Update, UpdateKind};
