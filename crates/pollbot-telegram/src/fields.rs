//! Field groups shared by many request shapes.
//!
//! Each group flattens into JSON requests and writes itself into multipart
//! forms. Zero values are omitted in both encodings.

use serde::Serialize;

use pollbot_core::{
    domain::{ChatId, MessageId},
    Result,
};

use crate::{
    form::{FormData, FormFields},
    keyboard::ReplyMarkup,
    types::ParseMode,
};

pub(crate) fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChatTarget {
    #[serde(skip_serializing_if = "ChatId::is_zero")]
    pub chat_id: ChatId,
}

impl From<ChatId> for ChatTarget {
    fn from(chat_id: ChatId) -> Self {
        Self { chat_id }
    }
}

impl FormFields for ChatTarget {
    fn write_form(&self, form: &mut FormData) -> Result<()> {
        if !self.chat_id.is_zero() {
            form.text("chat_id", self.chat_id.0.to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParseModeField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

impl FormFields for ParseModeField {
    fn write_form(&self, form: &mut FormData) -> Result<()> {
        if let Some(mode) = self.parse_mode {
            form.text("parse_mode", mode.as_str());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CaptionField {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub caption: String,
}

impl FormFields for CaptionField {
    fn write_form(&self, form: &mut FormData) -> Result<()> {
        if !self.caption.is_empty() {
            form.text("caption", self.caption.clone());
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplyTo {
    #[serde(skip_serializing_if = "MessageId::is_zero")]
    pub reply_to_message_id: MessageId,
}

impl FormFields for ReplyTo {
    fn write_form(&self, form: &mut FormData) -> Result<()> {
        if !self.reply_to_message_id.is_zero() {
            form.text(
                "reply_to_message_id",
                self.reply_to_message_id.0.to_string(),
            );
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplyMarkupField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl FormFields for ReplyMarkupField {
    fn write_form(&self, form: &mut FormData) -> Result<()> {
        if let Some(markup) = &self.reply_markup {
            form.json("reply_markup", markup)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "is_false")]
    pub disable_notification: bool,
}

impl FormFields for Notification {
    fn write_form(&self, form: &mut FormData) -> Result<()> {
        if self.disable_notification {
            form.text("disable_notification", "true");
        }
        Ok(())
    }
}

/// Thumbnail given as a file id or URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ThumbField {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thumb: String,
}

impl FormFields for ThumbField {
    fn write_form(&self, form: &mut FormData) -> Result<()> {
        if !self.thumb.is_empty() {
            form.text("thumb", self.thumb.clone());
        }
        Ok(())
    }
}
