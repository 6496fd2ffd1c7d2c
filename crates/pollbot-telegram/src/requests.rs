//! Request shapes, one per remote method.
//!
//! The encoding is a property of the type: [`Method`] requests go out as JSON,
//! [`UploadMethod`] requests carry a file and go out as multipart forms.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use pollbot_core::{
    domain::{ChatId, MessageId},
    Result,
};

use crate::{
    fields::{
        is_false, CaptionField, ChatTarget, Notification, ParseModeField, ReplyMarkupField,
        ReplyTo, ThumbField,
    },
    form::{FormData, FormFields, InputFile},
    inline::InlineQueryResult,
    keyboard::{InlineKeyboardMarkup, ReplyMarkup},
    types::{ChatAction, EditResult, File, Message, ParseMode, Update, UpdateType, User},
};

/// A JSON-encoded remote method.
pub trait Method: Serialize {
    const NAME: &'static str;
    type Response: DeserializeOwned;

    /// How long the server may hold the request open before answering.
    fn server_wait(&self) -> Option<Duration> {
        None
    }
}

/// A multipart-encoded remote method carrying exactly one file field.
pub trait UploadMethod {
    const NAME: &'static str;
    type Response: DeserializeOwned;

    /// Form field name of the file and the file itself.
    fn file(&self) -> (&'static str, &InputFile);

    /// Every other field of the request.
    fn write_form(&self, form: &mut FormData) -> Result<()>;
}

// ============== JSON methods ==============

#[derive(Clone, Debug, Default, Serialize)]
pub struct GetMe {}

impl Method for GetMe {
    const NAME: &'static str = "getMe";
    type Response = User;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub offset: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Long-poll timeout in seconds.
    pub timeout: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<UpdateType>,
}

impl GetUpdates {
    pub fn new(offset: i64, timeout: Duration) -> Self {
        Self {
            offset,
            timeout: timeout.as_secs(),
            ..Default::default()
        }
    }
}

impl Method for GetUpdates {
    const NAME: &'static str = "getUpdates";
    type Response = Vec<Update>;

    fn server_wait(&self) -> Option<Duration> {
        Some(Duration::from_secs(self.timeout))
    }
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SendMessage {
    #[serde(flatten)]
    pub chat: ChatTarget,
    pub text: String,
    #[serde(flatten)]
    pub parse_mode: ParseModeField,
    #[serde(skip_serializing_if = "is_false")]
    pub disable_web_page_preview: bool,
    #[serde(flatten)]
    pub notification: Notification,
    #[serde(flatten)]
    pub reply_to: ReplyTo,
    #[serde(flatten)]
    pub reply_markup: ReplyMarkupField,
}

impl SendMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat: chat_id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode.parse_mode = Some(mode);
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup.reply_markup = Some(markup.into());
        self
    }

    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to.reply_to_message_id = message_id;
        self
    }

    pub fn silent(mut self) -> Self {
        self.notification.disable_notification = true;
        self
    }
}

impl Method for SendMessage {
    const NAME: &'static str = "sendMessage";
    type Response = Message;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ForwardMessage {
    #[serde(flatten)]
    pub chat: ChatTarget,
    pub from_chat_id: ChatId,
    pub message_id: MessageId,
    #[serde(flatten)]
    pub notification: Notification,
}

impl Method for ForwardMessage {
    const NAME: &'static str = "forwardMessage";
    type Response = Message;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DeleteMessage {
    #[serde(flatten)]
    pub chat: ChatTarget,
    pub message_id: MessageId,
}

impl DeleteMessage {
    pub fn new(chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            chat: chat_id.into(),
            message_id,
        }
    }
}

impl Method for DeleteMessage {
    const NAME: &'static str = "deleteMessage";
    type Response = bool;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct EditMessageText {
    #[serde(flatten)]
    pub chat: ChatTarget,
    #[serde(skip_serializing_if = "MessageId::is_zero")]
    pub message_id: MessageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    pub text: String,
    #[serde(flatten)]
    pub parse_mode: ParseModeField,
    #[serde(skip_serializing_if = "is_false")]
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl Method for EditMessageText {
    const NAME: &'static str = "editMessageText";
    type Response = EditResult;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct EditMessageReplyMarkup {
    #[serde(flatten)]
    pub chat: ChatTarget,
    #[serde(skip_serializing_if = "MessageId::is_zero")]
    pub message_id: MessageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl Method for EditMessageReplyMarkup {
    const NAME: &'static str = "editMessageReplyMarkup";
    type Response = EditResult;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "is_false")]
    pub show_alert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<u32>,
}

impl Method for AnswerCallbackQuery {
    const NAME: &'static str = "answerCallbackQuery";
    type Response = bool;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct AnswerInlineQuery {
    pub inline_query_id: String,
    pub results: Vec<InlineQueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<u32>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_personal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<String>,
}

impl Method for AnswerInlineQuery {
    const NAME: &'static str = "answerInlineQuery";
    type Response = bool;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GetFile {
    pub file_id: String,
}

impl Method for GetFile {
    const NAME: &'static str = "getFile";
    type Response = File;
}

#[derive(Clone, Debug, Serialize)]
pub struct SendChatAction {
    #[serde(flatten)]
    pub chat: ChatTarget,
    pub action: ChatAction,
}

impl Method for SendChatAction {
    const NAME: &'static str = "sendChatAction";
    type Response = bool;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SendLocation {
    #[serde(flatten)]
    pub chat: ChatTarget,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_period: Option<u32>,
    #[serde(flatten)]
    pub notification: Notification,
    #[serde(flatten)]
    pub reply_to: ReplyTo,
    #[serde(flatten)]
    pub reply_markup: ReplyMarkupField,
}

impl Method for SendLocation {
    const NAME: &'static str = "sendLocation";
    type Response = Message;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SendContact {
    #[serde(flatten)]
    pub chat: ChatTarget,
    pub phone_number: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcard: Option<String>,
    #[serde(flatten)]
    pub notification: Notification,
    #[serde(flatten)]
    pub reply_to: ReplyTo,
    #[serde(flatten)]
    pub reply_markup: ReplyMarkupField,
}

impl Method for SendContact {
    const NAME: &'static str = "sendContact";
    type Response = Message;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SendPoll {
    #[serde(flatten)]
    pub chat: ChatTarget,
    pub question: String,
    pub options: Vec<String>,
    #[serde(flatten)]
    pub notification: Notification,
    #[serde(flatten)]
    pub reply_to: ReplyTo,
    #[serde(flatten)]
    pub reply_markup: ReplyMarkupField,
}

impl Method for SendPoll {
    const NAME: &'static str = "sendPoll";
    type Response = Message;
}

// ============== Multipart methods ==============

/// Fields every media upload shares.
#[derive(Clone, Debug, Default)]
pub struct MediaCommon {
    pub chat: ChatTarget,
    pub caption: CaptionField,
    pub parse_mode: ParseModeField,
    pub notification: Notification,
    pub reply_to: ReplyTo,
    pub reply_markup: ReplyMarkupField,
}

impl MediaCommon {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat: chat_id.into(),
            ..Default::default()
        }
    }
}

impl FormFields for MediaCommon {
    fn write_form(&self, form: &mut FormData) -> Result<()> {
        self.chat.write_form(form)?;
        self.caption.write_form(form)?;
        self.parse_mode.write_form(form)?;
        self.notification.write_form(form)?;
        self.reply_to.write_form(form)?;
        self.reply_markup.write_form(form)
    }
}

fn write_opt_u32(form: &mut FormData, name: &str, v: Option<u32>) {
    if let Some(v) = v {
        form.text(name, v.to_string());
    }
}

fn write_opt_str(form: &mut FormData, name: &str, v: &Option<String>) {
    if let Some(v) = v.as_deref().filter(|s| !s.is_empty()) {
        form.text(name, v);
    }
}

#[derive(Clone, Debug)]
pub struct SendPhoto {
    pub photo: InputFile,
    pub common: MediaCommon,
}

impl SendPhoto {
    pub fn new(chat_id: ChatId, photo: InputFile) -> Self {
        Self {
            photo,
            common: MediaCommon::new(chat_id),
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.common.caption.caption = caption.into();
        self
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.common.parse_mode.parse_mode = Some(mode);
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.common.reply_markup.reply_markup = Some(markup.into());
        self
    }
}

impl UploadMethod for SendPhoto {
    const NAME: &'static str = "sendPhoto";
    type Response = Message;

    fn file(&self) -> (&'static str, &InputFile) {
        ("photo", &self.photo)
    }

    fn write_form(&self, form: &mut FormData) -> Result<()> {
        self.common.write_form(form)
    }
}

#[derive(Clone, Debug)]
pub struct SendAudio {
    pub audio: InputFile,
    pub common: MediaCommon,
    pub thumb: ThumbField,
    pub duration: Option<u32>,
    pub performer: Option<String>,
    pub title: Option<String>,
}

impl SendAudio {
    pub fn new(chat_id: ChatId, audio: InputFile) -> Self {
        Self {
            audio,
            common: MediaCommon::new(chat_id),
            thumb: ThumbField::default(),
            duration: None,
            performer: None,
            title: None,
        }
    }
}

impl UploadMethod for SendAudio {
    const NAME: &'static str = "sendAudio";
    type Response = Message;

    fn file(&self) -> (&'static str, &InputFile) {
        ("audio", &self.audio)
    }

    fn write_form(&self, form: &mut FormData) -> Result<()> {
        self.common.write_form(form)?;
        self.thumb.write_form(form)?;
        write_opt_u32(form, "duration", self.duration);
        write_opt_str(form, "performer", &self.performer);
        write_opt_str(form, "title", &self.title);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SendDocument {
    pub document: InputFile,
    pub common: MediaCommon,
    pub thumb: ThumbField,
}

impl SendDocument {
    pub fn new(chat_id: ChatId, document: InputFile) -> Self {
        Self {
            document,
            common: MediaCommon::new(chat_id),
            thumb: ThumbField::default(),
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.common.caption.caption = caption.into();
        self
    }
}

impl UploadMethod for SendDocument {
    const NAME: &'static str = "sendDocument";
    type Response = Message;

    fn file(&self) -> (&'static str, &InputFile) {
        ("document", &self.document)
    }

    fn write_form(&self, form: &mut FormData) -> Result<()> {
        self.common.write_form(form)?;
        self.thumb.write_form(form)
    }
}

#[derive(Clone, Debug)]
pub struct SendVideo {
    pub video: InputFile,
    pub common: MediaCommon,
    pub thumb: ThumbField,
    pub duration: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub supports_streaming: bool,
}

impl SendVideo {
    pub fn new(chat_id: ChatId, video: InputFile) -> Self {
        Self {
            video,
            common: MediaCommon::new(chat_id),
            thumb: ThumbField::default(),
            duration: None,
            width: None,
            height: None,
            supports_streaming: false,
        }
    }
}

impl UploadMethod for SendVideo {
    const NAME: &'static str = "sendVideo";
    type Response = Message;

    fn file(&self) -> (&'static str, &InputFile) {
        ("video", &self.video)
    }

    fn write_form(&self, form: &mut FormData) -> Result<()> {
        self.common.write_form(form)?;
        self.thumb.write_form(form)?;
        write_opt_u32(form, "duration", self.duration);
        write_opt_u32(form, "width", self.width);
        write_opt_u32(form, "height", self.height);
        if self.supports_streaming {
            form.text("supports_streaming", "true");
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SendVoice {
    pub voice: InputFile,
    pub common: MediaCommon,
    pub duration: Option<u32>,
}

impl SendVoice {
    pub fn new(chat_id: ChatId, voice: InputFile) -> Self {
        Self {
            voice,
            common: MediaCommon::new(chat_id),
            duration: None,
        }
    }
}

impl UploadMethod for SendVoice {
    const NAME: &'static str = "sendVoice";
    type Response = Message;

    fn file(&self) -> (&'static str, &InputFile) {
        ("voice", &self.voice)
    }

    fn write_form(&self, form: &mut FormData) -> Result<()> {
        self.common.write_form(form)?;
        write_opt_u32(form, "duration", self.duration);
        Ok(())
    }
}
