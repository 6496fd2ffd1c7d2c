//! Wire data model for the Bot API.
//!
//! Plain serde shapes. Absent fields decode to their defaults so new server
//! fields or missing optional ones never fail a whole batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pollbot_core::domain::{ChatId, MessageId, UserId};

use crate::keyboard::InlineKeyboardMarkup;

/// One event delivered by `getUpdates`.
///
/// Exactly one payload field is expected to be set; the ones this crate does not
/// know about are simply ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_query: Option<InlineQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_inline_result: Option<ChosenInlineResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_query: Option<ShippingQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_checkout_query: Option<PreCheckoutQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
}

/// Borrowed view of the populated payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UpdateKind<'a> {
    Message(&'a Message),
    EditedMessage(&'a Message),
    ChannelPost(&'a Message),
    EditedChannelPost(&'a Message),
    InlineQuery(&'a InlineQuery),
    ChosenInlineResult(&'a ChosenInlineResult),
    CallbackQuery(&'a CallbackQuery),
    ShippingQuery(&'a ShippingQuery),
    PreCheckoutQuery(&'a PreCheckoutQuery),
    Poll(&'a Poll),
}

impl Update {
    pub fn kind(&self) -> Option<UpdateKind<'_>> {
        if let Some(m) = &self.message {
            return Some(UpdateKind::Message(m));
        }
        if let Some(m) = &self.edited_message {
            return Some(UpdateKind::EditedMessage(m));
        }
        if let Some(m) = &self.channel_post {
            return Some(UpdateKind::ChannelPost(m));
        }
        if let Some(m) = &self.edited_channel_post {
            return Some(UpdateKind::EditedChannelPost(m));
        }
        if let Some(q) = &self.inline_query {
            return Some(UpdateKind::InlineQuery(q));
        }
        if let Some(r) = &self.chosen_inline_result {
            return Some(UpdateKind::ChosenInlineResult(r));
        }
        if let Some(q) = &self.callback_query {
            return Some(UpdateKind::CallbackQuery(q));
        }
        if let Some(q) = &self.shipping_query {
            return Some(UpdateKind::ShippingQuery(q));
        }
        if let Some(q) = &self.pre_checkout_query {
            return Some(UpdateKind::PreCheckoutQuery(q));
        }
        self.poll.as_ref().map(UpdateKind::Poll)
    }

    pub fn update_type(&self) -> Option<UpdateType> {
        Some(match self.kind()? {
            UpdateKind::Message(_) => UpdateType::Message,
            UpdateKind::EditedMessage(_) => UpdateType::EditedMessage,
            UpdateKind::ChannelPost(_) => UpdateType::ChannelPost,
            UpdateKind::EditedChannelPost(_) => UpdateType::EditedChannelPost,
            UpdateKind::InlineQuery(_) => UpdateType::InlineQuery,
            UpdateKind::ChosenInlineResult(_) => UpdateType::ChosenInlineResult,
            UpdateKind::CallbackQuery(_) => UpdateType::CallbackQuery,
            UpdateKind::ShippingQuery(_) => UpdateType::ShippingQuery,
            UpdateKind::PreCheckoutQuery(_) => UpdateType::PreCheckoutQuery,
            UpdateKind::Poll(_) => UpdateType::Poll,
        })
    }

    /// The user who caused this update, when the payload carries one.
    pub fn sender(&self) -> Option<&User> {
        match self.kind()? {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => m.from.as_ref(),
            UpdateKind::InlineQuery(q) => q.from.as_ref(),
            UpdateKind::ChosenInlineResult(r) => r.from.as_ref(),
            UpdateKind::CallbackQuery(q) => q.from.as_ref(),
            UpdateKind::ShippingQuery(q) => q.from.as_ref(),
            UpdateKind::PreCheckoutQuery(q) => q.from.as_ref(),
            UpdateKind::Poll(_) => None,
        }
    }

    /// The chat this update happened in, when there is one.
    pub fn chat_id(&self) -> Option<ChatId> {
        match self.kind()? {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => m.chat.as_ref().map(|c| c.id),
            UpdateKind::CallbackQuery(q) => q
                .message
                .as_ref()
                .and_then(|m| m.chat.as_ref())
                .map(|c| c.id),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ShippingQuery,
    PreCheckoutQuery,
    Poll,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<ChatPhoto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_link: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPhoto {
    pub small_file_id: String,
    pub big_file_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub message_id: MessageId,
    pub from: Option<User>,
    /// Unix seconds.
    pub date: i64,
    pub chat: Option<Chat>,
    pub forward_from: Option<User>,
    pub forward_from_chat: Option<Chat>,
    pub forward_date: Option<i64>,
    pub reply_to_message: Option<Box<Message>>,
    pub edit_date: Option<i64>,
    pub media_group_id: Option<String>,
    pub author_signature: Option<String>,
    pub text: Option<String>,
    pub entities: Vec<MessageEntity>,
    pub caption: Option<String>,
    pub caption_entities: Vec<MessageEntity>,
    pub audio: Option<Audio>,
    pub document: Option<Document>,
    pub animation: Option<Animation>,
    pub photo: Vec<PhotoSize>,
    pub sticker: Option<Sticker>,
    pub video: Option<Video>,
    pub voice: Option<Voice>,
    pub video_note: Option<VideoNote>,
    pub contact: Option<Contact>,
    pub location: Option<Location>,
    pub venue: Option<Venue>,
    pub poll: Option<Poll>,
    pub new_chat_members: Vec<User>,
    pub left_chat_member: Option<User>,
    pub new_chat_title: Option<String>,
    pub pinned_message: Option<Box<Message>>,
    pub migrate_to_chat_id: Option<i64>,
    pub migrate_from_chat_id: Option<i64>,
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl Message {
    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat.as_ref().map(|c| c.id)
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date, 0)
    }

    /// Split a leading `/command@botname args` into `("command", "args")`.
    pub fn command(&self) -> Option<(&str, &str)> {
        let text = self.text.as_deref()?.trim_start();
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head);
        if name.is_empty() {
            return None;
        }
        Some((name, args))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Mention,
    Hashtag,
    Cashtag,
    BotCommand,
    Url,
    Email,
    PhoneNumber,
    Bold,
    Italic,
    Code,
    Pre,
    TextLink,
    TextMention,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub offset: i64,
    pub length: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Audio {
    pub file_id: String,
    pub duration: u32,
    pub performer: Option<String>,
    pub title: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub thumb: Option<PhotoSize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub file_id: String,
    pub thumb: Option<PhotoSize>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Animation {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    pub thumb: Option<PhotoSize>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sticker {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub is_animated: bool,
    pub thumb: Option<PhotoSize>,
    pub emoji: Option<String>,
    pub set_name: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    pub thumb: Option<PhotoSize>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Voice {
    pub file_id: String,
    pub duration: u32,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoNote {
    pub file_id: String,
    pub length: u32,
    pub duration: u32,
    pub thumb: Option<PhotoSize>,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_id: Option<UserId>,
    pub vcard: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Venue {
    pub location: Location,
    pub title: String,
    pub address: String,
    pub foursquare_id: Option<String>,
    pub foursquare_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollOption {
    pub text: String,
    pub voter_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub is_closed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineQuery {
    pub id: String,
    pub from: Option<User>,
    pub location: Option<Location>,
    pub query: String,
    pub offset: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub from: Option<User>,
    pub location: Option<Location>,
    pub inline_message_id: Option<String>,
    pub query: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Option<User>,
    pub message: Option<Message>,
    pub inline_message_id: Option<String>,
    pub chat_instance: String,
    pub data: Option<String>,
    pub game_short_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
    pub country_code: String,
    pub state: String,
    pub city: String,
    pub street_line1: String,
    pub street_line2: String,
    pub post_code: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingQuery {
    pub id: String,
    pub from: Option<User>,
    pub invoice_payload: String,
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderInfo {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: Option<User>,
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
    pub shipping_option_id: Option<String>,
    pub order_info: Option<OrderInfo>,
}

/// Result of `getFile`; `file_path` feeds `download_file`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub file_id: String,
    pub file_size: Option<u64>,
    pub file_path: Option<String>,
}

/// Extra error details some `ok: false` responses carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseParameters {
    pub migrate_to_chat_id: Option<i64>,
    pub retry_after: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
            ParseMode::MarkdownV2 => "MarkdownV2",
            ParseMode::Html => "HTML",
        }
    }
}

/// Outgoing "chat action" (typing indicator, etc).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
    UploadPhoto,
    RecordVideo,
    UploadVideo,
    RecordAudio,
    UploadAudio,
    UploadDocument,
    FindLocation,
    RecordVideoNote,
    UploadVideoNote,
}

/// Results of edit calls: the edited message, or `true` for inline messages.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EditResult {
    Message(Box<Message>),
    Done(bool),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_update(id: i64, text: &str) -> Update {
        serde_json::from_value(json!({
            "update_id": id,
            "message": {
                "message_id": 7,
                "date": 1_700_000_000,
                "from": {"id": 11, "is_bot": false, "first_name": "Ann"},
                "chat": {"id": -100, "type": "group", "title": "ops"},
                "text": text,
                "entities": [{"type": "bot_command", "offset": 0, "length": 5}]
            }
        }))
        .unwrap()
    }

    #[test]
    fn decodes_message_update_and_projects_kind() {
        let u = text_update(3, "/ping");
        assert_eq!(u.update_id, 3);
        assert_eq!(u.update_type(), Some(UpdateType::Message));
        assert!(matches!(u.kind(), Some(UpdateKind::Message(m)) if m.message_id == MessageId(7)));
        assert_eq!(u.sender().map(|s| s.id), Some(UserId(11)));
        assert_eq!(u.chat_id(), Some(ChatId(-100)));

        let m = u.message.as_ref().unwrap();
        assert_eq!(m.entities[0].kind, EntityType::BotCommand);
        assert_eq!(m.sent_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn unknown_payloads_and_entities_do_not_break_decoding() {
        let u: Update = serde_json::from_value(json!({
            "update_id": 9,
            "my_chat_member": {"whatever": true}
        }))
        .unwrap();
        assert_eq!(u.kind(), None);
        assert_eq!(u.sender(), None);

        let e: MessageEntity =
            serde_json::from_value(json!({"type": "spoiler", "offset": 0, "length": 1})).unwrap();
        assert_eq!(e.kind, EntityType::Unknown);
    }

    #[test]
    fn callback_query_chat_comes_from_its_message() {
        let u: Update = serde_json::from_value(json!({
            "update_id": 4,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 5, "first_name": "Bo"},
                "chat_instance": "x",
                "data": "yes",
                "message": {"message_id": 1, "date": 0, "chat": {"id": 77, "type": "private"}}
            }
        }))
        .unwrap();
        assert_eq!(u.update_type(), Some(UpdateType::CallbackQuery));
        assert_eq!(u.sender().map(|s| s.id), Some(UserId(5)));
        assert_eq!(u.chat_id(), Some(ChatId(77)));
    }

    #[test]
    fn command_parsing() {
        let m = |t: &str| Message {
            text: Some(t.to_string()),
            ..Default::default()
        };
        assert_eq!(m("/start").command(), Some(("start", "")));
        assert_eq!(m("/echo@my_bot hello  world ").command(), Some(("echo", "hello  world")));
        assert_eq!(m("hello").command(), None);
        assert_eq!(m("/").command(), None);
        assert_eq!(Message::default().command(), None);
    }

    #[test]
    fn edit_result_accepts_message_or_true() {
        let done: EditResult = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(done, EditResult::Done(true));
        let msg: EditResult =
            serde_json::from_value(json!({"message_id": 3, "date": 0})).unwrap();
        assert!(matches!(msg, EditResult::Message(m) if m.message_id == MessageId(3)));
    }

    #[test]
    fn update_type_serializes_snake_case() {
        let v = serde_json::to_value([UpdateType::Message, UpdateType::PreCheckoutQuery]).unwrap();
        assert_eq!(v, json!(["message", "pre_checkout_query"]));
        assert_eq!(serde_json::to_value(ParseMode::Html).unwrap(), json!("HTML"));
    }
}
