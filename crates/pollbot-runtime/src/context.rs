//! Services handed to every handler: reporting plus the common send/edit/delete
//! calls, all going through the shared [`TelegramApi`].

use std::sync::Arc;

use tracing::error;

use pollbot_core::{
    domain::{ChatId, MessageRef},
    errors::Error,
    Result,
};
use pollbot_telegram::{
    keyboard::InlineKeyboardMarkup,
    requests::{AnswerCallbackQuery, DeleteMessage, EditMessageReplyMarkup, SendMessage},
    types::{EditResult, File, Message, ParseMode},
    TelegramApi,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Info => "ℹ",
            Severity::Warning => "⚠",
            Severity::Error => "‼",
        }
    }
}

#[derive(Clone)]
pub struct Context {
    api: Arc<dyn TelegramApi>,
}

impl Context {
    pub fn new(api: Arc<dyn TelegramApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &dyn TelegramApi {
        self.api.as_ref()
    }

    /// Best-effort notice to a chat. Failures are logged, never returned.
    pub async fn report(&self, chat_id: ChatId, severity: Severity, text: &str) {
        let req = SendMessage::new(chat_id, format!("{} {text}", severity.icon()));
        if let Err(e) = self.api.send_message(&req).await {
            error!(chat_id = chat_id.0, error = %e, "report delivery failed");
        }
    }

    pub async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<Message> {
        self.api.send_message(&SendMessage::new(chat_id, text)).await
    }

    pub async fn send_markdown(&self, chat_id: ChatId, markdown: &str) -> Result<Message> {
        let req = SendMessage::new(chat_id, markdown).parse_mode(ParseMode::Markdown);
        self.api.send_message(&req).await
    }

    pub async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<Message> {
        let req = SendMessage::new(chat_id, html).parse_mode(ParseMode::Html);
        self.api.send_message(&req).await
    }

    pub async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<Message> {
        let req = SendMessage::new(chat_id, text).reply_markup(keyboard);
        self.api.send_message(&req).await
    }

    pub async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.api
            .delete_message(&DeleteMessage::new(msg.chat_id, msg.message_id))
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: &str,
        show_alert: bool,
    ) -> Result<()> {
        let req = AnswerCallbackQuery {
            callback_query_id: callback_query_id.to_string(),
            text: text.to_string(),
            show_alert,
            ..Default::default()
        };
        self.api.answer_callback_query(&req).await?;
        Ok(())
    }

    /// Replace (or with `None`, remove) the inline keyboard under a message.
    pub async fn edit_keyboard_markup(
        &self,
        msg: MessageRef,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<EditResult> {
        let req = EditMessageReplyMarkup {
            chat: msg.chat_id.into(),
            message_id: msg.message_id,
            inline_message_id: None,
            reply_markup: keyboard,
        };
        self.api.edit_message_reply_markup(&req).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        self.api.get_file(file_id).await
    }

    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        self.api.download_file(file_path).await
    }

    /// `getFile` followed by the download of its path.
    pub async fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| Error::Decode(format!("file {file_id} has no download path")))?;
        self.download_file(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeApi;
    use pollbot_core::domain::MessageId;
    use pollbot_telegram::{keyboard::InlineKeyboardButton, types::File as TgFile};

    fn ctx() -> (Arc<FakeApi>, Context) {
        let api = Arc::new(FakeApi::default());
        (api.clone(), Context::new(api))
    }

    #[tokio::test]
    async fn report_prefixes_severity_icon() {
        let (api, ctx) = ctx();
        ctx.report(ChatId(3), Severity::Warning, "careful").await;
        ctx.report(ChatId(3), Severity::Error, "broken").await;

        let sent = api.sent_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].chat.chat_id, ChatId(3));
        assert_eq!(sent[0].text, "⚠ careful");
        assert_eq!(sent[1].text, "‼ broken");
    }

    #[tokio::test]
    async fn report_swallows_send_failures() {
        let (api, ctx) = ctx();
        api.fail_sends();
        ctx.report(ChatId(3), Severity::Info, "hello").await;
        assert_eq!(api.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn html_and_markdown_set_parse_mode() {
        let (api, ctx) = ctx();
        ctx.send_html(ChatId(1), "<b>x</b>").await.unwrap();
        ctx.send_markdown(ChatId(1), "*x*").await.unwrap();
        ctx.send_text(ChatId(1), "x").await.unwrap();

        let sent = api.sent_messages();
        assert_eq!(sent[0].parse_mode.parse_mode, Some(ParseMode::Html));
        assert_eq!(sent[1].parse_mode.parse_mode, Some(ParseMode::Markdown));
        assert_eq!(sent[2].parse_mode.parse_mode, None);
    }

    #[tokio::test]
    async fn keyboard_and_message_management_calls() {
        let (api, ctx) = ctx();
        let kb = InlineKeyboardMarkup::single_column([InlineKeyboardButton::callback("a", "a")]);
        ctx.send_keyboard(ChatId(1), "pick", kb.clone()).await.unwrap();

        let msg = MessageRef {
            chat_id: ChatId(1),
            message_id: MessageId(77),
        };
        ctx.edit_keyboard_markup(msg, None).await.unwrap();
        ctx.delete_message(msg).await.unwrap();
        ctx.answer_callback_query("cb-1", "done", false).await.unwrap();

        assert!(api.sent_messages()[0].reply_markup.reply_markup.is_some());
        assert_eq!(api.calls(), vec![
            "sendMessage",
            "editMessageReplyMarkup",
            "deleteMessage",
            "answerCallbackQuery"
        ]);
    }

    #[tokio::test]
    async fn fetch_file_resolves_path_then_downloads() {
        let (api, ctx) = ctx();
        api.set_file(TgFile {
            file_id: "F".into(),
            file_size: Some(3),
            file_path: Some("docs/f.txt".into()),
        });
        assert_eq!(ctx.fetch_file("F").await.unwrap(), b"docs/f.txt".to_vec());

        api.set_file(TgFile::default());
        assert!(matches!(ctx.fetch_file("G").await, Err(Error::Decode(_))));
    }
}
