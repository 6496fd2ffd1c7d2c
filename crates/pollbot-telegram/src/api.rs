//! The remote operations the runtime and handlers depend on.
//!
//! `TelegramClient` is the real implementation; tests substitute fakes.

use async_trait::async_trait;

use pollbot_core::Result;

use crate::{
    client::TelegramClient,
    requests::{
        AnswerCallbackQuery, AnswerInlineQuery, DeleteMessage, EditMessageReplyMarkup,
        EditMessageText, ForwardMessage, GetFile, GetMe, GetUpdates, SendAudio, SendChatAction,
        SendContact, SendDocument, SendLocation, SendMessage, SendPhoto, SendPoll, SendVideo,
        SendVoice,
    },
    types::{EditResult, File, Message, Update, User},
};

#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn get_updates(&self, req: &GetUpdates) -> Result<Vec<Update>>;

    async fn get_me(&self) -> Result<User>;

    async fn send_message(&self, req: &SendMessage) -> Result<Message>;

    async fn forward_message(&self, req: &ForwardMessage) -> Result<Message>;

    async fn edit_message_text(&self, req: &EditMessageText) -> Result<EditResult>;

    async fn edit_message_reply_markup(&self, req: &EditMessageReplyMarkup) -> Result<EditResult>;

    async fn delete_message(&self, req: &DeleteMessage) -> Result<bool>;

    async fn answer_callback_query(&self, req: &AnswerCallbackQuery) -> Result<bool>;

    async fn answer_inline_query(&self, req: &AnswerInlineQuery) -> Result<bool>;

    async fn send_chat_action(&self, req: &SendChatAction) -> Result<bool>;

    async fn send_location(&self, req: &SendLocation) -> Result<Message>;

    async fn send_contact(&self, req: &SendContact) -> Result<Message>;

    async fn send_poll(&self, req: &SendPoll) -> Result<Message>;

    async fn get_file(&self, file_id: &str) -> Result<File>;

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>>;

    async fn send_photo(&self, req: &SendPhoto) -> Result<Message>;

    async fn send_document(&self, req: &SendDocument) -> Result<Message>;

    async fn send_audio(&self, req: &SendAudio) -> Result<Message>;

    async fn send_video(&self, req: &SendVideo) -> Result<Message>;

    async fn send_voice(&self, req: &SendVoice) -> Result<Message>;
}

#[async_trait]
impl TelegramApi for TelegramClient {
    async fn get_updates(&self, req: &GetUpdates) -> Result<Vec<Update>> {
        self.call(req).await
    }

    async fn get_me(&self) -> Result<User> {
        self.call(&GetMe {}).await
    }

    async fn send_message(&self, req: &SendMessage) -> Result<Message> {
        self.call(req).await
    }

    async fn forward_message(&self, req: &ForwardMessage) -> Result<Message> {
        self.call(req).await
    }

    async fn edit_message_text(&self, req: &EditMessageText) -> Result<EditResult> {
        self.call(req).await
    }

    async fn edit_message_reply_markup(&self, req: &EditMessageReplyMarkup) -> Result<EditResult> {
        self.call(req).await
    }

    async fn delete_message(&self, req: &DeleteMessage) -> Result<bool> {
        self.call(req).await
    }

    async fn answer_callback_query(&self, req: &AnswerCallbackQuery) -> Result<bool> {
        self.call(req).await
    }

    async fn answer_inline_query(&self, req: &AnswerInlineQuery) -> Result<bool> {
        self.call(req).await
    }

    async fn send_chat_action(&self, req: &SendChatAction) -> Result<bool> {
        self.call(req).await
    }

    async fn send_location(&self, req: &SendLocation) -> Result<Message> {
        self.call(req).await
    }

    async fn send_contact(&self, req: &SendContact) -> Result<Message> {
        self.call(req).await
    }

    async fn send_poll(&self, req: &SendPoll) -> Result<Message> {
        self.call(req).await
    }

    async fn get_file(&self, file_id: &str) -> Result<File> {
        self.call(&GetFile {
            file_id: file_id.to_string(),
        })
        .await
    }

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        TelegramClient::download_file(self, file_path).await
    }

    async fn send_photo(&self, req: &SendPhoto) -> Result<Message> {
        self.upload(req).await
    }

    async fn send_document(&self, req: &SendDocument) -> Result<Message> {
        self.upload(req).await
    }

    async fn send_audio(&self, req: &SendAudio) -> Result<Message> {
        self.upload(req).await
    }

    async fn send_video(&self, req: &SendVideo) -> Result<Message> {
        self.upload(req).await
    }

    async fn send_voice(&self, req: &SendVoice) -> Result<Message> {
        self.upload(req).await
    }
}
