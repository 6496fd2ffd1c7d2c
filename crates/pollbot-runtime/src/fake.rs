//! In-memory `TelegramApi` for runtime tests.

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use async_trait::async_trait;

use pollbot_core::{errors::Error, Result};
use pollbot_telegram::{
    requests::{
        AnswerCallbackQuery, AnswerInlineQuery, DeleteMessage, EditMessageReplyMarkup,
        EditMessageText, ForwardMessage, GetUpdates, SendAudio, SendChatAction, SendContact,
        SendDocument, SendLocation, SendMessage, SendPhoto, SendPoll, SendVideo, SendVoice,
    },
    types::{EditResult, File, Message, Update, User},
    TelegramApi,
};

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<&'static str>>,
    sent: Mutex<Vec<SendMessage>>,
    offsets: Mutex<Vec<i64>>,
    inline_answers: Mutex<Vec<AnswerInlineQuery>>,
    batches: Mutex<VecDeque<Result<Vec<Update>>>>,
    file: Mutex<File>,
    fail_sends: Mutex<bool>,
}

impl FakeApi {
    pub fn push_batch(&self, batch: Result<Vec<Update>>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub fn fail_sends(&self) {
        *self.fail_sends.lock().unwrap() = true;
    }

    pub fn set_file(&self, file: File) {
        *self.file.lock().unwrap() = file;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<SendMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn requested_offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn inline_answers(&self) -> Vec<AnswerInlineQuery> {
        self.inline_answers.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl TelegramApi for FakeApi {
    async fn get_updates(&self, req: &GetUpdates) -> Result<Vec<Update>> {
        self.record("getUpdates");
        self.offsets.lock().unwrap().push(req.offset);
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                // Nothing queued: behave like a long poll that times out.
                tokio::time::sleep(Duration::from_millis(2)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn get_me(&self) -> Result<User> {
        self.record("getMe");
        Ok(User::default())
    }

    async fn send_message(&self, req: &SendMessage) -> Result<Message> {
        self.record("sendMessage");
        self.sent.lock().unwrap().push(req.clone());
        if *self.fail_sends.lock().unwrap() {
            return Err(Error::Transport("connection reset".into()));
        }
        Ok(Message::default())
    }

    async fn edit_message_text(&self, _req: &EditMessageText) -> Result<EditResult> {
        self.record("editMessageText");
        Ok(EditResult::Done(true))
    }

    async fn edit_message_reply_markup(&self, _req: &EditMessageReplyMarkup) -> Result<EditResult> {
        self.record("editMessageReplyMarkup");
        Ok(EditResult::Done(true))
    }

    async fn delete_message(&self, _req: &DeleteMessage) -> Result<bool> {
        self.record("deleteMessage");
        Ok(true)
    }

    async fn answer_callback_query(&self, _req: &AnswerCallbackQuery) -> Result<bool> {
        self.record("answerCallbackQuery");
        Ok(true)
    }

    async fn send_chat_action(&self, _req: &SendChatAction) -> Result<bool> {
        self.record("sendChatAction");
        Ok(true)
    }

    async fn get_file(&self, _file_id: &str) -> Result<File> {
        self.record("getFile");
        Ok(self.file.lock().unwrap().clone())
    }

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        self.record("downloadFile");
        Ok(file_path.as_bytes().to_vec())
    }

    async fn send_photo(&self, _req: &SendPhoto) -> Result<Message> {
        self.record("sendPhoto");
        Ok(Message::default())
    }

    async fn send_document(&self, _req: &SendDocument) -> Result<Message> {
        self.record("sendDocument");
        Ok(Message::default())
    }

    async fn forward_message(&self, _req: &ForwardMessage) -> Result<Message> {
        self.record("forwardMessage");
        Ok(Message::default())
    }

    async fn answer_inline_query(&self, req: &AnswerInlineQuery) -> Result<bool> {
        self.record("answerInlineQuery");
        self.inline_answers.lock().unwrap().push(req.clone());
        Ok(true)
    }

    async fn send_location(&self, _req: &SendLocation) -> Result<Message> {
        self.record("sendLocation");
        Ok(Message::default())
    }

    async fn send_contact(&self, _req: &SendContact) -> Result<Message> {
        self.record("sendContact");
        Ok(Message::default())
    }

    async fn send_poll(&self, _req: &SendPoll) -> Result<Message> {
        self.record("sendPoll");
        Ok(Message::default())
    }

    async fn send_audio(&self, _req: &SendAudio) -> Result<Message> {
        self.record("sendAudio");
        Ok(Message::default())
    }

    async fn send_video(&self, _req: &SendVideo) -> Result<Message> {
        self.record("sendVideo");
        Ok(Message::default())
    }

    async fn send_voice(&self, _req: &SendVoice) -> Result<Message> {
        self.record("sendVoice");
        Ok(Message::default())
    }
}
