//! The long-polling loop.
//!
//! FETCH → PROCESS-BATCH → PERSIST → FETCH, with FETCH → BACKOFF → FETCH on
//! failure. Every update in a batch advances the cursor whether it was
//! dispatched, rejected or failed in a handler. A cursor that fails to persist
//! stays dirty and is written again after the next batch, so a crash in
//! between replays updates (at-least-once delivery).

use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use pollbot_core::{config::Config, cursor::CursorStore, errors::Error, Result};
use pollbot_telegram::{
    requests::GetUpdates,
    types::{
        CallbackQuery, ChosenInlineResult, InlineQuery, Message, Poll, PreCheckoutQuery,
        ShippingQuery, UpdateType,
    },
    TelegramApi, Update,
};

use crate::{
    auth::{AllowAll, Authorization, Authorizer},
    context::{Context, Severity},
    dispatch::{DispatchChain, Flow, FnHandler, Projected, UpdateHandler},
};

#[derive(Clone, Debug)]
pub struct BotOptions {
    /// Directory holding the cursor record.
    pub working_dir: PathBuf,
    /// How long the server may hold a `getUpdates` call open.
    pub long_polling_timeout: Duration,
    /// Pause after a failed fetch.
    pub fail_retry_interval: Duration,
    /// Empty means every kind the server sends.
    pub allowed_updates: Vec<UpdateType>,
    pub limit: Option<u32>,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            long_polling_timeout: Duration::from_secs(30),
            fail_retry_interval: Duration::from_secs(5),
            allowed_updates: Vec::new(),
            limit: None,
        }
    }
}

impl From<&Config> for BotOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            working_dir: cfg.working_dir.clone(),
            long_polling_timeout: cfg.long_polling_timeout,
            fail_retry_interval: cfg.fail_retry_interval,
            ..Default::default()
        }
    }
}

pub struct Bot {
    ctx: Context,
    opts: BotOptions,
    cursor: CursorStore,
    chain: DispatchChain,
    authorizer: Box<dyn Authorizer>,
}

impl Bot {
    /// Loads the cursor record from `opts.working_dir`. A missing record starts
    /// from zero; an unreadable one is an error.
    pub fn new(api: Arc<dyn TelegramApi>, opts: BotOptions) -> Result<Self> {
        let cursor = CursorStore::load(&opts.working_dir)?;
        Ok(Self {
            ctx: Context::new(api),
            opts,
            cursor,
            chain: DispatchChain::new(),
            authorizer: Box::new(AllowAll),
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn cursor(&self) -> &CursorStore {
        &self.cursor
    }

    pub fn set_authorizer(&mut self, authorizer: impl Authorizer + 'static) -> &mut Self {
        self.authorizer = Box::new(authorizer);
        self
    }

    pub fn add_handler(&mut self, handler: impl UpdateHandler + 'static) -> &mut Self {
        self.chain.push(Arc::new(handler));
        self
    }

    pub fn on_update<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Update) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.add_handler(FnHandler(handler))
    }

    fn on_payload<T, F, Fut>(&mut self, project: fn(&Update) -> Option<&T>, handler: F) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Context, Option<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.add_handler(Projected::new(project, handler))
    }

    pub fn on_message<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::message, handler)
    }

    pub fn on_edited_message<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::edited_message, handler)
    }

    pub fn on_channel_post<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::channel_post, handler)
    }

    pub fn on_edited_channel_post<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::edited_channel_post, handler)
    }

    pub fn on_inline_query<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<InlineQuery>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::inline_query, handler)
    }

    pub fn on_chosen_inline_result<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<ChosenInlineResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::chosen_inline_result, handler)
    }

    pub fn on_callback_query<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<CallbackQuery>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::callback_query, handler)
    }

    pub fn on_shipping_query<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<ShippingQuery>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::shipping_query, handler)
    }

    pub fn on_pre_checkout_query<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<PreCheckoutQuery>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::pre_checkout_query, handler)
    }

    pub fn on_poll<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Option<Poll>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.on_payload(project::poll, handler)
    }

    /// Poll until `shutdown` fires.
    ///
    /// Cancellation is honoured while waiting on the server or sleeping after a
    /// failure, never in the middle of a batch. A dirty cursor is persisted
    /// before returning; only that final write can make this return an error.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!(
            offset = self.cursor.next_offset(),
            handlers = self.chain.len(),
            "polling started"
        );

        loop {
            let fetched = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                res = self.fetch() => res,
            };

            match fetched {
                Ok(updates) => {
                    self.process_batch(&updates).await;
                    self.persist().await;
                }
                Err(e) => {
                    let delay = self.backoff_delay(&e);
                    error!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "update receive failure"
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(last_update = self.cursor.last_update(), "polling stopped");
        if self.cursor.changed() {
            self.cursor.save().await?;
        }
        Ok(())
    }

    /// One FETCH → PROCESS-BATCH → PERSIST cycle. Returns the batch size.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self.fetch().await?;
        self.process_batch(&updates).await;
        self.persist().await;
        Ok(updates.len())
    }

    async fn fetch(&self) -> Result<Vec<Update>> {
        let req = GetUpdates {
            offset: self.cursor.next_offset(),
            limit: self.opts.limit,
            timeout: self.opts.long_polling_timeout.as_secs(),
            allowed_updates: self.opts.allowed_updates.clone(),
        };
        self.ctx.api().get_updates(&req).await
    }

    async fn process_batch(&mut self, updates: &[Update]) {
        for update in updates {
            match self.authorizer.authorize(update) {
                Authorization::Allow => self.chain.dispatch(&self.ctx, update).await,
                Authorization::Deny { chat_id, message } => {
                    info!(
                        update_id = update.update_id,
                        chat_id = chat_id.0,
                        "update rejected"
                    );
                    if chat_id.is_zero() {
                        warn!(
                            update_id = update.update_id,
                            "rejected update has no chat to notify"
                        );
                    } else {
                        self.ctx.report(chat_id, Severity::Warning, &message).await;
                    }
                }
            }
            self.cursor.set_update(update.update_id);
        }
    }

    async fn persist(&mut self) {
        if !self.cursor.changed() {
            return;
        }
        if let Err(e) = self.cursor.save().await {
            error!(error = %e, "failed to save cursor; will retry after the next batch");
        }
    }

    fn backoff_delay(&self, err: &Error) -> Duration {
        let hinted = err.retry_after().map(Duration::from_secs).unwrap_or_default();
        self.opts.fail_retry_interval.max(hinted)
    }
}

mod project {
    use super::*;

    pub(super) fn message(u: &Update) -> Option<&Message> {
        u.message.as_ref()
    }

    pub(super) fn edited_message(u: &Update) -> Option<&Message> {
        u.edited_message.as_ref()
    }

    pub(super) fn channel_post(u: &Update) -> Option<&Message> {
        u.channel_post.as_ref()
    }

    pub(super) fn edited_channel_post(u: &Update) -> Option<&Message> {
        u.edited_channel_post.as_ref()
    }

    pub(super) fn inline_query(u: &Update) -> Option<&InlineQuery> {
        u.inline_query.as_ref()
    }

    pub(super) fn chosen_inline_result(u: &Update) -> Option<&ChosenInlineResult> {
        u.chosen_inline_result.as_ref()
    }

    pub(super) fn callback_query(u: &Update) -> Option<&CallbackQuery> {
        u.callback_query.as_ref()
    }

    pub(super) fn shipping_query(u: &Update) -> Option<&ShippingQuery> {
        u.shipping_query.as_ref()
    }

    pub(super) fn pre_checkout_query(u: &Update) -> Option<&PreCheckoutQuery> {
        u.pre_checkout_query.as_ref()
    }

    pub(super) fn poll(u: &Update) -> Option<&Poll> {
        u.poll.as_ref()
    }
}
