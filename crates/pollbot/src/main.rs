use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pollbot_core::{config::Config, Result};
use pollbot_runtime::{AllowedUsers, Bot, BotOptions, Context, Flow, UpdateHandler};
use pollbot_telegram::{
    keyboard::{InlineKeyboardButton, InlineKeyboardMarkup},
    ClientConfig, TelegramApi, TelegramClient, Update,
};

/// Logs every update before the real handlers see it.
struct TraceUpdates;

#[async_trait]
impl UpdateHandler for TraceUpdates {
    async fn handle(&self, _ctx: &Context, update: &Update) -> Result<Flow> {
        debug!(
            update_id = update.update_id,
            kind = ?update.update_type(),
            sender = ?update.sender().map(|u| u.id.0),
            "update received"
        );
        Ok(Flow::Continue)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pollbot_core::logging::init("pollbot")?;

    let cfg = Config::load().context("loading configuration")?;
    let client = TelegramClient::new(ClientConfig::from(&cfg))?;

    match client.get_me().await {
        Ok(me) => info!(
            bot_id = me.id.0,
            username = me.username.as_deref().unwrap_or(""),
            "authenticated"
        ),
        Err(e) => warn!(error = %e, "getMe failed; polling anyway"),
    }

    let mut bot = Bot::new(Arc::new(client), BotOptions::from(&cfg))
        .context("loading cursor record")?;

    if cfg.allowed_users.is_empty() {
        warn!("TELEGRAM_ALLOWED_USERS is empty; every user may talk to the bot");
    }
    bot.set_authorizer(AllowedUsers::from_config(&cfg));

    bot.add_handler(TraceUpdates);

    bot.on_message(|ctx, msg| async move {
        let Some(msg) = msg else {
            return Ok(Flow::Continue);
        };
        let Some(chat_id) = msg.chat_id() else {
            return Ok(Flow::Continue);
        };
        match msg.command() {
            Some(("start", _)) => {
                let kb = InlineKeyboardMarkup::new(vec![vec![
                    InlineKeyboardButton::callback("Ping", "ping"),
                    InlineKeyboardButton::callback("Hide", "hide"),
                ]]);
                ctx.send_keyboard(chat_id, "Send me anything and I will echo it back.", kb)
                    .await?;
                Ok(Flow::Stop)
            }
            Some(_) => Ok(Flow::Continue),
            None => {
                if let Some(text) = msg.text.as_deref() {
                    ctx.send_text(chat_id, text).await?;
                    return Ok(Flow::Stop);
                }
                Ok(Flow::Continue)
            }
        }
    });

    bot.on_callback_query(|ctx, query| async move {
        let Some(query) = query else {
            return Ok(Flow::Continue);
        };
        let reply = match query.data.as_deref() {
            Some("ping") => "pong",
            Some("hide") => {
                if let Some(msg) = &query.message {
                    if let Some(chat_id) = msg.chat_id() {
                        let target = pollbot_core::domain::MessageRef {
                            chat_id,
                            message_id: msg.message_id,
                        };
                        ctx.edit_keyboard_markup(target, None).await?;
                    }
                }
                "hidden"
            }
            _ => "",
        };
        ctx.answer_callback_query(&query.id, reply, false).await?;
        Ok(Flow::Stop)
    });

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        on_signal.cancel();
    });

    bot.run(shutdown).await.context("polling loop")?;
    Ok(())
}
