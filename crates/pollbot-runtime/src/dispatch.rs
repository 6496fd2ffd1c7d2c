//! Ordered handler chain.
//!
//! Handlers run in registration order until one returns [`Flow::Stop`]. A
//! handler error is logged and the next handler still runs.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use pollbot_core::Result;
use pollbot_telegram::Update;

use crate::context::Context;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Pass the update to the next handler.
    Continue,
    /// End the chain for this update.
    Stop,
}

#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, ctx: &Context, update: &Update) -> Result<Flow>;
}

/// Wraps an `async fn(Context, Update) -> Result<Flow>`.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> UpdateHandler for FnHandler<F>
where
    F: Fn(Context, Update) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Flow>> + Send + 'static,
{
    async fn handle(&self, ctx: &Context, update: &Update) -> Result<Flow> {
        (self.0)(ctx.clone(), update.clone()).await
    }
}

/// Projects one payload out of an update before calling a narrower handler.
///
/// The handler is called for every update, with `None` when the projected
/// payload is absent.
pub struct Projected<T, F> {
    project: fn(&Update) -> Option<&T>,
    handler: F,
}

impl<T, F> Projected<T, F> {
    pub fn new(project: fn(&Update) -> Option<&T>, handler: F) -> Self {
        Self { project, handler }
    }
}

#[async_trait]
impl<T, F, Fut> UpdateHandler for Projected<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(Context, Option<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Flow>> + Send + 'static,
{
    async fn handle(&self, ctx: &Context, update: &Update) -> Result<Flow> {
        let payload = (self.project)(update).cloned();
        (self.handler)(ctx.clone(), payload).await
    }
}

#[derive(Clone, Default)]
pub struct DispatchChain {
    handlers: Vec<Arc<dyn UpdateHandler>>,
}

impl DispatchChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: Arc<dyn UpdateHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn dispatch(&self, ctx: &Context, update: &Update) {
        if self.handlers.is_empty() {
            warn!(
                update_id = update.update_id,
                "no handlers registered; use the on_* methods to add some"
            );
            return;
        }

        for (idx, handler) in self.handlers.iter().enumerate() {
            match handler.handle(ctx, update).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => {
                    debug!(update_id = update.update_id, handler = idx, "chain stopped");
                    return;
                }
                Err(e) => {
                    error!(
                        update_id = update.update_id,
                        handler = idx,
                        error = %e,
                        "handler failed"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeApi;
    use pollbot_core::errors::Error;
    use pollbot_telegram::types::Message;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        flow: Result<Flow>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Recorder {
        fn new(
            name: &'static str,
            flow: Result<Flow>,
            log: &Arc<Mutex<Vec<&'static str>>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                flow,
                log: log.clone(),
            })
        }
    }

    #[async_trait]
    impl UpdateHandler for Recorder {
        async fn handle(&self, _ctx: &Context, _update: &Update) -> Result<Flow> {
            self.log.lock().unwrap().push(self.name);
            match &self.flow {
                Ok(f) => Ok(*f),
                Err(e) => Err(Error::Handler(e.to_string())),
            }
        }
    }

    fn ctx() -> Context {
        Context::new(Arc::new(FakeApi::default()))
    }

    #[tokio::test]
    async fn stop_short_circuits_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = DispatchChain::new();
        chain.push(Recorder::new("A", Ok(Flow::Continue), &log));
        chain.push(Recorder::new("B", Ok(Flow::Stop), &log));
        chain.push(Recorder::new("C", Ok(Flow::Continue), &log));

        chain.dispatch(&ctx(), &Update::default()).await;
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);

        // Stop only applies to the update it was returned for.
        chain.dispatch(&ctx(), &Update::default()).await;
        assert_eq!(*log.lock().unwrap(), vec!["A", "B", "A", "B"]);
    }

    #[tokio::test]
    async fn handler_error_does_not_stop_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = DispatchChain::new();
        chain.push(Recorder::new("A", Err(Error::Handler("boom".into())), &log));
        chain.push(Recorder::new("B", Ok(Flow::Continue), &log));

        chain.dispatch(&ctx(), &Update::default()).await;
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn empty_chain_warns_about_missing_handlers() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let chain = DispatchChain::new();
        assert!(chain.is_empty());
        let update = Update {
            update_id: 17,
            ..Default::default()
        };
        chain.dispatch(&ctx(), &update).await;

        let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("WARN"), "{out}");
        assert!(out.contains("no handlers registered"), "{out}");
        assert!(out.contains("update_id=17"), "{out}");
    }

    #[tokio::test]
    async fn projection_passes_none_when_payload_is_absent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        fn message(u: &Update) -> Option<&Message> {
            u.message.as_ref()
        }
        let handler = Projected::new(
            message,
            move |_ctx: Context, msg: Option<Message>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(msg.and_then(|m| m.text));
                    Ok(Flow::Continue)
                }
            },
        );

        let mut with_message = Update::default();
        with_message.message = Some(Message {
            text: Some("hi".into()),
            ..Default::default()
        });

        handler.handle(&ctx(), &with_message).await.unwrap();
        handler.handle(&ctx(), &Update::default()).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Some("hi".to_string()), None]);
    }

    #[tokio::test]
    async fn fn_handler_sees_the_whole_update() {
        let handler = FnHandler(|_ctx: Context, u: Update| async move {
            Ok(if u.update_id > 10 { Flow::Stop } else { Flow::Continue })
        });
        let mut u = Update::default();
        u.update_id = 11;
        assert_eq!(handler.handle(&ctx(), &u).await.unwrap(), Flow::Stop);
    }
}
