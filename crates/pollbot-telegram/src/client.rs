//! HTTP transport for the Bot API.
//!
//! `call` sends JSON, `upload` sends multipart; both read the response through
//! the same envelope decoder. The bot token only ever appears in request URLs,
//! never in logs or error messages.

use std::{fmt, time::Duration};

use tracing::debug;

use pollbot_core::{config::Config, errors::Error, Result};

use crate::{
    envelope,
    form::FormData,
    requests::{Method, UploadMethod},
};

pub const DEFAULT_API_BASE: &str = pollbot_core::config::DEFAULT_API_BASE;

#[derive(Clone)]
pub struct ClientConfig {
    pub token: String,
    /// Scheme and host, without a trailing slash.
    pub api_base: String,
    /// Budget for one request on top of any server-side long-poll wait.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }
}

impl From<&Config> for ClientConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            token: cfg.bot_token.clone(),
            api_base: cfg.api_base.clone(),
            request_timeout: cfg.request_timeout,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct TelegramClient {
    cfg: ClientConfig,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        if cfg.token.trim().is_empty() {
            return Err(Error::Config("bot token must not be empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self { cfg, http })
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.cfg.api_base, self.cfg.token)
    }

    pub fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.cfg.api_base,
            self.cfg.token,
            file_path.trim_start_matches('/')
        )
    }

    fn timeout_for(&self, server_wait: Option<Duration>) -> Duration {
        self.cfg.request_timeout + server_wait.unwrap_or_default()
    }

    /// Send `req` as a JSON body.
    pub async fn call<M>(&self, req: &M) -> Result<M::Response>
    where
        M: Method + Sync,
    {
        debug!(method = M::NAME, "telegram call");
        let resp = self
            .http
            .post(self.method_url(M::NAME))
            .timeout(self.timeout_for(req.server_wait()))
            .json(req)
            .send()
            .await
            .map_err(transport_error)?;
        read_envelope(M::NAME, resp).await
    }

    /// Send `req` as a multipart form with its file attached.
    ///
    /// A local file is read into memory before the request goes out; it is
    /// never held open across the network call.
    pub async fn upload<M>(&self, req: &M) -> Result<M::Response>
    where
        M: UploadMethod + Sync,
    {
        let mut form = FormData::new();
        req.write_form(&mut form)?;
        let (field, file) = req.file();
        form.attach(field, file).await?;
        let form = form.into_multipart()?;

        debug!(method = M::NAME, field, "telegram upload");
        let resp = self
            .http
            .post(self.method_url(M::NAME))
            .timeout(self.timeout_for(None))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        read_envelope(M::NAME, resp).await
    }

    /// Fetch a file by the `file_path` returned from `getFile`.
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        debug!(file_path, "telegram file download");
        let resp = self
            .http
            .get(self.file_url(file_path))
            .timeout(self.timeout_for(None))
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "file download failed: http {}",
                status.as_u16()
            )));
        }
        let bytes = resp.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

async fn read_envelope<T>(method: &'static str, resp: reqwest::Response) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let status = resp.status().as_u16();
    let body = resp.bytes().await.map_err(transport_error)?;
    envelope::decode(status, &body).map_err(|e| {
        debug!(method, status, error = %e, "telegram call failed");
        e
    })
}

fn transport_error(e: reqwest::Error) -> Error {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else {
        "request"
    };
    // The URL embeds the token.
    Error::Transport(format!("{kind} failed: {}", e.without_url()))
}
