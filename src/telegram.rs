use crate::transport::{
    ChatId,
    DieMessage,
    MessageHandle,
    Transport,
    TransportError,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    de::DeserializeOwned,
};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin Telegram Bot API adapter. Retry policy lives in the delivery
/// gateway, not here; this client reports each failure once, classified.
pub struct TelegramTransport {
    http: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<R> {
    ok: bool,
    result: Option<R>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub dice: Option<Dice>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Deserialize)]
pub struct Dice {
    pub value: u8,
}

impl TelegramTransport {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_url(DEFAULT_API_URL, token)
    }

    pub fn with_api_url(api_url: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        })
    }

    /// Long-polls for inbound updates. Used by the dispatch loop only;
    /// the core consumes the `Transport` surface.
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let payload = json!({
            "offset": offset,
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        self.call_with_timeout(
            "getUpdates",
            payload,
            REQUEST_TIMEOUT + poll_timeout,
        )
        .await
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<R, TransportError> {
        self.call_with_timeout(method, payload, REQUEST_TIMEOUT)
            .await
    }

    async fn call_with_timeout<R: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
        timeout: Duration,
    ) -> Result<R, TransportError> {
        let url = format!("{}/{method}", self.base);
        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(classify)?;
        let body: ApiResponse<R> = response.json().await.map_err(classify)?;
        if body.ok {
            return body.result.ok_or_else(|| {
                TransportError::Api(format!("{method}: response missing result"))
            });
        }
        if let Some(retry_after) =
            body.parameters.and_then(|parameters| parameters.retry_after)
        {
            return Err(TransportError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }
        Err(TransportError::Api(
            body.description
                .unwrap_or_else(|| format!("{method}: request rejected")),
        ))
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
    ) -> Result<MessageHandle, TransportError> {
        let message: Message = self
            .call("sendMessage", json!({ "chat_id": chat, "text": text }))
            .await?;
        Ok(MessageHandle(message.message_id))
    }

    async fn send_die(&self, chat: ChatId) -> Result<DieMessage, TransportError> {
        let message: Message = self
            .call("sendDice", json!({ "chat_id": chat, "emoji": "🎲" }))
            .await?;
        let dice = message.dice.ok_or_else(|| {
            TransportError::Api("sendDice: response missing dice value".to_string())
        })?;
        Ok(DieMessage {
            handle: MessageHandle(message.message_id),
            value: dice.value,
        })
    }

    async fn delete_message(
        &self,
        chat: ChatId,
        handle: MessageHandle,
    ) -> Result<(), TransportError> {
        let _deleted: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": chat, "message_id": handle.0 }),
            )
            .await?;
        Ok(())
    }
}
