use crate::transport::{
    ChatId,
    DieMessage,
    MessageHandle,
    Transport,
    TransportError,
};
use std::time::Duration;
use tracing::{
    debug,
    warn,
};

/// Total attempts per outbound call, first try included.
const MAX_ATTEMPTS: u32 = 3;

/// Uniform sentinel for an outbound call that failed every attempt.
/// Callers never see the underlying transport error; they only decide
/// whether the current flow step can survive a lost delivery.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("outbound delivery failed after repeated attempts")]
pub struct DeliveryError;

/// Wraps every outbound transport call with bounded retry and backoff.
/// Knows nothing about wagers or balances.
pub struct DeliveryGateway<T> {
    transport: T,
    backoff_unit: Duration,
}

impl<T: Transport> DeliveryGateway<T> {
    pub fn new(transport: T) -> Self {
        Self::with_backoff_unit(transport, Duration::from_secs(1))
    }

    /// Tests shrink the backoff unit so exhaustion paths run instantly.
    pub fn with_backoff_unit(transport: T, backoff_unit: Duration) -> Self {
        Self {
            transport,
            backoff_unit,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
    ) -> Result<MessageHandle, DeliveryError> {
        self.with_retries("send_text", || self.transport.send_text(chat, text))
            .await
    }

    pub async fn send_die(&self, chat: ChatId) -> Result<DieMessage, DeliveryError> {
        self.with_retries("send_die", || self.transport.send_die(chat))
            .await
    }

    /// Deletions are cosmetic; callers may ignore the sentinel.
    pub async fn delete_message(
        &self,
        chat: ChatId,
        handle: MessageHandle,
    ) -> Result<(), DeliveryError> {
        self.with_retries("delete_message", || {
            self.transport.delete_message(chat, handle)
        })
        .await
    }

    async fn with_retries<Fut, Out>(
        &self,
        call_name: &str,
        mut call: impl FnMut() -> Fut,
    ) -> Result<Out, DeliveryError>
    where
        Fut: Future<Output = Result<Out, TransportError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match call().await {
                Ok(out) => return Ok(out),
                Err(err) => err,
            };
            if attempt >= MAX_ATTEMPTS {
                warn!(
                    call = call_name,
                    attempts = attempt,
                    error = %err,
                    "giving up on outbound call"
                );
                return Err(DeliveryError);
            }
            // Rate limits carry a server-mandated wait; pad it by one unit.
            // Everything else backs off linearly: 1, 2 units.
            let wait = match err.mandated_wait() {
                Some(mandated) => mandated + self.backoff_unit,
                None => self.backoff_unit * attempt,
            };
            debug!(
                call = call_name,
                attempt,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "outbound call failed, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }
}
