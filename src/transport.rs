use std::time::Duration;

/// Chat identifier on the message transport.
pub type ChatId = i64;

/// Handle to a message the transport accepted, usable for later deletion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageHandle(pub i64);

/// A randomized-die message: the transport renders the animation and
/// reports the final face value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DieMessage {
    pub handle: MessageHandle,
    /// Face value in 1..=6.
    pub value: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("transport rejected the call: {0}")]
    Api(String),
}

impl TransportError {
    /// Server-mandated wait carried by a rate-limit response, if any.
    pub fn mandated_wait(&self) -> Option<Duration> {
        match self {
            TransportError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Outbound capability surface the core consumes. Connection and session
/// management stay behind the implementor.
pub trait Transport {
    fn send_text(
        &self,
        chat: ChatId,
        text: &str,
    ) -> impl Future<Output = Result<MessageHandle, TransportError>> + Send;

    fn send_die(
        &self,
        chat: ChatId,
    ) -> impl Future<Output = Result<DieMessage, TransportError>> + Send;

    fn delete_message(
        &self,
        chat: ChatId,
        handle: MessageHandle,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
