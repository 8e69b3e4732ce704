//! Scriptable transport fake shared by unit and integration tests.

use crate::transport::{
    ChatId,
    DieMessage,
    MessageHandle,
    Transport,
    TransportError,
};
use rand::Rng;
use std::{
    collections::VecDeque,
    sync::Mutex,
    time::Duration,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SentText {
    pub chat: ChatId,
    pub text: String,
}

#[derive(Default)]
struct Inner {
    next_message_id: i64,
    die_script: VecDeque<Result<u8, TransportError>>,
    text_ok_prefix: u32,
    text_failures: VecDeque<TransportError>,
    delete_failures: VecDeque<TransportError>,
    sent_texts: Vec<SentText>,
    deleted: Vec<MessageHandle>,
    die_requests: u32,
}

/// Transport whose responses are scripted ahead of time. Unscripted
/// die rolls fall back to random faces; unscripted calls succeed.
#[derive(Default)]
pub struct FakeTransport {
    inner: Mutex<Inner>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the face values the next die requests will report.
    /// Successes and scripted failures are consumed in queue order.
    pub fn script_rolls(&self, values: impl IntoIterator<Item = u8>) {
        self.inner
            .lock()
            .unwrap()
            .die_script
            .extend(values.into_iter().map(Ok));
    }

    /// Queues `times` die request timeouts behind whatever is already
    /// scripted.
    pub fn fail_next_die(&self, times: u32) {
        let mut inner = self.inner.lock().unwrap();
        for _ in 0..times {
            inner.die_script.push_back(Err(TransportError::Timeout));
        }
    }

    /// Lets the next `count` texts through before queued text failures
    /// start applying.
    pub fn pass_next_text(&self, count: u32) {
        self.inner.lock().unwrap().text_ok_prefix += count;
    }

    pub fn fail_next_text(&self, times: u32) {
        let mut inner = self.inner.lock().unwrap();
        for _ in 0..times {
            inner
                .text_failures
                .push_back(TransportError::Network("connection reset".to_string()));
        }
    }

    pub fn rate_limit_next_text(&self, retry_after: Duration) {
        self.inner
            .lock()
            .unwrap()
            .text_failures
            .push_back(TransportError::RateLimited { retry_after });
    }

    pub fn fail_next_delete(&self, times: u32) {
        let mut inner = self.inner.lock().unwrap();
        for _ in 0..times {
            inner.delete_failures.push_back(TransportError::Timeout);
        }
    }

    pub fn sent_texts(&self) -> Vec<SentText> {
        self.inner.lock().unwrap().sent_texts.clone()
    }

    /// Texts sent to one chat, in order.
    pub fn texts_for(&self, chat: ChatId) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .sent_texts
            .iter()
            .filter(|sent| sent.chat == chat)
            .map(|sent| sent.text.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageHandle> {
        self.inner.lock().unwrap().deleted.clone()
    }

    pub fn die_requests(&self) -> u32 {
        self.inner.lock().unwrap().die_requests
    }
}

impl Transport for FakeTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
    ) -> Result<MessageHandle, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.text_ok_prefix > 0 {
            inner.text_ok_prefix -= 1;
        } else if let Some(err) = inner.text_failures.pop_front() {
            return Err(err);
        }
        inner.next_message_id += 1;
        let handle = MessageHandle(inner.next_message_id);
        inner.sent_texts.push(SentText {
            chat,
            text: text.to_string(),
        });
        Ok(handle)
    }

    async fn send_die(&self, _chat: ChatId) -> Result<DieMessage, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.die_requests += 1;
        let value = match inner.die_script.pop_front() {
            Some(Ok(value)) => value,
            Some(Err(err)) => return Err(err),
            None => rand::rng().random_range(1..=6),
        };
        inner.next_message_id += 1;
        Ok(DieMessage {
            handle: MessageHandle(inner.next_message_id),
            value,
        })
    }

    async fn delete_message(
        &self,
        _chat: ChatId,
        handle: MessageHandle,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.delete_failures.pop_front() {
            return Err(err);
        }
        inner.deleted.push(handle);
        Ok(())
    }
}
