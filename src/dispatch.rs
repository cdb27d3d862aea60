use crate::error::WebhookError;
use crate::webhook::{Kind, MessageKind, Webhook};
use std::collections::HashMap;
use std::fmt;

/// Key a handler is registered under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    Status,
    TextMessage,
    DocumentMessage,
}

impl HandlerKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKey::Status => "status",
            HandlerKey::TextMessage => "text",
            HandlerKey::DocumentMessage => "document",
        }
    }

    pub fn for_webhook(webhook: &Webhook) -> Result<HandlerKey, WebhookError> {
        match (webhook.kind()?, webhook.message_kind()?) {
            (Kind::Status, _) => Ok(HandlerKey::Status),
            (_, Some(MessageKind::Text)) => Ok(HandlerKey::TextMessage),
            (_, Some(MessageKind::Document)) => Ok(HandlerKey::DocumentMessage),
            (kind, None) => Err(WebhookError::UnhandledWebhookKind {
                kind: kind.to_string(),
            }),
        }
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Handler<R, E> = Box<dyn Fn(&Webhook) -> Result<R, E> + Send + Sync>;

/// Handler table. Built once, then shared read-only.
///
/// Handler errors are returned untouched; core failures are converted into
/// the caller's error type through `From<WebhookError>`.
pub struct Dispatcher<R, E> {
    handlers: HashMap<HandlerKey, Handler<R, E>>,
}

impl<R, E> Default for Dispatcher<R, E> {
    fn default() -> Self {
        Dispatcher {
            handlers: HashMap::new(),
        }
    }
}

impl<R, E> Dispatcher<R, E>
where
    E: From<WebhookError>,
{
    pub fn new() -> Dispatcher<R, E> {
        Dispatcher::default()
    }

    pub fn register<F>(mut self, key: HandlerKey, handler: F) -> Dispatcher<R, E>
    where
        F: Fn(&Webhook) -> Result<R, E> + Send + Sync + 'static,
    {
        self.handlers.insert(key, Box::new(handler));
        self
    }

    pub fn handles(&self, key: HandlerKey) -> bool {
        self.handlers.contains_key(&key)
    }

    pub fn dispatch(&self, webhook: &Webhook) -> Result<R, E> {
        let key = HandlerKey::for_webhook(webhook)?;

        let handler = self
            .handlers
            .get(&key)
            .ok_or_else(|| WebhookError::UnhandledWebhookKind {
                kind: key.to_string(),
            })?;

        handler(webhook)
    }
}
