use crate::dispatch::{Dispatcher, HandlerKey};
use crate::error::WebhookError;
use crate::parser::Parser;
use crate::structs::StandardResponse;
use crate::webhook::Webhook;
use log::{info, trace};
use serde_derive::{Deserialize, Serialize};

/// What the default handlers extract from a webhook.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandlerOutcome {
    Status {
        phone: String,
        status: String,
    },
    Text {
        body: String,
    },
    Document {
        id: String,
        filename: String,
        mime_type: String,
    },
}

pub fn status_webhook_handler(webhook: &Webhook) -> Result<HandlerOutcome, WebhookError> {
    let (phone, status) = webhook.phone_and_status()?;
    info!("Status update for {}: {}", phone, status);

    Ok(HandlerOutcome::Status {
        phone: phone.to_string(),
        status: status.to_string(),
    })
}

pub fn text_webhook_handler(webhook: &Webhook) -> Result<HandlerOutcome, WebhookError> {
    let body = webhook.text_body()?;
    info!("Text message from {}: {}", webhook.sender()?, body);

    Ok(HandlerOutcome::Text {
        body: body.to_string(),
    })
}

pub fn document_webhook_handler(webhook: &Webhook) -> Result<HandlerOutcome, WebhookError> {
    let document = webhook.document_content()?;
    info!(
        "Document {} ({}) from {}, sha256 {}",
        document.filename,
        document.mime_type,
        webhook.sender()?,
        document.sha256
    );

    Ok(HandlerOutcome::Document {
        id: document.id.clone(),
        filename: document.filename.clone(),
        mime_type: document.mime_type.clone(),
    })
}

pub fn default_dispatcher() -> Dispatcher<HandlerOutcome, WebhookError> {
    Dispatcher::new()
        .register(HandlerKey::Status, status_webhook_handler)
        .register(HandlerKey::TextMessage, text_webhook_handler)
        .register(HandlerKey::DocumentMessage, document_webhook_handler)
}

/// Runs one callback body through parse, classify and dispatch. Failures
/// are returned unlogged; `error_manager::get_public_error` reports them.
pub fn webhook_message(
    parser: &Parser,
    dispatcher: &Dispatcher<HandlerOutcome, WebhookError>,
    raw: &[u8],
) -> Result<StandardResponse, WebhookError> {
    let webhook = Webhook::new(parser.parse(raw)?);

    trace!("Webhook received: {:?}", webhook.payload());

    let kind = webhook.label();

    let outcome = dispatcher.dispatch(&webhook)?;
    info!("Handled {}", kind);

    Ok(StandardResponse::ok(kind, outcome))
}
