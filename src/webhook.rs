use crate::error::WebhookError;
use crate::parser;
use crate::structs::webhooks::{
    Change, Contact, DocumentMessageContent, Message, ValueMessages, WebhookPayload,
};
use log::debug;
use std::fmt;
use time::OffsetDateTime;

const ENTRY_PATH: &str = "$.entry";
const CHANGES_PATH: &str = "$.entry[0].changes";
const VALUE_PATH: &str = "$.entry[0].changes[0].value";

/// Category of the first change of a payload, decided by its resolved
/// variant rather than by the wire `field` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Status,
    Message,
    Unknown,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Status => "status",
            Kind::Message => "message",
            Kind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-classification of a [`Kind::Message`] webhook by its first message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Document,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Document => "document",
        }
    }
}

/// Kind-aware accessors over a parsed payload. Only `entry[0].changes[0]`
/// is ever interpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct Webhook {
    payload: WebhookPayload,
}

impl From<WebhookPayload> for Webhook {
    fn from(payload: WebhookPayload) -> Self {
        Webhook::new(payload)
    }
}

impl Webhook {
    pub fn new(payload: WebhookPayload) -> Webhook {
        Webhook { payload }
    }

    pub fn parse(raw: impl AsRef<[u8]>) -> Result<Webhook, WebhookError> {
        parser::parse(raw).map(Webhook::new)
    }

    pub fn payload(&self) -> &WebhookPayload {
        &self.payload
    }

    pub fn into_payload(self) -> WebhookPayload {
        self.payload
    }

    pub fn first_change(&self) -> Result<&Change, WebhookError> {
        let entry = self
            .payload
            .entry
            .first()
            .ok_or_else(|| WebhookError::empty(ENTRY_PATH))?;

        entry
            .changes
            .first()
            .ok_or_else(|| WebhookError::empty(CHANGES_PATH))
    }

    pub fn kind(&self) -> Result<Kind, WebhookError> {
        Ok(match self.first_change()? {
            Change::Statuses(_) => Kind::Status,
            Change::Messages(_) => Kind::Message,
            Change::Unrecognized(_) => Kind::Unknown,
        })
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind(), Ok(Kind::Message))
    }

    pub fn is_status(&self) -> bool {
        matches!(self.kind(), Ok(Kind::Status))
    }

    /// `None` when the webhook is not a message. Fails when it is one but
    /// carries no messages.
    pub fn message_kind(&self) -> Result<Option<MessageKind>, WebhookError> {
        Ok(self.first_message()?.map(|message| match message {
            Message::Text(_) => MessageKind::Text,
            Message::Document(_) => MessageKind::Document,
        }))
    }

    pub fn is_text_message(&self) -> Result<bool, WebhookError> {
        let is_text = self.message_kind()? == Some(MessageKind::Text);

        if !is_text {
            debug!("Webhook is not a text message: {}", self.label());
        }

        Ok(is_text)
    }

    pub fn is_document_message(&self) -> Result<bool, WebhookError> {
        let is_document = self.message_kind()? == Some(MessageKind::Document);

        if !is_document {
            debug!("Webhook is not a document message: {}", self.label());
        }

        Ok(is_document)
    }

    pub fn text_body(&self) -> Result<&str, WebhookError> {
        match self.first_message()? {
            Some(Message::Text(message)) => Ok(&message.text.body),
            _ => Err(self.not_applicable("text message")),
        }
    }

    pub fn document_content(&self) -> Result<&DocumentMessageContent, WebhookError> {
        match self.first_message()? {
            Some(Message::Document(message)) => Ok(&message.document),
            _ => Err(self.not_applicable("document message")),
        }
    }

    /// Business display number and the first delivery status.
    pub fn phone_and_status(&self) -> Result<(&str, &str), WebhookError> {
        match self.first_change()? {
            Change::Statuses(change) => {
                let status = change
                    .value
                    .statuses
                    .first()
                    .ok_or_else(|| WebhookError::empty(format!("{}.statuses", VALUE_PATH)))?;

                Ok((&change.value.metadata.display_phone_number, &status.status))
            }
            _ => Err(self.not_applicable("status update")),
        }
    }

    pub fn contact(&self) -> Result<&Contact, WebhookError> {
        match self.messages_value()? {
            Some(value) => value
                .contacts
                .first()
                .ok_or_else(|| WebhookError::empty(format!("{}.contacts", VALUE_PATH))),
            None => Err(self.not_applicable("message")),
        }
    }

    pub fn sender(&self) -> Result<&str, WebhookError> {
        match self.first_message()? {
            Some(message) => Ok(message.sender()),
            None => Err(self.not_applicable("message")),
        }
    }

    /// Timestamp of the first message; the provider sends Unix seconds as a string.
    pub fn message_timestamp(&self) -> Result<OffsetDateTime, WebhookError> {
        let message = self
            .first_message()?
            .ok_or_else(|| self.not_applicable("message"))?;
        let path = format!("{}.messages[0].timestamp", VALUE_PATH);

        let seconds = message.timestamp().parse::<i64>().map_err(|_| {
            WebhookError::schema(
                path.as_str(),
                "unix seconds",
                format!("string \"{}\"", message.timestamp()),
            )
        })?;

        OffsetDateTime::from_unix_timestamp(seconds)
            .map_err(|err| WebhookError::schema(path.as_str(), "unix seconds", err.to_string()))
    }

    /// Human readable classification, used in diagnostics.
    pub fn label(&self) -> String {
        match self.kind() {
            Ok(Kind::Message) => match self.message_kind() {
                Ok(Some(kind)) => format!("{} message", kind.as_str()),
                _ => "empty message batch".to_string(),
            },
            Ok(Kind::Status) => "status update".to_string(),
            Ok(Kind::Unknown) => format!(
                "unrecognized change `{}`",
                self.first_change().map(Change::field).unwrap_or_default()
            ),
            Err(_) => "empty payload".to_string(),
        }
    }

    fn messages_value(&self) -> Result<Option<&ValueMessages>, WebhookError> {
        match self.first_change()? {
            Change::Messages(change) => Ok(Some(&change.value)),
            _ => Ok(None),
        }
    }

    fn first_message(&self) -> Result<Option<&Message>, WebhookError> {
        match self.messages_value()? {
            Some(value) => value
                .messages
                .first()
                .map(Some)
                .ok_or_else(|| WebhookError::empty(format!("{}.messages", VALUE_PATH))),
            None => Ok(None),
        }
    }

    fn not_applicable(&self, expected: &'static str) -> WebhookError {
        let actual = self.label();
        debug!("Accessor for {} called on {}", expected, actual);

        WebhookError::NotApplicable { expected, actual }
    }
}
