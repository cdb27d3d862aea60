use crate::request_handler::HandlerOutcome;
use serde_derive::{Deserialize, Serialize};

pub mod webhooks {

    use serde_derive::{Deserialize, Serialize};
    use serde_json::Value;

    /// Root of a provider callback.
    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct WebhookPayload {
        pub object: String,
        pub entry: Vec<Entry>,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct Entry {
        pub id: String,
        pub changes: Vec<Change>,
    }

    /// One event unit inside an entry.
    ///
    /// The wire `field` tag is kept verbatim but never trusted for variant
    /// selection: the provider sends `"messages"` for status callbacks too.
    /// Deserialization goes through [`crate::resolver::Resolver`].
    #[derive(Serialize, Clone, Debug, PartialEq)]
    #[serde(untagged)]
    pub enum Change {
        Statuses(ChangeStatuses),
        Messages(ChangeMessages),
        Unrecognized(UnrecognizedChange),
    }

    impl Change {
        /// The `field` string exactly as it arrived.
        pub fn field(&self) -> &str {
            match self {
                Change::Statuses(change) => &change.field,
                Change::Messages(change) => &change.field,
                Change::Unrecognized(change) => &change.field,
            }
        }
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct ChangeStatuses {
        pub field: String,
        pub value: ValueStatuses,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct ChangeMessages {
        pub field: String,
        pub value: ValueMessages,
    }

    /// A change kept as raw JSON. Only produced by a resolver that accepts
    /// unrecognized shapes.
    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct UnrecognizedChange {
        pub field: String,
        pub value: Value,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct Metadata {
        pub display_phone_number: String,
        pub phone_number_id: String,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct ValueStatuses {
        pub messaging_product: String,
        pub metadata: Metadata,
        pub statuses: Vec<Status>,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct Status {
        pub id: String,
        pub status: String,
        pub timestamp: String,
        pub recipient_id: String,
        pub conversation: Conversation,
        pub pricing: Pricing,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct Conversation {
        pub id: String,
        pub origin: Origin,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct Origin {
        #[serde(rename = "type")]
        pub origin_type: String,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct Pricing {
        pub billable: bool,
        pub pricing_model: String,
        pub category: String,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct ValueMessages {
        pub messaging_product: String,
        pub metadata: Metadata,
        pub contacts: Vec<Contact>,
        pub messages: Vec<Message>,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct Contact {
        pub profile: Profile,
        pub wa_id: String,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct Profile {
        pub name: String,
    }

    /// Inbound message, tagged by its `type` field.
    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    #[serde(tag = "type", rename_all = "lowercase")]
    pub enum Message {
        Text(TextMessage),
        Document(DocumentMessage),
    }

    impl Message {
        pub const TYPES: [&'static str; 2] = ["text", "document"];

        pub fn sender(&self) -> &str {
            match self {
                Message::Text(message) => &message.sender,
                Message::Document(message) => &message.sender,
            }
        }

        pub fn id(&self) -> &str {
            match self {
                Message::Text(message) => &message.id,
                Message::Document(message) => &message.id,
            }
        }

        pub fn timestamp(&self) -> &str {
            match self {
                Message::Text(message) => &message.timestamp,
                Message::Document(message) => &message.timestamp,
            }
        }

        pub fn message_type(&self) -> &'static str {
            match self {
                Message::Text(_) => "text",
                Message::Document(_) => "document",
            }
        }
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct TextMessage {
        #[serde(rename = "from")]
        pub sender: String,
        pub id: String,
        pub timestamp: String,
        pub text: TextMessageContent,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct DocumentMessage {
        #[serde(rename = "from")]
        pub sender: String,
        pub id: String,
        pub timestamp: String,
        pub document: DocumentMessageContent,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct TextMessageContent {
        pub body: String,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct DocumentMessageContent {
        pub filename: String,
        pub mime_type: String,
        pub sha256: String,
        pub id: String,
    }
}

/// Body returned by every webhook endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StandardResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<HandlerOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StandardResponse {
    pub fn ok(kind: String, result: HandlerOutcome) -> StandardResponse {
        StandardResponse {
            status: "ok".to_string(),
            kind: Some(kind),
            result: Some(result),
            message: None,
        }
    }

    pub fn error(message: String) -> StandardResponse {
        StandardResponse {
            status: "error".to_string(),
            kind: None,
            result: None,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::webhooks::*;
    use serde_json::json;

    #[test]
    fn message_sender_uses_wire_name_from() {
        let message: Message = serde_json::from_value(json!({
            "from": "15551234567",
            "id": "message_id_1",
            "timestamp": "1627771715",
            "type": "text",
            "text": {"body": "hi"}
        }))
        .unwrap();

        assert_eq!(message.sender(), "15551234567");
        assert_eq!(message.message_type(), "text");

        let wire = serde_json::to_value(&message).unwrap();
        assert_eq!(wire["from"], "15551234567");
        assert!(wire.get("sender").is_none());
        assert_eq!(wire["type"], "text");
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let result = serde_json::from_value::<Message>(json!({
            "from": "1",
            "id": "2",
            "timestamp": "3",
            "type": "sticker",
            "sticker": {}
        }));

        assert!(result.is_err());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let metadata: Metadata = serde_json::from_value(json!({
            "display_phone_number": "15550000000",
            "phone_number_id": "phone_number_id_1",
            "added_later": true
        }))
        .unwrap();

        assert_eq!(metadata.display_phone_number, "15550000000");
    }
}
