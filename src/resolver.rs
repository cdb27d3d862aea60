use crate::error::WebhookError;
use crate::structs::webhooks::{
    Change, ChangeMessages, ChangeStatuses, Contact, DocumentMessage, Entry, Message, Metadata,
    Status, TextMessage, UnrecognizedChange, ValueMessages, ValueStatuses, WebhookPayload,
};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use serde_path_to_error::Segment;

/// Path prefix of the document root in validation errors.
pub const ROOT: &str = "$";

/// Path prefix used when a lone change is deserialized through serde.
pub const CHANGE: &str = "change";

/// Known shapes of a change `value`, identified by the array key they carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeShape {
    Statuses,
    Messages,
}

impl ChangeShape {
    pub fn key(self) -> &'static str {
        match self {
            ChangeShape::Statuses => "statuses",
            ChangeShape::Messages => "messages",
        }
    }
}

/// Turns loosely typed JSON into the schema model.
///
/// Changes are classified structurally: each shape in `order` whose key is
/// present in `value` is tried in turn and the first one that validates wins.
/// The wire `field` tag plays no part in the decision.
#[derive(Clone, Debug)]
pub struct Resolver {
    order: Vec<ChangeShape>,
    accept_unrecognized: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver {
            order: vec![ChangeShape::Statuses, ChangeShape::Messages],
            accept_unrecognized: false,
        }
    }
}

impl Resolver {
    pub fn new() -> Resolver {
        Resolver::default()
    }

    pub fn with_order(order: Vec<ChangeShape>) -> Resolver {
        Resolver {
            order,
            ..Resolver::default()
        }
    }

    /// Keep changes that match no known shape as [`Change::Unrecognized`]
    /// instead of failing.
    pub fn accept_unrecognized(mut self) -> Resolver {
        self.accept_unrecognized = true;
        self
    }

    pub fn order(&self) -> &[ChangeShape] {
        &self.order
    }

    pub fn resolve_payload(&self, value: &Value) -> Result<WebhookPayload, WebhookError> {
        let root = object(value, ROOT)?;
        let object_tag = string(root, "object", ROOT)?;
        let entry_path = child(ROOT, "entry");

        let entry = array(root, "entry", ROOT)?
            .iter()
            .enumerate()
            .map(|(i, entry)| self.resolve_entry(entry, &index(&entry_path, i)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WebhookPayload {
            object: object_tag,
            entry,
        })
    }

    pub fn resolve_entry(&self, value: &Value, path: &str) -> Result<Entry, WebhookError> {
        let entry = object(value, path)?;
        let id = string(entry, "id", path)?;
        let changes_path = child(path, "changes");

        let changes = array(entry, "changes", path)?
            .iter()
            .enumerate()
            .map(|(i, change)| self.resolve_change(change, &index(&changes_path, i)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Entry { id, changes })
    }

    pub fn resolve_change(&self, value: &Value, path: &str) -> Result<Change, WebhookError> {
        let change = object(value, path)?;
        let field = string(change, "field", path)?;
        let value_path = child(path, "value");
        let inner = required(change, "value", path)?;
        let inner_object = object(inner, &value_path)?;

        let mut first_failure = None;

        for shape in self.order.iter().filter(|shape| inner_object.contains_key(shape.key())) {
            let resolved = match shape {
                ChangeShape::Statuses => self
                    .resolve_statuses(inner_object, &value_path)
                    .map(|value| Change::Statuses(ChangeStatuses { field: field.clone(), value })),
                ChangeShape::Messages => self
                    .resolve_messages(inner_object, &value_path)
                    .map(|value| Change::Messages(ChangeMessages { field: field.clone(), value })),
            };

            match resolved {
                Ok(change) => return Ok(change),
                Err(err) => {
                    first_failure.get_or_insert(err);
                }
            }
        }

        if let Some(err) = first_failure {
            return Err(err);
        }

        if self.accept_unrecognized {
            return Ok(Change::Unrecognized(UnrecognizedChange {
                field,
                value: inner.clone(),
            }));
        }

        let keys: Vec<&str> = inner_object.keys().map(String::as_str).collect();
        let expected: Vec<String> = self
            .order
            .iter()
            .map(|shape| format!("`{}`", shape.key()))
            .collect();

        Err(WebhookError::schema(
            value_path,
            format!("an object carrying one of {}", expected.join(", ")),
            format!("an object with keys [{}]", keys.join(", ")),
        ))
    }

    fn resolve_statuses(
        &self,
        value: &Map<String, Value>,
        path: &str,
    ) -> Result<ValueStatuses, WebhookError> {
        let messaging_product = string(value, "messaging_product", path)?;
        let metadata = metadata(value, path)?;
        let statuses_path = child(path, "statuses");

        let statuses = array(value, "statuses", path)?
            .iter()
            .enumerate()
            .map(|(i, status)| record::<Status>(status, &index(&statuses_path, i), "a status"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValueStatuses {
            messaging_product,
            metadata,
            statuses,
        })
    }

    fn resolve_messages(
        &self,
        value: &Map<String, Value>,
        path: &str,
    ) -> Result<ValueMessages, WebhookError> {
        let messaging_product = string(value, "messaging_product", path)?;
        let metadata = metadata(value, path)?;
        let contacts_path = child(path, "contacts");
        let messages_path = child(path, "messages");

        let contacts = array(value, "contacts", path)?
            .iter()
            .enumerate()
            .map(|(i, contact)| record::<Contact>(contact, &index(&contacts_path, i), "a contact"))
            .collect::<Result<Vec<_>, _>>()?;

        let messages = array(value, "messages", path)?
            .iter()
            .enumerate()
            .map(|(i, message)| self.resolve_message(message, &index(&messages_path, i)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValueMessages {
            messaging_product,
            metadata,
            contacts,
            messages,
        })
    }

    /// Messages are selected by their `type` tag; unknown tags fail.
    pub fn resolve_message(&self, value: &Value, path: &str) -> Result<Message, WebhookError> {
        let message = object(value, path)?;
        let tag_path = child(path, "type");
        let expected = format!("one of `{}`", Message::TYPES.join("`, `"));

        match message.get("type") {
            None => Err(WebhookError::schema(tag_path, expected, "nothing")),
            Some(Value::String(tag)) if tag == "text" => {
                record::<TextMessage>(value, path, "a `text` message").map(Message::Text)
            }
            Some(Value::String(tag)) if tag == "document" => {
                record::<DocumentMessage>(value, path, "a `document` message")
                    .map(Message::Document)
            }
            Some(other) => Err(WebhookError::schema(tag_path, expected, describe(other))),
        }
    }
}

/// Serde entry point, always fail-closed with the default probing order.
///
/// Paths in its errors start at the change itself, and a
/// [`Change::Unrecognized`] written out by a tolerant [`Resolver`] does not
/// come back through here. Use [`crate::parser::Parser`] with the same
/// resolver to read such payloads.
impl<'de> Deserialize<'de> for Change {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        Resolver::default()
            .resolve_change(&value, CHANGE)
            .map_err(D::Error::custom)
    }
}

pub fn child(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

pub fn index(path: &str, i: usize) -> String {
    format!("{}[{}]", path, i)
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, WebhookError> {
    value
        .as_object()
        .ok_or_else(|| WebhookError::schema(path, "an object", describe(value)))
}

fn required<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value, WebhookError> {
    object
        .get(key)
        .ok_or_else(|| WebhookError::schema(child(path, key), "a value", "nothing"))
}

fn string(object: &Map<String, Value>, key: &str, path: &str) -> Result<String, WebhookError> {
    match required(object, key, path)? {
        Value::String(value) => Ok(value.clone()),
        other => Err(WebhookError::schema(child(path, key), "a string", describe(other))),
    }
}

fn array<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Vec<Value>, WebhookError> {
    match required(object, key, path)? {
        Value::Array(values) => Ok(values),
        other => Err(WebhookError::schema(child(path, key), "an array", describe(other))),
    }
}

fn metadata(object: &Map<String, Value>, path: &str) -> Result<Metadata, WebhookError> {
    let value = required(object, "metadata", path)?;
    record(value, &child(path, "metadata"), "a metadata record")
}

/// Leaf records carry no unions, so serde validates them directly. The
/// failing field is located with `serde_path_to_error` and joined onto `path`.
fn record<T: DeserializeOwned>(
    value: &Value,
    path: &str,
    expected: &str,
) -> Result<T, WebhookError> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let mut field_path = path.to_string();

        for segment in err.path().iter() {
            match segment {
                Segment::Seq { index: i } => field_path = index(&field_path, *i),
                Segment::Map { key } => field_path = child(&field_path, key),
                Segment::Enum { variant } => field_path = child(&field_path, variant),
                Segment::Unknown => field_path = child(&field_path, "?"),
            }
        }

        let message = err.into_inner().to_string();
        let (field_path, field_expected, actual) = split_serde_message(&field_path, &message);

        WebhookError::schema(
            field_path,
            field_expected.unwrap_or_else(|| expected.to_string()),
            actual,
        )
    })
}

/// Breaks serde's `invalid type: X, expected Y` and `missing field `f``
/// messages into path, expected and actual parts.
fn split_serde_message(path: &str, message: &str) -> (String, Option<String>, String) {
    if let Some(field) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
    {
        return (child(path, field), Some("a value".to_string()), "nothing".to_string());
    }

    for prefix in ["invalid type: ", "invalid value: ", "invalid length "] {
        if let Some((actual, expected)) = message
            .strip_prefix(prefix)
            .and_then(|rest| rest.split_once(", expected "))
        {
            return (path.to_string(), Some(expected.to_string()), actual.to_string());
        }
    }

    (path.to_string(), None, message.to_string())
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(value) => format!("boolean `{}`", value),
        Value::Number(value) => format!("number `{}`", value),
        Value::String(value) => format!("string \"{}\"", value),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata_json() -> Value {
        json!({
            "display_phone_number": "15550000000",
            "phone_number_id": "phone_number_id_1"
        })
    }

    fn status_json() -> Value {
        json!({
            "id": "status_id_1",
            "status": "read",
            "timestamp": "1627773291",
            "recipient_id": "15551234567",
            "conversation": {"id": "conversation_id_1", "origin": {"type": "service"}},
            "pricing": {"billable": true, "pricing_model": "CBP", "category": "service"}
        })
    }

    fn text_json() -> Value {
        json!({
            "from": "15551234567",
            "id": "message_id_1",
            "timestamp": "1627771715",
            "type": "text",
            "text": {"body": "hola"}
        })
    }

    fn schema_path(err: WebhookError) -> String {
        match err {
            WebhookError::SchemaValidation { path, .. } => path,
            other => panic!("expected a schema validation error, got {:?}", other),
        }
    }

    #[test]
    fn status_change_tagged_messages_resolves_to_statuses() {
        let change = json!({
            "field": "messages",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": metadata_json(),
                "statuses": [status_json()]
            }
        });

        let resolved = Resolver::default().resolve_change(&change, "change").unwrap();

        match resolved {
            Change::Statuses(change) => {
                assert_eq!(change.field, "messages");
                assert_eq!(change.value.statuses[0].status, "read");
            }
            other => panic!("expected statuses, got {:?}", other),
        }
    }

    #[test]
    fn probing_order_decides_between_overlapping_shapes() {
        let change = json!({
            "field": "messages",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": metadata_json(),
                "contacts": [],
                "messages": [text_json()],
                "statuses": [status_json()]
            }
        });

        let default = Resolver::default().resolve_change(&change, "change").unwrap();
        assert!(matches!(default, Change::Statuses(_)));

        let messages_first =
            Resolver::with_order(vec![ChangeShape::Messages, ChangeShape::Statuses])
                .resolve_change(&change, "change")
                .unwrap();
        assert!(matches!(messages_first, Change::Messages(_)));
    }

    #[test]
    fn falls_through_to_next_shape_when_first_does_not_validate() {
        let change = json!({
            "field": "messages",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": metadata_json(),
                "contacts": [],
                "messages": [text_json()],
                "statuses": "not-a-list"
            }
        });

        let resolved = Resolver::default().resolve_change(&change, "change").unwrap();

        assert!(matches!(resolved, Change::Messages(_)));
    }

    #[test]
    fn unknown_shape_fails_closed() {
        let change = json!({
            "field": "account_update",
            "value": {"ban_info": {}}
        });

        let err = Resolver::default().resolve_change(&change, "change").unwrap_err();

        match err {
            WebhookError::SchemaValidation { path, actual, .. } => {
                assert_eq!(path, "change.value");
                assert!(actual.contains("ban_info"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn unknown_shape_kept_when_accepted() {
        let change = json!({
            "field": "account_update",
            "value": {"ban_info": {}}
        });

        let resolved = Resolver::default()
            .accept_unrecognized()
            .resolve_change(&change, "change")
            .unwrap();

        match resolved {
            Change::Unrecognized(change) => {
                assert_eq!(change.field, "account_update");
                assert_eq!(change.value, json!({"ban_info": {}}));
            }
            other => panic!("expected unrecognized, got {:?}", other),
        }
    }

    #[test]
    fn missing_message_type_points_at_tag() {
        let mut message = text_json();
        message.as_object_mut().unwrap().remove("type");

        let err = Resolver::default()
            .resolve_message(&message, "$.messages[0]")
            .unwrap_err();

        assert_eq!(schema_path(err), "$.messages[0].type");
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let message = json!({
            "from": "1",
            "id": "2",
            "timestamp": "3",
            "type": "image",
            "image": {"id": "img"}
        });

        let err = Resolver::default().resolve_message(&message, "m").unwrap_err();

        match err {
            WebhookError::SchemaValidation { path, expected, actual } => {
                assert_eq!(path, "m.type");
                assert_eq!(expected, "one of `text`, `document`");
                assert_eq!(actual, "string \"image\"");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn nested_record_failure_carries_its_path() {
        let mut status = status_json();
        status.as_object_mut().unwrap().remove("pricing");
        let change = json!({
            "field": "statuses",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": metadata_json(),
                "statuses": [status]
            }
        });

        let err = Resolver::default().resolve_change(&change, "c").unwrap_err();

        match err {
            WebhookError::SchemaValidation { path, expected, actual } => {
                assert_eq!(path, "c.value.statuses[0].pricing");
                assert_eq!(expected, "a value");
                assert_eq!(actual, "nothing");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn deep_field_type_failure_points_at_the_field() {
        let mut status = status_json();
        status["conversation"]["origin"]["type"] = json!(5);
        let change = json!({
            "field": "messages",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": metadata_json(),
                "statuses": [status]
            }
        });

        let err = Resolver::default().resolve_change(&change, "c").unwrap_err();

        match err {
            WebhookError::SchemaValidation { path, expected, actual } => {
                assert_eq!(path, "c.value.statuses[0].conversation.origin.type");
                assert_eq!(expected, "a string");
                assert_eq!(actual, "integer `5`");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn missing_message_body_points_at_the_field() {
        let mut message = text_json();
        message["text"].as_object_mut().unwrap().remove("body");

        let err = Resolver::default()
            .resolve_message(&message, "m")
            .unwrap_err();

        assert_eq!(schema_path(err), "m.text.body");
    }

    #[test]
    fn metadata_failure_points_at_the_field() {
        let change = json!({
            "field": "statuses",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": {"display_phone_number": false, "phone_number_id": "p"},
                "statuses": []
            }
        });

        let err = Resolver::default().resolve_change(&change, "c").unwrap_err();

        assert_eq!(schema_path(err), "c.value.metadata.display_phone_number");
    }

    #[test]
    fn serde_messages_split_into_parts() {
        assert_eq!(
            split_serde_message("p", "invalid type: boolean `true`, expected a string"),
            (
                "p".to_string(),
                Some("a string".to_string()),
                "boolean `true`".to_string()
            )
        );
        assert_eq!(
            split_serde_message("p", "something else"),
            ("p".to_string(), None, "something else".to_string())
        );
    }

    #[test]
    fn wrong_scalar_type_is_described() {
        let payload = json!({"object": 7, "entry": []});

        let err = Resolver::default().resolve_payload(&payload).unwrap_err();

        match err {
            WebhookError::SchemaValidation { path, expected, actual } => {
                assert_eq!(path, "$.object");
                assert_eq!(expected, "a string");
                assert_eq!(actual, "number `7`");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn change_deserialize_goes_through_resolver() {
        let change: Change = serde_json::from_value(json!({
            "field": "messages",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": metadata_json(),
                "statuses": [status_json()]
            }
        }))
        .unwrap();

        assert!(matches!(change, Change::Statuses(_)));
        assert_eq!(change.field(), "messages");
    }

    #[test]
    fn change_deserialize_errors_start_at_the_change() {
        let mut message = text_json();
        message.as_object_mut().unwrap().remove("type");

        let err = serde_json::from_value::<Change>(json!({
            "field": "messages",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": metadata_json(),
                "contacts": [],
                "messages": [message]
            }
        }))
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("`change.value.messages[0].type`"));
    }

    #[test]
    fn unrecognized_change_only_reads_back_through_a_tolerant_resolver() {
        let resolver = Resolver::default().accept_unrecognized();
        let change = json!({"field": "account_update", "value": {"ban_info": {}}});

        let resolved = resolver.resolve_change(&change, "c").unwrap();
        let written = serde_json::to_value(&resolved).unwrap();

        assert_eq!(written, change);
        assert!(serde_json::from_value::<Change>(written.clone()).is_err());
        assert_eq!(resolver.resolve_change(&written, "c").unwrap(), resolved);
    }
}
