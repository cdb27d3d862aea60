use crate::error::WebhookError;
use crate::resolver::Resolver;
use crate::structs::webhooks::WebhookPayload;
use serde_json::Value;

/// Parses raw callback bodies into [`WebhookPayload`]s.
///
/// Pure: decoding then validation, nothing is logged and no partial payload
/// is ever returned.
#[derive(Clone, Debug, Default)]
pub struct Parser {
    resolver: Resolver,
}

impl Parser {
    pub fn new(resolver: Resolver) -> Parser {
        Parser { resolver }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn parse(&self, raw: impl AsRef<[u8]>) -> Result<WebhookPayload, WebhookError> {
        let document: Value = serde_json::from_slice(raw.as_ref())?;

        self.resolver.resolve_payload(&document)
    }
}

/// Parses with the default resolver.
pub fn parse(raw: impl AsRef<[u8]>) -> Result<WebhookPayload, WebhookError> {
    Parser::default().parse(raw)
}
