use thiserror::Error;

/// Every failure the webhook core can report.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("schema validation failed at `{path}`: expected {expected}, found {actual}")]
    SchemaValidation {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("no content present at `{path}`")]
    NoChangesPresent { path: String },

    #[error("not a {expected}, webhook is {actual}")]
    NotApplicable {
        expected: &'static str,
        actual: String,
    },

    #[error("no handler registered for webhook kind `{kind}`")]
    UnhandledWebhookKind { kind: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl WebhookError {
    pub(crate) fn schema(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> WebhookError {
        WebhookError::SchemaValidation {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn empty(path: impl Into<String>) -> WebhookError {
        WebhookError::NoChangesPresent { path: path.into() }
    }
}
