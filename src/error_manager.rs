use crate::error::WebhookError;
use actix_web::http::StatusCode;
use log::{log, Level};

/// Client mistakes are warnings, anything on our side is an error.
pub fn log_level(error: &WebhookError) -> Level {
    match error {
        WebhookError::Config(_) => Level::Error,
        _ => Level::Warn,
    }
}

/// Status code and message safe to hand back to the provider. This is the
/// only place a failed webhook is logged.
pub fn get_public_error(error: &WebhookError) -> (StatusCode, String) {
    log!(log_level(error), "{}", error);

    match error {
        WebhookError::MalformedJson(_) => {
            (StatusCode::BAD_REQUEST, String::from("Invalid JSON provided"))
        }
        WebhookError::SchemaValidation { .. } => {
            (StatusCode::NOT_FOUND, String::from("Not a WhatsApp API event"))
        }
        WebhookError::NoChangesPresent { .. }
        | WebhookError::NotApplicable { .. }
        | WebhookError::UnhandledWebhookKind { .. } => (StatusCode::BAD_REQUEST, error.to_string()),
        WebhookError::Config(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Server misconfigured, retry later"),
        ),
    }
}
