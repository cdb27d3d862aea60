use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::WebhookError;
use crate::error_manager::get_public_error;
use crate::parser::Parser;
use crate::request_handler::{self, default_dispatcher, HandlerOutcome};
use crate::structs::StandardResponse;
use actix_web::{get, post, web, HttpResponse, Responder};
use log::{debug, info, warn};
use serde_derive::Deserialize;

/// Shared by every worker; read-only after start-up.
pub struct AppState {
    pub config: Config,
    pub parser: Parser,
    pub dispatcher: Dispatcher<HandlerOutcome, WebhookError>,
}

impl AppState {
    pub fn new(config: Config) -> AppState {
        AppState {
            config,
            parser: Parser::default(),
            dispatcher: default_dispatcher(),
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(validate).service(webhook);
}

#[get("/health")]
async fn health() -> impl Responder {
    "OK"
}

#[derive(Deserialize, Debug)]
pub struct VerificationParameters {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Subscription handshake: echo the challenge back when the token matches.
#[get("/webhook")]
async fn validate(
    state: web::Data<AppState>,
    parameters: web::Query<VerificationParameters>,
) -> HttpResponse {
    debug!("{:?}", &parameters);

    let VerificationParameters {
        mode,
        verify_token,
        challenge,
    } = parameters.into_inner();

    let (mode, verify_token, challenge) = match (mode, verify_token, challenge) {
        (Some(mode), Some(verify_token), Some(challenge)) => (mode, verify_token, challenge),
        _ => {
            warn!("Verification request without hub parameters");
            return HttpResponse::BadRequest()
                .json(StandardResponse::error("Missing parameters".to_string()));
        }
    };

    if mode != "subscribe" || verify_token != state.config.verify_token {
        warn!("Received verification token does not match the configured one");
        return HttpResponse::Forbidden()
            .json(StandardResponse::error("Verification failed".to_string()));
    }

    info!("Webhook verified");
    HttpResponse::Ok().body(challenge)
}

#[post("/webhook")]
async fn webhook(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    match request_handler::webhook_message(&state.parser, &state.dispatcher, &body) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => {
            let (status, message) = get_public_error(&err);
            HttpResponse::build(status).json(StandardResponse::error(message))
        }
    }
}
