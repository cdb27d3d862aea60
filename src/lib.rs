//! Validation and dispatch of WhatsApp Cloud API webhook callbacks.
//!
//! Raw bodies are parsed into [`structs::webhooks::WebhookPayload`], wrapped
//! in a [`webhook::Webhook`] facade and routed to one handler per kind by a
//! [`dispatch::Dispatcher`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod error_manager;
pub mod parser;
pub mod request_handler;
pub mod resolver;
pub mod routes;
pub mod structs;
pub mod webhook;

pub use dispatch::{Dispatcher, HandlerKey};
pub use error::WebhookError;
pub use parser::{parse, Parser};
pub use resolver::{ChangeShape, Resolver};
pub use webhook::{Kind, MessageKind, Webhook};
