use crate::error::WebhookError;
use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub verify_token: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Config, WebhookError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, WebhookError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let verify_token = lookup("VERIFY_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| WebhookError::Config("VERIFY_TOKEN must be set".to_string()))?;

        let host = lookup("WEBHOOK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("WEBHOOK_PORT") {
            Some(port) => port.parse::<u16>().map_err(|err| {
                WebhookError::Config(format!("WEBHOOK_PORT `{}` is not a port: {}", port, err))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            verify_token,
            host,
            port,
        })
    }
}
