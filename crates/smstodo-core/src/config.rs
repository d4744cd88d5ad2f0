//! Process configuration, sourced from the environment at startup.
//!
//! A missing required value is fatal: the process must refuse to serve
//! rather than fail per-request.

use std::path::PathBuf;

use crate::error::{Result, TodoError};
use crate::phone;
use crate::signature::SignatureMethod;

const DEFAULT_DB_PATH: &str = "smstodo.redb";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    /// Gateway API key for the send endpoint.
    pub api_key: String,
    /// Gateway API secret for the send endpoint.
    pub api_secret: String,
    /// Shared secret for inbound webhook signatures.
    pub signature_secret: String,
    /// The service's own number (E.164); `from` on every reply.
    pub service_number: String,
    pub signature_method: SignatureMethod,
    pub db_path: PathBuf,
    pub port: u16,
}

impl Config {
    /// Load from process environment. Fails on the first missing or
    /// invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load via an injected lookup, so tests never touch process env.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            match get(name) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(TodoError::MissingConfig(name.to_string())),
            }
        };

        let service_number_raw = required("VONAGE_NUMBER")?;
        let service_number = phone::normalize(&service_number_raw).ok_or_else(|| {
            TodoError::InvalidConfig {
                name: "VONAGE_NUMBER".to_string(),
                reason: format!("not a valid phone number: {service_number_raw}"),
            }
        })?;

        let signature_method = match get("SMSTODO_SIGNATURE_METHOD") {
            Some(v) => {
                SignatureMethod::from_config(&v).ok_or_else(|| TodoError::InvalidConfig {
                    name: "SMSTODO_SIGNATURE_METHOD".to_string(),
                    reason: format!("unknown method '{v}' (expected md5hash or hmac-sha256)"),
                })?
            }
            None => SignatureMethod::default(),
        };

        let port = match get("PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|_| TodoError::InvalidConfig {
                name: "PORT".to_string(),
                reason: format!("not a port number: {v}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key: required("VONAGE_API_KEY")?,
            api_secret: required("VONAGE_API_SECRET")?,
            signature_secret: required("VONAGE_SIGNATURE_SECRET")?,
            service_number,
            signature_method,
            db_path: get("SMSTODO_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            port,
        })
    }
}
