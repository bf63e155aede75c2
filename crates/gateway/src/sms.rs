//! Text messages through the Solapi gateway.
//!
//! Every call is authenticated with a fresh signature:
//! `HMAC-SHA256(secret, date + salt)`, hex encoded, sent in the `Authorization`
//! header next to the API key, date and salt.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;

use crate::error::{GatewayError, Result};

const SALT_LENGTH: usize = 10;
const SEND_PATH: &str = "/messages/v4/send";

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` to `to`. Hyphens in the number are ignored.
    async fn send(&self, to: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SolapiConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Registered sender number.
    pub sender: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: OutgoingMessage<'a>,
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    to: &'a str,
    from: &'a str,
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_message: Option<String>,
    message: Option<String>,
}

pub struct SolapiClient {
    client: Client,
    config: SolapiConfig,
}

impl SolapiClient {
    pub fn new(config: SolapiConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self { client, config })
    }

    fn authorization(&self) -> String {
        let date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let salt = random_salt();
        authorization_header(&self.config.api_key, &self.config.api_secret, &date, &salt)
    }
}

#[async_trait]
impl Notifier for SolapiClient {
    async fn send(&self, to: &str, text: &str) -> Result<()> {
        let to = normalize_phone(to);
        if to.is_empty() {
            return Err(GatewayError::InvalidInput(
                "destination number is empty".to_string(),
            ));
        }

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), SEND_PATH);
        let body = SendRequest {
            message: OutgoingMessage {
                to: &to,
                from: &self.config.sender,
                text,
            },
        };

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(to = %mask_phone(&to), "SMS accepted by gateway");
            return Ok(());
        }

        let raw = response.text().await.unwrap_or_default();
        let error: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        let message = error
            .error_message
            .or(error.message)
            .unwrap_or_else(|| "SMS delivery failed".to_string());

        tracing::error!(status = status.as_u16(), body = %raw, "SMS gateway rejected message");

        Err(GatewayError::Rejected {
            service: "SMS gateway",
            status: status.as_u16(),
            message,
        })
    }
}

/// Digits only, as the gateway expects (`010-1234-5678` -> `01012345678`).
pub fn normalize_phone(number: &str) -> String {
    number
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

/// Keeps the last four digits for logs.
pub fn mask_phone(number: &str) -> String {
    let digits: Vec<char> = number.chars().collect();
    let visible = digits.len().saturating_sub(4);
    digits
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

pub fn sign(secret: &str, date: &str, salt: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(date.as_bytes());
    mac.update(salt.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn authorization_header(api_key: &str, secret: &str, date: &str, salt: &str) -> String {
    format!(
        "HMAC-SHA256 apiKey={api_key}, date={date}, salt={salt}, signature={}",
        sign(secret, date, salt)
    )
}

fn random_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}
