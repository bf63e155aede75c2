//! Contact form relay: forwards visitor inquiries to the operators' inbox.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{GatewayError, Result};

const SUBJECT_PREFIX: &str = "[MatchVibe inquiry]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[async_trait]
pub trait ContactRelay: Send + Sync {
    async fn submit(&self, message: &ContactMessage) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    name: &'a str,
    email: &'a str,
    subject: String,
    message: &'a str,
    #[serde(rename = "_replyto")]
    reply_to: &'a str,
}

impl<'a> From<&'a ContactMessage> for RelayPayload<'a> {
    fn from(message: &'a ContactMessage) -> Self {
        Self {
            name: &message.name,
            email: &message.email,
            subject: format!("{SUBJECT_PREFIX} {}", message.subject),
            message: &message.message,
            reply_to: &message.email,
        }
    }
}

pub struct FormRelayClient {
    client: Client,
    endpoint: Url,
}

impl FormRelayClient {
    pub fn new(endpoint: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ContactRelay for FormRelayClient {
    async fn submit(&self, message: &ContactMessage) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&RelayPayload::from(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                service: "contact relay",
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("Contact form forwarded");
        Ok(())
    }
}
