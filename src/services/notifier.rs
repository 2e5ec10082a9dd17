use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when sending a WhatsApp message
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Message rejected by provider: {0}")]
    Rejected(String),
}

/// Transport status reported by the provider for a delivered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
    pub status: String,
}

/// Outbound send capability
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `body` to `destination` (`+` followed by country code and number)
    async fn send(&self, destination: &str, body: &str) -> Result<DeliveryReceipt, NotifyError>;
}

/// Build the destination identifier from a contact number and country code.
///
/// The number is expected to carry its own country code. An international `00`
/// prefix is dropped and a single national trunk `0` is replaced with
/// `country_code`; anything else is sent as given.
pub fn destination_for(contact_number: &str, country_code: &str) -> String {
    if let Some(international) = contact_number.strip_prefix("00") {
        return format!("+{}", international);
    }
    match contact_number.strip_prefix('0') {
        Some(national) if !country_code.is_empty() => format!("+{}{}", country_code, national),
        _ => format!("+{}", contact_number),
    }
}

/// UltraMsg WhatsApp API client
pub struct UltraMsgClient {
    base_url: String,
    instance: String,
    token: String,
    client: Client,
}

impl UltraMsgClient {
    pub fn new(
        base_url: String,
        instance: String,
        token: String,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            instance,
            token,
            client,
        })
    }
}

#[async_trait]
impl Notifier for UltraMsgClient {
    async fn send(&self, destination: &str, body: &str) -> Result<DeliveryReceipt, NotifyError> {
        let url = format!(
            "{}/{}/messages/chat",
            self.base_url.trim_end_matches('/'),
            self.instance
        );

        let form = [
            ("token", self.token.as_str()),
            ("to", destination),
            ("body", body),
        ];

        tracing::debug!("Sending WhatsApp message via {}", url);

        let response = self.client.post(&url).form(&form).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(NotifyError::ApiError(format!("{}: {}", status, text)));
        }

        parse_receipt(&text)
    }
}

/// UltraMsg answers `{"sent":"true","message":"ok","id":...}` on success and
/// `{"error": ...}` otherwise, both with status 200.
fn parse_receipt(text: &str) -> Result<DeliveryReceipt, NotifyError> {
    let json: Value = serde_json::from_str(text)
        .map_err(|_| NotifyError::Rejected(format!("unexpected response: {}", text)))?;

    if let Some(error) = json.get("error") {
        return Err(NotifyError::Rejected(error.to_string()));
    }

    let sent = match json.get("sent") {
        Some(Value::String(s)) => s == "true",
        Some(Value::Bool(b)) => *b,
        _ => false,
    };

    if !sent {
        return Err(NotifyError::Rejected(text.to_string()));
    }

    Ok(DeliveryReceipt {
        message_id: json.get("id").map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        status: json
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("ok")
            .to_string(),
    })
}
