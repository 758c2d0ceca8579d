//! # Push Notifications
//!
//! Expo push gateway client. Notifications are advisory: they are sent on a
//! detached task after the triggering request has been answered, and a
//! gateway failure is logged and counted but never surfaces to the caller.

use metrics::counter;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default Expo push endpoint, overridable for tests via configuration
pub const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Expo device tokens carry a fixed prefix; anything else is stale data
/// from an uninstalled app and is skipped without a gateway round trip.
pub fn is_expo_token(token: &str) -> bool {
    token.starts_with("ExponentPushToken")
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Device token is not an Expo push token")]
    InvalidToken,
    #[error("Push gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Push gateway returned status {0}")]
    GatewayStatus(reqwest::StatusCode),
}

/// Client for the Expo push gateway
pub struct PushClient {
    client: Client,
    gateway_url: String,
}

impl PushClient {
    pub fn new(gateway_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            gateway_url: gateway_url.unwrap_or_else(|| EXPO_PUSH_URL.to_string()),
        }
    }

    fn build_message(token: &str, title: &str, body: &str, data: &JsonValue) -> JsonValue {
        json!({
            "to": token,
            "title": title,
            "body": body,
            "data": data,
            "sound": "default",
            "priority": "high",
        })
    }

    /// Send one notification and wait for the gateway's answer
    pub async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &JsonValue,
    ) -> Result<(), PushError> {
        if !is_expo_token(token) {
            return Err(PushError::InvalidToken);
        }

        let payload = Self::build_message(token, title, body, data);
        let response = self
            .client
            .post(&self.gateway_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PushError::GatewayStatus(response.status()));
        }

        debug!("Push notification delivered to gateway");
        Ok(())
    }

    /// Fire-and-forget delivery on a detached task. A missing or non-Expo
    /// token is skipped silently; a gateway failure is logged and counted.
    pub fn spawn_send(
        self: &Arc<Self>,
        token: Option<String>,
        title: String,
        body: String,
        data: JsonValue,
    ) {
        let Some(token) = token else {
            return;
        };
        if !is_expo_token(&token) {
            debug!("Skipping push: device token is not an Expo token");
            return;
        }

        let client = Arc::clone(self);
        tokio::spawn(async move {
            match client.send(&token, &title, &body, &data).await {
                Ok(()) => {
                    counter!("push_notifications_sent_total").increment(1);
                }
                Err(err) => {
                    counter!("push_notifications_failed_total").increment(1);
                    warn!("Push notification failed: {}", err);
                }
            }
        });
    }
}
