//! 웹훅 채널 -- `{"text": body}` JSON을 POST합니다 (Slack Incoming Webhook 호환).

use std::time::Duration;

use serde::Serialize;
use tailguard_core::config::WebhookConfig;
use tailguard_core::error::NotifyError;
use tailguard_core::pipeline::Notifier;

use crate::error::ScannerError;

const CHANNEL: &str = "webhook";

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// HTTP 웹훅 알림 채널
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// URL과 요청 타임아웃으로 채널을 생성합니다.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ScannerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScannerError::Config {
                field: "alerts.webhook".to_owned(),
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// 설정으로 채널을 생성합니다.
    pub fn from_config(config: &WebhookConfig) -> Result<Self, ScannerError> {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }

    /// 대상 URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        CHANNEL
    }

    async fn deliver(&self, _subject: &str, body: &str) -> Result<(), NotifyError> {
        let delivery_err = |reason: String| NotifyError::Delivery {
            channel: CHANNEL.to_owned(),
            reason,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text: body })
            .send()
            .await
            .map_err(|e| delivery_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(delivery_err(format!("unexpected status {status}")));
        }
        Ok(())
    }
}
