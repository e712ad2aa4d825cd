//! 알림 전송 채널
//!
//! 각 채널은 [`Notifier`](tailguard_core::pipeline::Notifier)를 구현하며,
//! [`NotifierSet`]이 `DynNotifier` 목록으로 모아 한 번에 전송합니다.
//! 전송 실패는 로그와 메트릭으로만 남고 사이클이나 체크포인트에 영향을 주지 않습니다.
//!
//! - [`LogNotifier`]: tracing `warn!`으로 본문 기록
//! - [`WebhookNotifier`]: JSON `{"text": body}` POST (Slack 호환)
//! - `EmailNotifier`: SMTP (`email` feature)

#[cfg(feature = "email")]
pub mod email;
pub mod log;
pub mod webhook;

#[cfg(feature = "email")]
pub use email::EmailNotifier;
pub use log::LogNotifier;
pub use webhook::WebhookNotifier;

use tailguard_core::config::AlertsConfig;
use tailguard_core::metrics as m;
use tailguard_core::pipeline::DynNotifier;

use crate::alert::Alert;
use crate::error::ScannerError;

/// 한 번의 전송 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 전송에 성공한 채널
    pub delivered: Vec<String>,
    /// 전송에 실패한 채널과 사유
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    /// 모든 채널이 성공했는지 확인합니다.
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 활성화된 알림 채널 모음
#[derive(Default)]
pub struct NotifierSet {
    channels: Vec<Box<dyn DynNotifier>>,
}

impl NotifierSet {
    /// 빈 채널 모음을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정에서 활성화된 채널을 구성합니다.
    ///
    /// # Errors
    /// 웹훅 클라이언트를 만들 수 없거나, `email` feature 없이 이메일이 활성화된 경우
    pub fn from_config(config: &AlertsConfig) -> Result<Self, ScannerError> {
        let mut set = Self::new();

        if config.log_enabled {
            set.push(LogNotifier::new());
        }

        if config.webhook.enabled {
            set.push(WebhookNotifier::from_config(&config.webhook)?);
        }

        if config.email.enabled {
            #[cfg(feature = "email")]
            set.push(EmailNotifier::from_config(&config.email)?);

            #[cfg(not(feature = "email"))]
            return Err(ScannerError::Config {
                field: "alerts.email.enabled".to_owned(),
                reason: "tailguard was built without the `email` feature".to_owned(),
            });
        }

        tracing::info!(
            channels = ?set.channel_names(),
            "configured alert channels"
        );
        Ok(set)
    }

    /// 채널을 추가합니다.
    pub fn push(&mut self, channel: impl DynNotifier + 'static) {
        self.channels.push(Box::new(channel));
    }

    /// 채널 이름 목록
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// 채널 수
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// 채널이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// 모든 채널에 알림을 전송합니다. 실패한 채널은 `warn!`으로 남깁니다.
    pub async fn dispatch(&self, alert: &Alert) -> DispatchReport {
        let mut report = DispatchReport::default();

        for channel in &self.channels {
            let name = channel.name().to_owned();
            match channel.deliver(&alert.subject, &alert.body).await {
                Ok(()) => {
                    metrics::counter!(
                        m::ALERT_DELIVERIES_TOTAL,
                        m::LABEL_CHANNEL => name.clone(),
                        m::LABEL_RESULT => "success"
                    )
                    .increment(1);
                    tracing::debug!(channel = %name, "alert delivered");
                    report.delivered.push(name);
                }
                Err(e) => {
                    metrics::counter!(
                        m::ALERT_DELIVERIES_TOTAL,
                        m::LABEL_CHANNEL => name.clone(),
                        m::LABEL_RESULT => "failure"
                    )
                    .increment(1);
                    let err = ScannerError::Transport(e);
                    tracing::warn!(channel = %name, error = %err, "alert delivery failed");
                    report.failed.push((name, err.to_string()));
                }
            }
        }

        report
    }
}
