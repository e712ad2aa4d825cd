//! 이메일 채널 -- SMTP로 알림을 보냅니다.

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tailguard_core::config::EmailConfig;
use tailguard_core::error::NotifyError;
use tailguard_core::pipeline::Notifier;

use crate::error::ScannerError;

const CHANNEL: &str = "email";

/// SMTP 알림 채널
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    /// 설정으로 채널을 생성합니다.
    ///
    /// `use_tls`이면 STARTTLS, 아니면 평문 연결을 사용합니다.
    pub fn from_config(config: &EmailConfig) -> Result<Self, ScannerError> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| config_err("alerts.email.smtp_host", e))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        }
        .port(config.smtp_port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| config_err("alerts.email.from", e))?;
        let to = config
            .to
            .iter()
            .map(|addr| addr.parse::<Mailbox>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| config_err("alerts.email.to", e))?;

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

fn config_err(field: &str, err: impl std::fmt::Display) -> ScannerError {
    ScannerError::Config {
        field: field.to_owned(),
        reason: err.to_string(),
    }
}

impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        CHANNEL
    }

    async fn deliver(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let delivery_err = |reason: String| NotifyError::Delivery {
            channel: CHANNEL.to_owned(),
            reason,
        };

        let mut message = Message::builder().from(self.from.clone()).subject(subject);
        for recipient in &self.to {
            message = message.to(recipient.clone());
        }
        let message = message
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())
            .map_err(|e| delivery_err(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| delivery_err(e.to_string()))?;
        Ok(())
    }
}
