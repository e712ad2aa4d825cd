//! 로그 채널 -- 알림 본문을 `warn!` 로그로 남깁니다.

use tailguard_core::error::NotifyError;
use tailguard_core::pipeline::Notifier;

/// tracing 기반 알림 채널
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// 로그 채널을 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::warn!(subject = %subject, body = %body, "alert");
        Ok(())
    }
}
