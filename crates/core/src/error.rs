//! 에러 타입: 도메인별 에러 정의

/// tailguard 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TailguardError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 소스 스캔 에러
    #[error("scan error: {0}")]
    Scan(String),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 알림 전송 에러
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스토리지 에러 (체크포인트/이벤트 저장소)
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 연결(열기) 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),

    /// 잠금 획득 실패 (poisoned)
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// 보조 미러(CSV) 기록 실패
    #[error("mirror write failed: {0}")]
    Mirror(String),
}

/// 알림 전송 에러
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// 전송 실패
    #[error("delivery via '{channel}' failed: {reason}")]
    Delivery { channel: String, reason: String },

    /// 전송 채널 설정 오류
    #[error("channel '{channel}' misconfigured: {reason}")]
    Misconfigured { channel: String, reason: String },
}
