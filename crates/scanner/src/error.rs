//! 스캐너 에러 타입
//!
//! [`ScannerError`]는 스캔 사이클 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<ScannerError> for TailguardError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 대부분의 에러는 소스 단위로 격리됩니다. [`ScannerError::is_recoverable`]가
//! `true`인 에러는 해당 소스만 건너뛰고 사이클을 계속 진행합니다.

use tailguard_core::error::{NotifyError, StorageError, TailguardError};

/// 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// 소스를 열거나 stat할 수 없음 (사라진 파일, 권한 없음)
    #[error("source unavailable: {source_id}: {reason}")]
    SourceUnavailable {
        /// 소스 식별자 (`host:path`)
        source_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 읽기 도중 중단됨
    #[error("source read interrupted: {source_id}: {reason}")]
    SourceReadInterrupted {
        /// 소스 식별자 (`host:path`)
        source_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 원격 호스트 연결 실패
    #[error("connection to {host} failed: {reason}")]
    Connection {
        /// 호스트 레이블
        host: String,
        /// 실패 사유
        reason: String,
    },

    /// 이벤트/체크포인트 저장 실패
    #[error("persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// 알림 전송 실패
    #[error("transport error: {0}")]
    Transport(#[from] NotifyError),

    /// 패턴 파일 로딩 실패
    #[error("pattern load error: {path}: {reason}")]
    PatternLoad {
        /// 패턴 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 패턴 유효성 검증 실패
    #[error("pattern validation error: category '{category}': {reason}")]
    PatternValidation {
        /// 문제가 된 카테고리
        category: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl ScannerError {
    /// 소스 하나만 건너뛰고 사이클을 계속할 수 있는 에러인지 확인합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. }
                | Self::SourceReadInterrupted { .. }
                | Self::Connection { .. }
                | Self::Persistence(_)
                | Self::Transport(_)
                | Self::Io(_)
        )
    }

    /// 소스 파일이 더 이상 존재하지 않아 건너뛰는 경우인지 확인합니다.
    pub fn is_vanished(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { reason, .. } if reason == crate::tailer::VANISHED_REASON
        )
    }

    /// 메트릭 레이블에 쓰는 짧은 종류 이름
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "unavailable",
            Self::SourceReadInterrupted { .. } => "interrupted",
            Self::Connection { .. } => "connection",
            Self::Persistence(_) => "persistence",
            Self::Transport(_) => "transport",
            Self::PatternLoad { .. } | Self::PatternValidation { .. } | Self::Regex(_) => {
                "pattern"
            }
            Self::Config { .. } => "config",
            Self::Io(_) => "io",
        }
    }
}

impl From<ScannerError> for TailguardError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::Persistence(e) => TailguardError::Storage(e),
            ScannerError::Transport(e) => TailguardError::Notify(e),
            ScannerError::Io(e) => TailguardError::Io(e),
            other => TailguardError::Scan(other.to_string()),
        }
    }
}
