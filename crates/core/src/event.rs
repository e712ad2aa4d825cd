//! 이벤트: 분류된 로그 라인과 사이클 보고서
//!
//! [`IncidentEvent`]는 패턴에 매칭된 로그 라인 하나를 나타내는 불변 레코드이며,
//! 이벤트 저장소에 정확히 한 번 추가됩니다 (올바른 체크포인트 전제).
//! [`CycleReport`]는 스케줄러가 로깅/텔레메트리에 사용하는 사이클 요약입니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Category, SourceId};

/// 이벤트 타임스탬프 표시 형식 (`2024-01-15 12:00:00 UTC`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// 분류된 인시던트 이벤트
///
/// 수정/삭제 경로가 없는 불변 레코드입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentEvent {
    /// 분류 시각 (UTC)
    pub timestamp: DateTime<Utc>,
    /// 소스 호스트 레이블
    pub host: String,
    /// 소스 파일 경로
    pub filepath: String,
    /// 매칭된 카테고리
    pub category: Category,
    /// 매칭된 정규식 원문
    pub pattern: String,
    /// 원본 라인 (앞뒤 공백 제거)
    pub line: String,
}

impl IncidentEvent {
    /// 현재 시각으로 새 이벤트를 생성합니다.
    pub fn new(
        source: &SourceId,
        category: Category,
        pattern: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            host: source.host.clone(),
            filepath: source.path.clone(),
            category,
            pattern: pattern.into(),
            line: line.into(),
        }
    }

    /// 이벤트가 속한 소스 식별자를 반환합니다.
    pub fn source_id(&self) -> SourceId {
        SourceId::new(self.host.clone(), self.filepath.clone())
    }

    /// 표시용 타임스탬프 문자열을 반환합니다.
    pub fn timestamp_display(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for IncidentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}:{} {}",
            self.category, self.host, self.filepath, self.line
        )
    }
}

/// 한 사이클의 실행 결과 요약
///
/// 카테고리 순서는 패턴 레지스트리 순서를 따릅니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// 사이클 ID (로그 상관용)
    pub cycle_id: String,
    /// 이번 사이클에 저장된 새 이벤트 수
    pub new_event_count: usize,
    /// 카테고리별 카운트 (레지스트리 순서)
    pub per_category_counts: Vec<(Category, u64)>,
    /// 스캔을 시도한 소스 수
    pub sources_scanned: usize,
    /// 사라졌거나 접근할 수 없어 건너뛴 소스 수
    pub sources_skipped: usize,
    /// 읽기/저장 실패로 진행하지 못한 소스 수
    pub sources_failed: usize,
    /// 읽은 바이트 수
    pub bytes_read: u64,
    /// 읽은 라인 수
    pub lines_read: u64,
}

impl CycleReport {
    /// 특정 카테고리의 카운트를 반환합니다. 없으면 0입니다.
    pub fn count_for(&self, category: &str) -> u64 {
        self.per_category_counts
            .iter()
            .find(|(c, _)| c.as_str() == category)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self
            .per_category_counts
            .iter()
            .map(|(c, n)| format!("{c}={n}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "new events: {} | counts {{{}}} | sources scanned={} skipped={} failed={}",
            self.new_event_count,
            counts,
            self.sources_scanned,
            self.sources_skipped,
            self.sources_failed
        )
    }
}
