//! 알림 평가기 -- 사이클 요약을 임계값과 비교합니다.
//!
//! 평가는 사이클 사이에 상태를 갖지 않습니다. 임계값을 넘은 상태가 유지되면
//! 매 사이클 다시 알림이 발생합니다 (쿨다운/중복 제거 없음).
//! 임계값 맵에 없는 카테고리는 알림을 만들지 않습니다.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use tailguard_core::event::TIMESTAMP_FORMAT;
use tailguard_core::metrics as m;
use tailguard_core::types::Category;

use crate::cycle::CycleSummary;

/// 알림 제목 접두어
pub const SUBJECT_PREFIX: &str = "[tailguard]";

/// 임계값을 넘은 카테고리 하나
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredCategory {
    /// 카테고리
    pub category: Category,
    /// 이번 사이클 카운트
    pub count: u64,
    /// 설정된 임계값
    pub threshold: u64,
    /// 예시 위치 (`host:path`)
    pub examples: Vec<String>,
}

impl TriggeredCategory {
    /// 본문의 한 줄: `- CAT: n (>= t)  e.g., host:path, ...`
    pub fn line(&self) -> String {
        let mut line = format!(
            "- {}: {} (>= {})",
            self.category, self.count, self.threshold
        );
        if !self.examples.is_empty() {
            let _ = write!(line, "  e.g., {}", self.examples.join(", "));
        }
        line
    }
}

/// 한 사이클의 복합 알림
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// 제목
    pub subject: String,
    /// 본문 (제목, 빈 줄, 카테고리별 한 줄)
    pub body: String,
    /// 임계값을 넘은 카테고리 (레지스트리 순서)
    pub triggered: Vec<TriggeredCategory>,
}

/// 알림 평가기
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    thresholds: BTreeMap<String, u64>,
}

impl AlertEvaluator {
    /// 카테고리별 임계값으로 평가기를 생성합니다.
    pub fn new(thresholds: BTreeMap<String, u64>) -> Self {
        Self { thresholds }
    }

    /// 설정된 임계값
    pub fn thresholds(&self) -> &BTreeMap<String, u64> {
        &self.thresholds
    }

    /// 현재 시각으로 요약을 평가합니다.
    pub fn evaluate(&self, summary: &CycleSummary) -> Option<Alert> {
        self.evaluate_at(summary, Utc::now())
    }

    /// 지정한 시각으로 요약을 평가합니다. `count >= threshold`인 카테고리가 없으면 `None`입니다.
    pub fn evaluate_at(&self, summary: &CycleSummary, now: DateTime<Utc>) -> Option<Alert> {
        let triggered: Vec<TriggeredCategory> = summary
            .categories()
            .iter()
            .filter_map(|entry| {
                let threshold = *self.thresholds.get(entry.category.as_str())?;
                (entry.count >= threshold).then(|| TriggeredCategory {
                    category: entry.category.clone(),
                    count: entry.count,
                    threshold,
                    examples: entry.samples.iter().map(ToString::to_string).collect(),
                })
            })
            .collect();

        if triggered.is_empty() {
            return None;
        }

        let subject = format!(
            "{SUBJECT_PREFIX} Threshold exceeded at {}",
            now.format(TIMESTAMP_FORMAT)
        );
        let lines = triggered
            .iter()
            .map(TriggeredCategory::line)
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!("{subject}\n\n{lines}");

        metrics::counter!(m::ALERT_FIRED_TOTAL).increment(1);
        tracing::info!(
            categories = triggered.len(),
            "alert threshold exceeded"
        );

        Some(Alert {
            subject,
            body,
            triggered,
        })
    }
}
