//! 인시던트 분류기 -- 라인 하나를 최대 하나의 카테고리로 분류합니다.
//!
//! 카테고리를 레지스트리 순서로, 카테고리 안에서는 패턴을 설정 순서로 평가하며
//! 처음 일치한 패턴에서 즉시 멈춥니다. 여러 카테고리에 일치하는 라인은
//! 항상 레지스트리에서 앞선 카테고리에 속합니다.

use std::sync::Arc;

use tailguard_core::event::IncidentEvent;
use tailguard_core::types::{Category, SourceId};

use super::PatternRegistry;

/// 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    /// 일치한 카테고리
    pub category: &'a Category,
    /// 일치한 패턴 원문
    pub pattern: &'a str,
}

/// 인시던트 분류기
#[derive(Debug, Clone)]
pub struct IncidentClassifier {
    registry: Arc<PatternRegistry>,
}

impl IncidentClassifier {
    /// 레지스트리로 분류기를 생성합니다.
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    /// 사용 중인 레지스트리
    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// 라인을 분류합니다. 어떤 패턴에도 일치하지 않으면 `None`입니다.
    pub fn classify(&self, line: &str) -> Option<Classification<'_>> {
        self.registry.iter().find_map(|entry| {
            entry
                .patterns
                .iter()
                .find(|p| p.is_match(line))
                .map(|p| Classification {
                    category: &entry.category,
                    pattern: p.as_str(),
                })
        })
    }

    /// 한 소스의 라인들을 분류하여 이벤트 목록을 만듭니다 (파일 순서 유지).
    ///
    /// 일치하지 않은 라인은 버려집니다. 이벤트의 라인은 앞뒤 공백을 제거해 저장합니다.
    pub fn classify_lines(&self, source: &SourceId, lines: &[String]) -> Vec<IncidentEvent> {
        lines
            .iter()
            .filter_map(|line| {
                self.classify(line).map(|hit| {
                    IncidentEvent::new(source, hit.category.clone(), hit.pattern, line.trim())
                })
            })
            .collect()
    }
}
