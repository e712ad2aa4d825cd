//! 패턴 레지스트리: 카테고리별 정규식 목록
//!
//! 카테고리 순서와 카테고리 내 패턴 순서는 설정 순서를 그대로 따르며,
//! 이 순서가 분류의 tie-break 규칙입니다 ([`classifier`] 참고).
//!
//! 레지스트리는 시작 시 한 번 컴파일되고 이후 변경되지 않습니다. `Arc`로 공유합니다.
//!
//! - [`loader`]: YAML 패턴 파일 로더
//! - [`classifier`]: 라인 분류기

pub mod classifier;
pub mod loader;

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use tailguard_core::config::CategoryConfig;
use tailguard_core::types::Category;

use crate::error::ScannerError;

pub use classifier::{Classification, IncidentClassifier};
pub use loader::PatternLoader;

/// 정규식 하나당 최대 컴파일 크기 (바이트)
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// 컴파일된 패턴
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// 대소문자를 무시하는 정규식으로 컴파일합니다.
    pub fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    /// 패턴 원문
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// 라인의 어느 위치에서든 일치하는지 확인합니다.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// 카테고리와 그 패턴 목록
#[derive(Debug, Clone)]
pub struct CategoryPatterns {
    /// 카테고리
    pub category: Category,
    /// 평가 순서대로 정렬된 패턴
    pub patterns: Vec<CompiledPattern>,
}

/// 불변 패턴 레지스트리
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    categories: Vec<CategoryPatterns>,
}

impl PatternRegistry {
    /// 설정된 카테고리 목록을 순서대로 컴파일합니다.
    ///
    /// # Errors
    /// 카테고리가 없거나, 이름이 비었거나 중복되거나, 패턴이 없거나,
    /// 정규식이 잘못된 경우 [`ScannerError::PatternValidation`]
    pub fn compile(configs: &[CategoryConfig]) -> Result<Self, ScannerError> {
        if configs.is_empty() {
            return Err(ScannerError::PatternValidation {
                category: String::new(),
                reason: "at least one category is required".to_owned(),
            });
        }

        let mut seen = HashSet::new();
        let mut categories = Vec::with_capacity(configs.len());

        for config in configs {
            let name = config.category.trim();
            if name.is_empty() {
                return Err(ScannerError::PatternValidation {
                    category: config.category.clone(),
                    reason: "category name must not be empty".to_owned(),
                });
            }
            if !seen.insert(name.to_owned()) {
                return Err(ScannerError::PatternValidation {
                    category: name.to_owned(),
                    reason: "duplicate category".to_owned(),
                });
            }
            if config.patterns.is_empty() {
                return Err(ScannerError::PatternValidation {
                    category: name.to_owned(),
                    reason: "category has no patterns".to_owned(),
                });
            }

            let patterns = config
                .patterns
                .iter()
                .enumerate()
                .map(|(idx, source)| {
                    CompiledPattern::compile(source).map_err(|e| {
                        ScannerError::PatternValidation {
                            category: name.to_owned(),
                            reason: format!("invalid regex at patterns[{idx}]: {e}"),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            categories.push(CategoryPatterns {
                category: Category::new(name),
                patterns,
            });
        }

        Ok(Self { categories })
    }

    /// 카테고리를 레지스트리 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryPatterns> {
        self.categories.iter()
    }

    /// 카테고리 이름을 레지스트리 순서대로 반환합니다.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().map(|c| &c.category)
    }

    /// 카테고리 수
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// 비어 있는지 확인합니다 (컴파일된 레지스트리는 항상 비어 있지 않음).
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// 전체 패턴 수
    pub fn pattern_count(&self) -> usize {
        self.categories.iter().map(|c| c.patterns.len()).sum()
    }
}
