//! 패턴 파일 로더 -- YAML 패턴 파일을 디스크에서 로드합니다.
//!
//! 파일 형식:
//!
//! ```yaml
//! categories:
//!   - name: FAILED_LOGIN
//!     patterns:
//!       - 'Failed password for (invalid user )?\w+ from (?P<ip>\d+\.\d+\.\d+\.\d+)'
//!   - name: CRASH
//!     patterns:
//!       - '\bkernel panic\b'
//! ```
//!
//! 파일 안의 카테고리 순서가 분류 순서입니다.

use std::path::Path;

use serde::Deserialize;
use tailguard_core::config::CategoryConfig;

use super::PatternRegistry;
use crate::config::ScannerConfig;
use crate::error::ScannerError;

/// 패턴 파일 최대 크기
const MAX_PATTERN_FILE_SIZE: u64 = 1024 * 1024; // 1MB

/// 카테고리당 최대 패턴 수
const MAX_PATTERNS_PER_CATEGORY: usize = 1_000;

#[derive(Debug, Deserialize)]
struct PatternFile {
    categories: Vec<PatternFileCategory>,
}

#[derive(Debug, Deserialize)]
struct PatternFileCategory {
    name: String,
    #[serde(default)]
    patterns: Vec<String>,
}

/// 패턴 파일 로더
pub struct PatternLoader;

impl PatternLoader {
    /// 설정에 따라 레지스트리를 만듭니다.
    ///
    /// `patterns_file`이 지정되어 있으면 그 파일을, 아니면 인라인 패턴을 사용합니다.
    pub async fn registry_for(config: &ScannerConfig) -> Result<PatternRegistry, ScannerError> {
        let categories = match config.patterns_file {
            Some(ref path) => Self::load_file(path).await?,
            None => config.patterns.clone(),
        };

        let registry = PatternRegistry::compile(&categories)?;
        tracing::info!(
            categories = registry.len(),
            patterns = registry.pattern_count(),
            source = config.patterns_file.as_deref().unwrap_or("inline"),
            "compiled pattern registry"
        );
        Ok(registry)
    }

    /// YAML 패턴 파일을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Vec<CategoryConfig>, ScannerError> {
        let path = path.as_ref();
        let load_err = |reason: String| ScannerError::PatternLoad {
            path: path.display().to_string(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| load_err(format!("failed to read file metadata: {e}")))?;

        if metadata.len() > MAX_PATTERN_FILE_SIZE {
            return Err(load_err(format!(
                "file too large: {} bytes (max: {MAX_PATTERN_FILE_SIZE})",
                metadata.len()
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| load_err(format!("failed to read file: {e}")))?;

        Self::parse_yaml(&content, &path.display().to_string())
    }

    /// YAML 문자열을 파싱하여 카테고리 목록을 만듭니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<Vec<CategoryConfig>, ScannerError> {
        let file: PatternFile =
            serde_yaml::from_str(yaml_str).map_err(|e| ScannerError::PatternLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        if file.categories.is_empty() {
            return Err(ScannerError::PatternLoad {
                path: source.to_owned(),
                reason: "no categories defined".to_owned(),
            });
        }

        let mut categories = Vec::with_capacity(file.categories.len());
        for entry in file.categories {
            if entry.patterns.len() > MAX_PATTERNS_PER_CATEGORY {
                return Err(ScannerError::PatternValidation {
                    category: entry.name,
                    reason: format!("too many patterns: max {MAX_PATTERNS_PER_CATEGORY}"),
                });
            }
            categories.push(CategoryConfig {
                category: entry.name,
                patterns: entry.patterns,
            });
        }

        Ok(categories)
    }
}
