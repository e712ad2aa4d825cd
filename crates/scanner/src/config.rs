//! 스캐너 설정
//!
//! [`ScannerConfig`]는 core의 [`TailguardConfig`]에서 스캔 사이클에 필요한 값만 추려
//! 불변 설정 객체로 만듭니다. 시작 시 한 번 생성되어 각 컴포넌트에 전달됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use tailguard_core::config::TailguardConfig;
//! use tailguard_scanner::config::ScannerConfig;
//!
//! let core_config = TailguardConfig::default();
//! let config = ScannerConfig::from_core(&core_config);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tailguard_core::config::{CategoryConfig, RemoteHostConfig, TailguardConfig, default_patterns};

use crate::error::ScannerError;

/// 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// 로컬 소스 스캔 여부
    pub scan_local: bool,
    /// 원격 소스 스캔 여부
    pub scan_remote: bool,
    /// 사이클 주기 (초)
    pub interval_secs: u64,
    /// 로컬 파일/디렉토리 경로
    pub local_paths: Vec<String>,
    /// 디렉토리 탐색 시 포함할 파일명 글롭
    pub filename_globs: Vec<String>,
    /// 원격 호스트 목록
    pub remote_hosts: Vec<RemoteHostConfig>,
    /// 원격 읽기 타임아웃 (초)
    pub remote_read_timeout_secs: u64,
    /// 카테고리별 샘플 상한
    pub sample_limit: usize,
    /// 인라인 패턴 (순서 = 분류 순서)
    pub patterns: Vec<CategoryConfig>,
    /// YAML 패턴 파일 (지정 시 인라인 패턴 대신 사용)
    pub patterns_file: Option<String>,
    /// 카테고리별 임계값
    pub thresholds: BTreeMap<String, u64>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_local: true,
            scan_remote: false,
            interval_secs: 10,
            local_paths: Vec::new(),
            filename_globs: vec!["*.log".to_owned(), "*.out".to_owned(), "*.txt".to_owned()],
            remote_hosts: Vec::new(),
            remote_read_timeout_secs: 10,
            sample_limit: 5,
            patterns: default_patterns(),
            patterns_file: None,
            thresholds: BTreeMap::new(),
        }
    }
}

impl ScannerConfig {
    /// core의 `TailguardConfig`에서 스캐너 설정을 생성합니다.
    pub fn from_core(core: &TailguardConfig) -> Self {
        Self {
            scan_local: core.scan.includes_local(),
            scan_remote: core.scan.includes_remote(),
            interval_secs: core.scan.interval_secs,
            local_paths: core.scan.local_paths.clone(),
            filename_globs: core.scan.filename_globs.clone(),
            remote_hosts: core.remote_hosts.clone(),
            remote_read_timeout_secs: core.scan.remote_read_timeout_secs,
            sample_limit: core.scan.sample_limit,
            patterns: core.patterns.clone(),
            patterns_file: core.scan.patterns_file.clone(),
            thresholds: core.thresholds.clone(),
        }
    }

    /// 사이클 주기
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// 원격 읽기 타임아웃
    pub fn remote_read_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_read_timeout_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.interval_secs == 0 {
            return Err(config_err("interval_secs", "must be greater than 0"));
        }

        if self.sample_limit == 0 {
            return Err(config_err("sample_limit", "must be greater than 0"));
        }

        if self.scan_remote && self.remote_read_timeout_secs == 0 {
            return Err(config_err(
                "remote_read_timeout_secs",
                "must be greater than 0",
            ));
        }

        if !self.scan_local && !self.scan_remote {
            return Err(config_err("mode", "at least one of local/remote must be enabled"));
        }

        for glob in &self.filename_globs {
            glob::Pattern::new(glob).map_err(|e| {
                config_err("filename_globs", format!("invalid glob '{glob}': {e}"))
            })?;
        }

        if self.patterns_file.is_none() && self.patterns.is_empty() {
            return Err(config_err(
                "patterns",
                "at least one category must be configured",
            ));
        }

        if let Some((category, _)) = self.thresholds.iter().find(|(_, t)| **t == 0) {
            return Err(config_err(
                &format!("thresholds.{category}"),
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn config_err(field: &str, reason: impl Into<String>) -> ScannerError {
    ScannerError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// 스캐너 설정 빌더
#[derive(Default)]
pub struct ScannerConfigBuilder {
    config: ScannerConfig,
}

impl ScannerConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 로컬/원격 스캔 여부를 설정합니다.
    pub fn modes(mut self, local: bool, remote: bool) -> Self {
        self.config.scan_local = local;
        self.config.scan_remote = remote;
        self
    }

    /// 사이클 주기를 설정합니다.
    pub fn interval_secs(mut self, secs: u64) -> Self {
        self.config.interval_secs = secs;
        self
    }

    /// 로컬 경로를 설정합니다.
    pub fn local_paths(mut self, paths: Vec<String>) -> Self {
        self.config.local_paths = paths;
        self
    }

    /// 파일명 글롭을 설정합니다.
    pub fn filename_globs(mut self, globs: Vec<String>) -> Self {
        self.config.filename_globs = globs;
        self
    }

    /// 원격 호스트를 추가합니다.
    pub fn remote_host(mut self, host: RemoteHostConfig) -> Self {
        self.config.remote_hosts.push(host);
        self
    }

    /// 원격 읽기 타임아웃을 설정합니다.
    pub fn remote_read_timeout_secs(mut self, secs: u64) -> Self {
        self.config.remote_read_timeout_secs = secs;
        self
    }

    /// 샘플 상한을 설정합니다.
    pub fn sample_limit(mut self, limit: usize) -> Self {
        self.config.sample_limit = limit;
        self
    }

    /// 인라인 패턴을 설정합니다.
    pub fn patterns(mut self, patterns: Vec<CategoryConfig>) -> Self {
        self.config.patterns = patterns;
        self
    }

    /// 패턴 파일을 설정합니다.
    pub fn patterns_file(mut self, path: impl Into<String>) -> Self {
        self.config.patterns_file = Some(path.into());
        self
    }

    /// 카테고리 임계값을 설정합니다.
    pub fn threshold(mut self, category: impl Into<String>, threshold: u64) -> Self {
        self.config.thresholds.insert(category.into(), threshold);
        self
    }

    /// 설정을 검증하고 빌드합니다.
    pub fn build(self) -> Result<ScannerConfig, ScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_core_copies_scan_section() {
        let mut core = TailguardConfig::default();
        core.scan.mode = "mixed".to_owned();
        core.scan.sample_limit = 3;
        let config = ScannerConfig::from_core(&core);
        assert!(config.scan_local);
        assert!(config.scan_remote);
        assert_eq!(config.sample_limit, 3);
        assert_eq!(config.thresholds.get("FAILED_LOGIN"), Some(&5));
        config.validate().unwrap();
    }

    #[test]
    fn builder_rejects_zero_sample_limit() {
        let err = ScannerConfigBuilder::new().sample_limit(0).build().unwrap_err();
        assert!(err.to_string().contains("sample_limit"));
    }

    #[test]
    fn builder_rejects_invalid_glob() {
        let err = ScannerConfigBuilder::new()
            .filename_globs(vec!["[".to_owned()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("filename_globs"));
    }

    #[test]
    fn builder_rejects_zero_threshold() {
        let err = ScannerConfigBuilder::new()
            .threshold("CRASH", 0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("thresholds.CRASH"));
    }

    #[test]
    fn builder_rejects_no_modes() {
        assert!(ScannerConfigBuilder::new().modes(false, false).build().is_err());
    }

    #[test]
    fn builder_collects_values() {
        let config = ScannerConfigBuilder::new()
            .local_paths(vec!["/var/log".to_owned()])
            .interval_secs(30)
            .threshold("CRASH", 2)
            .build()
            .unwrap();
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.thresholds.get("CRASH"), Some(&2));
    }
}
