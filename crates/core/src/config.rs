//! 설정 관리: tailguard.toml 파싱 및 런타임 설정
//!
//! [`TailguardConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//! 시작 시 한 번 생성된 뒤 변경되지 않으며, 각 컴포넌트에 참조로 전달됩니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`TAILGUARD_SCAN_INTERVAL_SECS=30` 형식)
//! 3. 설정 파일 (`tailguard.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tailguard_core::error::TailguardError> {
//! use tailguard_core::config::TailguardConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TailguardConfig::load("tailguard.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TailguardConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TailguardError};

/// 허용되는 스캔 모드
pub const SCAN_MODES: &[&str] = &["local", "remote", "mixed"];

/// tailguard 통합 설정
///
/// `tailguard.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailguardConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 설정
    #[serde(default)]
    pub scan: ScanConfig,
    /// 원격 호스트 목록 (`remote`/`mixed` 모드에서 사용)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_hosts: Vec<RemoteHostConfig>,
    /// 카테고리별 패턴 목록. 배열 순서가 분류 순서입니다.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<CategoryConfig>,
    /// 카테고리별 사이클당 알림 임계값
    #[serde(default = "default_thresholds")]
    pub thresholds: BTreeMap<String, u64>,
    /// 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 알림 채널 설정
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for TailguardConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            scan: ScanConfig::default(),
            remote_hosts: Vec::new(),
            patterns: default_patterns(),
            thresholds: default_thresholds(),
            storage: StorageConfig::default(),
            alerts: AlertsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl TailguardConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TailguardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TailguardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TailguardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TailguardError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TailguardError> {
        toml::from_str(toml_str).map_err(|e| {
            TailguardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TAILGUARD_{SECTION}_{FIELD}`
    /// 예: `TAILGUARD_SCAN_MODE=mixed`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TAILGUARD_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TAILGUARD_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "TAILGUARD_GENERAL_DATA_DIR");
        override_string(&mut self.general.pid_file, "TAILGUARD_GENERAL_PID_FILE");

        // Scan
        override_string(&mut self.scan.mode, "TAILGUARD_SCAN_MODE");
        override_u64(&mut self.scan.interval_secs, "TAILGUARD_SCAN_INTERVAL_SECS");
        override_csv(&mut self.scan.local_paths, "TAILGUARD_SCAN_LOCAL_PATHS");
        override_csv(
            &mut self.scan.filename_globs,
            "TAILGUARD_SCAN_FILENAME_GLOBS",
        );
        override_u64(
            &mut self.scan.remote_read_timeout_secs,
            "TAILGUARD_SCAN_REMOTE_READ_TIMEOUT_SECS",
        );
        override_usize(&mut self.scan.sample_limit, "TAILGUARD_SCAN_SAMPLE_LIMIT");
        override_opt_string(&mut self.scan.patterns_file, "TAILGUARD_SCAN_PATTERNS_FILE");

        // Storage
        override_string(&mut self.storage.sqlite_path, "TAILGUARD_STORAGE_SQLITE_PATH");
        override_string(&mut self.storage.csv_path, "TAILGUARD_STORAGE_CSV_PATH");
        override_u64(
            &mut self.storage.maintenance_interval_hours,
            "TAILGUARD_STORAGE_MAINTENANCE_INTERVAL_HOURS",
        );

        // Alerts
        override_bool(&mut self.alerts.log_enabled, "TAILGUARD_ALERTS_LOG_ENABLED");
        override_bool(
            &mut self.alerts.webhook.enabled,
            "TAILGUARD_ALERTS_WEBHOOK_ENABLED",
        );
        override_string(&mut self.alerts.webhook.url, "TAILGUARD_ALERTS_WEBHOOK_URL");
        override_bool(
            &mut self.alerts.email.enabled,
            "TAILGUARD_ALERTS_EMAIL_ENABLED",
        );
        override_string(
            &mut self.alerts.email.smtp_host,
            "TAILGUARD_ALERTS_EMAIL_SMTP_HOST",
        );
        override_string(
            &mut self.alerts.email.username,
            "TAILGUARD_ALERTS_EMAIL_USERNAME",
        );
        override_string(
            &mut self.alerts.email.password,
            "TAILGUARD_ALERTS_EMAIL_PASSWORD",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "TAILGUARD_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "TAILGUARD_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "TAILGUARD_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TailguardError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.scan.validate()?;

        if self.scan.includes_remote() {
            for (idx, host) in self.remote_hosts.iter().enumerate() {
                host.validate(idx)?;
            }
        }

        // 패턴 파일이 지정되면 인라인 패턴은 무시되므로 검증하지 않음
        if self.scan.patterns_file.is_none() {
            validate_categories(&self.patterns)?;
        }

        for (category, threshold) in &self.thresholds {
            if *threshold == 0 {
                return Err(invalid(
                    &format!("thresholds.{category}"),
                    "must be greater than 0",
                ));
            }
        }

        self.alerts.validate()?;

        Ok(())
    }
}

/// 카테고리 목록의 구조적 유효성을 검증합니다 (이름 중복, 빈 패턴).
///
/// 정규식 컴파일 검증은 스캐너의 패턴 레지스트리가 담당합니다.
pub fn validate_categories(categories: &[CategoryConfig]) -> Result<(), TailguardError> {
    if categories.is_empty() {
        return Err(invalid("patterns", "at least one category must be configured"));
    }

    let mut seen = HashSet::new();
    for (idx, category) in categories.iter().enumerate() {
        if category.category.trim().is_empty() {
            return Err(invalid(
                &format!("patterns[{idx}].category"),
                "category name must not be empty",
            ));
        }
        if !seen.insert(category.category.as_str()) {
            return Err(invalid(
                &format!("patterns[{idx}].category"),
                format!("duplicate category '{}'", category.category),
            ));
        }
        if category.patterns.is_empty() {
            return Err(invalid(
                &format!("patterns[{idx}].patterns"),
                format!("category '{}' has no patterns", category.category),
            ));
        }
    }
    Ok(())
}

fn invalid(field: &str, reason: impl Into<String>) -> TailguardError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 데이터 디렉토리
    pub data_dir: String,
    /// PID 파일 경로 (빈 문자열이면 사용하지 않음)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "./data".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 스캔 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 스캔 모드 (local, remote, mixed)
    pub mode: String,
    /// 스캔 주기 (초)
    pub interval_secs: u64,
    /// 로컬 파일 또는 디렉토리 경로 (디렉토리는 재귀 탐색)
    pub local_paths: Vec<String>,
    /// 디렉토리 탐색 시 포함할 파일명 글롭
    pub filename_globs: Vec<String>,
    /// 원격 읽기 타임아웃 (초)
    pub remote_read_timeout_secs: u64,
    /// 카테고리별 알림 예시 소스 최대 개수
    pub sample_limit: usize,
    /// YAML 패턴 파일 경로 (지정 시 인라인 `[[patterns]]` 대신 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns_file: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: "local".to_owned(),
            interval_secs: 10,
            local_paths: vec!["/var/log/auth.log".to_owned(), "/var/log/syslog".to_owned()],
            filename_globs: vec!["*.log".to_owned(), "*.out".to_owned(), "*.txt".to_owned()],
            remote_read_timeout_secs: 10,
            sample_limit: 5,
            patterns_file: None,
        }
    }
}

impl ScanConfig {
    /// 로컬 소스를 스캔하는 모드인지 확인합니다.
    pub fn includes_local(&self) -> bool {
        matches!(self.mode.as_str(), "local" | "mixed")
    }

    /// 원격 소스를 스캔하는 모드인지 확인합니다.
    pub fn includes_remote(&self) -> bool {
        matches!(self.mode.as_str(), "remote" | "mixed")
    }

    fn validate(&self) -> Result<(), TailguardError> {
        if !SCAN_MODES.contains(&self.mode.as_str()) {
            return Err(invalid(
                "scan.mode",
                format!("must be one of: {}", SCAN_MODES.join(", ")),
            ));
        }
        if self.interval_secs == 0 {
            return Err(invalid("scan.interval_secs", "must be greater than 0"));
        }
        if self.remote_read_timeout_secs == 0 {
            return Err(invalid(
                "scan.remote_read_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.sample_limit == 0 {
            return Err(invalid("scan.sample_limit", "must be greater than 0"));
        }
        if let Some(ref file) = self.patterns_file {
            if file.trim().is_empty() {
                return Err(invalid("scan.patterns_file", "must not be empty when set"));
            }
        }
        Ok(())
    }
}

/// 원격 호스트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteHostConfig {
    /// 호스트명 또는 IP
    pub host: String,
    /// SSH 포트
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// 사용자명
    #[serde(default)]
    pub username: String,
    /// 비밀번호 (키 인증 시 생략)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// 개인 키 파일 경로
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_filename: Option<String>,
    /// 이 호스트에서 스캔할 파일 또는 디렉토리 경로
    #[serde(default)]
    pub paths: Vec<String>,
}

impl RemoteHostConfig {
    /// 소스 식별에 사용하는 호스트 레이블 (`host:port`)
    pub fn label(&self) -> String {
        crate::types::remote_host_label(&self.host, self.port)
    }

    /// 세션 캐시 키 (`host:port:username`)
    pub fn session_key(&self) -> String {
        format!("{}:{}:{}", self.host, self.port, self.username)
    }

    fn validate(&self, idx: usize) -> Result<(), TailguardError> {
        if self.host.trim().is_empty() {
            return Err(invalid(
                &format!("remote_hosts[{idx}].host"),
                "host must not be empty",
            ));
        }
        if self.port == 0 {
            return Err(invalid(
                &format!("remote_hosts[{idx}].port"),
                "must be greater than 0",
            ));
        }
        if self.paths.is_empty() {
            return Err(invalid(
                &format!("remote_hosts[{idx}].paths"),
                format!("host '{}' has no paths to scan", self.host),
            ));
        }
        Ok(())
    }
}

fn default_ssh_port() -> u16 {
    22
}

/// 카테고리 하나와 그 패턴 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// 카테고리 이름
    pub category: String,
    /// 정규식 목록 (대소문자 무시, 순서대로 평가)
    pub patterns: Vec<String>,
}

impl CategoryConfig {
    /// 새 카테고리 설정을 생성합니다.
    pub fn new(category: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            category: category.into(),
            patterns: patterns.iter().map(|p| (*p).to_owned()).collect(),
        }
    }
}

/// 기본 패턴 세트 (sshd/pam 인증 실패, 크래시, 의심 활동)
pub fn default_patterns() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new(
            "FAILED_LOGIN",
            &[
                r"Failed password for (invalid user )?\w+ from (?P<ip>\d+\.\d+\.\d+\.\d+)",
                r"Invalid user \w+ from (?P<ip>\d+\.\d+\.\d+\.\d+)",
                r"authentication failure;.*rhost=(?P<ip>\d+\.\d+\.\d+\.\d+)",
            ],
        ),
        CategoryConfig::new(
            "CRASH",
            &[
                r"\bsegfault\b|\bsegmentation fault\b",
                r"\bkernel panic\b",
                r"Traceback \(most recent call last\):",
                r"\bCRITICAL\b.*\berror\b",
                r"service .* (crashed|exited with code \d+)",
            ],
        ),
        CategoryConfig::new(
            "SUSPICIOUS",
            &[
                r"DROP .* IN=(?P<iface>\w+) .* SRC=(?P<ip>\d+\.\d+\.\d+\.\d+)",
                r#"(\b('|")?\s*or\s+1=1\b)|(\bunion\b.*\bselect\b)"#,
                r"(\.\./){2,}",
                r"\b403\b|\b401\b|\b404\b .* from (?P<ip>\d+\.\d+\.\d+\.\d+)",
            ],
        ),
    ]
}

/// 기본 임계값
pub fn default_thresholds() -> BTreeMap<String, u64> {
    BTreeMap::from([
        ("FAILED_LOGIN".to_owned(), 5),
        ("CRASH".to_owned(), 1),
        ("SUSPICIOUS".to_owned(), 3),
    ])
}

/// 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite 데이터베이스 경로
    pub sqlite_path: String,
    /// CSV 미러 경로 (빈 문자열이면 비활성화)
    pub csv_path: String,
    /// VACUUM/ANALYZE 주기 (시간, 0이면 비활성화)
    pub maintenance_interval_hours: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "./data/events.db".to_owned(),
            csv_path: "./data/events.csv".to_owned(),
            maintenance_interval_hours: 24,
        }
    }
}

/// 알림 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// 로그 채널 활성화 여부 (알림 본문을 warn 로그로 남김)
    pub log_enabled: bool,
    /// 이메일 채널
    pub email: EmailConfig,
    /// 웹훅 채널 (Slack Incoming Webhook 호환)
    pub webhook: WebhookConfig,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            log_enabled: true,
            email: EmailConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl AlertsConfig {
    fn validate(&self) -> Result<(), TailguardError> {
        if self.webhook.enabled {
            if self.webhook.url.trim().is_empty() {
                return Err(invalid(
                    "alerts.webhook.url",
                    "url must not be empty when webhook is enabled",
                ));
            }
            if self.webhook.timeout_secs == 0 {
                return Err(invalid(
                    "alerts.webhook.timeout_secs",
                    "must be greater than 0",
                ));
            }
        }

        if self.email.enabled {
            if self.email.smtp_host.trim().is_empty() {
                return Err(invalid(
                    "alerts.email.smtp_host",
                    "smtp_host must not be empty when email is enabled",
                ));
            }
            if self.email.from.trim().is_empty() {
                return Err(invalid(
                    "alerts.email.from",
                    "from must not be empty when email is enabled",
                ));
            }
            if self.email.to.is_empty() {
                return Err(invalid(
                    "alerts.email.to",
                    "at least one recipient is required when email is enabled",
                ));
            }
        }

        Ok(())
    }
}

/// 이메일(SMTP) 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// SMTP 서버 호스트
    pub smtp_host: String,
    /// SMTP 서버 포트
    pub smtp_port: u16,
    /// 발신 주소
    pub from: String,
    /// 수신 주소 목록
    pub to: Vec<String>,
    /// SMTP 사용자명
    pub username: String,
    /// SMTP 비밀번호 (환경변수로 주입 권장)
    pub password: String,
    /// STARTTLS 사용 여부
    pub use_tls: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            from: String::new(),
            to: Vec::new(),
            username: String::new(),
            password: String::new(),
            use_tls: true,
        }
    }
}

/// 웹훅 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 웹훅 URL
    pub url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout_secs: 10,
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9187,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.is_empty() { None } else { Some(val) };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = TailguardConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.scan.mode, "local");
        assert_eq!(config.scan.interval_secs, 10);
        assert_eq!(config.scan.sample_limit, 5);
        assert_eq!(config.patterns.len(), 3);
        assert_eq!(config.thresholds.get("CRASH"), Some(&1));
        assert!(config.alerts.log_enabled);
        assert!(!config.alerts.webhook.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        TailguardConfig::default().validate().unwrap();
    }

    #[test]
    fn default_pattern_order_is_stable() {
        let names: Vec<_> = default_patterns()
            .into_iter()
            .map(|c| c.category)
            .collect();
        assert_eq!(names, vec!["FAILED_LOGIN", "CRASH", "SUSPICIOUS"]);
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = TailguardConfig::parse("").unwrap();
        assert_eq!(config.scan.filename_globs, vec!["*.log", "*.out", "*.txt"]);
        assert_eq!(config.patterns, default_patterns());
    }

    #[test]
    fn parse_patterns_preserves_array_order() {
        let toml = r#"
[[patterns]]
category = "ZETA"
patterns = ["z"]

[[patterns]]
category = "ALPHA"
patterns = ["a", "b"]
"#;
        let config = TailguardConfig::parse(toml).unwrap();
        assert_eq!(config.patterns[0].category, "ZETA");
        assert_eq!(config.patterns[1].category, "ALPHA");
        assert_eq!(config.patterns[1].patterns, vec!["a", "b"]);
    }

    #[test]
    fn parse_remote_hosts_with_default_port() {
        let toml = r#"
[scan]
mode = "mixed"

[[remote_hosts]]
host = "web-01"
username = "ubuntu"
key_filename = "/home/me/.ssh/id_ed25519"
paths = ["/var/log/auth.log"]
"#;
        let config = TailguardConfig::parse(toml).unwrap();
        assert_eq!(config.remote_hosts.len(), 1);
        assert_eq!(config.remote_hosts[0].port, 22);
        assert_eq!(config.remote_hosts[0].label(), "web-01:22");
        assert_eq!(config.remote_hosts[0].session_key(), "web-01:22:ubuntu");
        config.validate().unwrap();
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = TailguardConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            TailguardError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = TailguardConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_unknown_mode() {
        let mut config = TailguardConfig::default();
        config.scan.mode = "cloud".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scan.mode"));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = TailguardConfig::default();
        config.scan.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let mut config = TailguardConfig::default();
        config.thresholds.insert("CRASH".to_owned(), 0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("thresholds.CRASH"));
    }

    #[test]
    fn validate_rejects_duplicate_category() {
        let mut config = TailguardConfig::default();
        config.patterns.push(CategoryConfig::new("CRASH", &["boom"]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate category"));
    }

    #[test]
    fn validate_rejects_category_without_patterns() {
        let mut config = TailguardConfig::default();
        config.patterns.push(CategoryConfig::new("EMPTY", &[]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_skips_inline_patterns_when_file_is_set() {
        let mut config = TailguardConfig::default();
        config.patterns.clear();
        config.scan.patterns_file = Some("/etc/tailguard/patterns.yml".to_owned());
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_remote_host_without_paths_in_remote_mode() {
        let mut config = TailguardConfig::default();
        config.scan.mode = "remote".to_owned();
        config.remote_hosts.push(RemoteHostConfig {
            host: "db-01".to_owned(),
            port: 22,
            username: "ops".to_owned(),
            password: None,
            key_filename: None,
            paths: vec![],
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("paths"));
    }

    #[test]
    fn validate_rejects_enabled_webhook_without_url() {
        let mut config = TailguardConfig::default();
        config.alerts.webhook.enabled = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alerts.webhook.url"));
    }

    #[test]
    fn validate_rejects_enabled_email_without_recipients() {
        let mut config = TailguardConfig::default();
        config.alerts.email.enabled = true;
        config.alerts.email.smtp_host = "smtp.example.com".to_owned();
        config.alerts.email.from = "tailguard@example.com".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alerts.email.to"));
    }

    #[test]
    fn mode_helpers() {
        let mut scan = ScanConfig::default();
        assert!(scan.includes_local());
        assert!(!scan.includes_remote());
        scan.mode = "mixed".to_owned();
        assert!(scan.includes_local());
        assert!(scan.includes_remote());
        scan.mode = "remote".to_owned();
        assert!(!scan.includes_local());
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_TAILGUARD_STR", "overridden") };
        override_string(&mut val, "TEST_TAILGUARD_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_TAILGUARD_STR") };
    }

    #[test]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_TAILGUARD_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_TAILGUARD_BOOL_BAD");
        assert!(!val);
        unsafe { std::env::remove_var("TEST_TAILGUARD_BOOL_BAD") };
    }

    #[test]
    fn env_override_csv_drops_empty_items() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_TAILGUARD_CSV", "x, y,, z") };
        override_csv(&mut val, "TEST_TAILGUARD_CSV");
        assert_eq!(val, vec!["x", "y", "z"]);
        unsafe { std::env::remove_var("TEST_TAILGUARD_CSV") };
    }

    #[test]
    fn env_override_opt_string_empty_clears() {
        let mut val = Some("patterns.yml".to_owned());
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_TAILGUARD_OPT", "") };
        override_opt_string(&mut val, "TEST_TAILGUARD_OPT");
        assert!(val.is_none());
        unsafe { std::env::remove_var("TEST_TAILGUARD_OPT") };
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = TailguardConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = TailguardConfig::parse(&toml_str).unwrap();
        assert_eq!(config.scan.local_paths, parsed.scan.local_paths);
        assert_eq!(config.patterns, parsed.patterns);
        assert_eq!(config.thresholds, parsed.thresholds);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = TailguardConfig::from_file("/nonexistent/path/tailguard.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TailguardError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
