//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 모든 크레이트가 공유하는 데이터 구조를 정의합니다.
//! 소스 식별자, 체크포인트, 파일 메타데이터, 인시던트 카테고리가 여기에 속합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 로컬 파일 소스의 호스트 레이블
pub const LOCAL_HOST: &str = "localhost";

/// 로그 소스 식별자 `(host, path)`
///
/// 로컬 파일은 `host = "localhost"`, 원격 파일은 `host = "<hostname>:<port>"` 입니다.
/// 처음 관찰될 때 생성되며 삭제되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId {
    /// 호스트 레이블
    pub host: String,
    /// 파일 경로
    pub path: String,
}

impl SourceId {
    /// 임의의 호스트 레이블로 식별자를 생성합니다.
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }

    /// 로컬 파일 식별자를 생성합니다.
    pub fn local(path: impl Into<String>) -> Self {
        Self::new(LOCAL_HOST, path)
    }

    /// 원격 파일 식별자를 생성합니다. 호스트 레이블은 `hostname:port` 입니다.
    pub fn remote(hostname: &str, port: u16, path: impl Into<String>) -> Self {
        Self::new(remote_host_label(hostname, port), path)
    }

    /// 로컬 소스인지 확인합니다.
    pub fn is_local(&self) -> bool {
        self.host == LOCAL_HOST
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.path)
    }
}

/// 원격 호스트 레이블 (`hostname:port`)을 만듭니다.
pub fn remote_host_label(hostname: &str, port: u16) -> String {
    format!("{hostname}:{port}")
}

/// 소스별 진행 위치
///
/// `offset`은 항상 완전히 소비된 위치(라인 경계 또는 마지막 읽기의 스트림 끝)를 가리킵니다.
/// `mtime`은 마지막으로 관찰한 수정 시각(Unix epoch 초, 소수부 포함)입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// 소비된 바이트 위치
    pub offset: u64,
    /// 마지막으로 관찰한 수정 시각 (epoch 초)
    pub mtime: f64,
}

impl Checkpoint {
    /// 새 체크포인트를 생성합니다.
    pub fn new(offset: u64, mtime: f64) -> Self {
        Self { offset, mtime }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset={} mtime={:.3}", self.offset, self.mtime)
    }
}

/// 소스의 현재 메타데이터 (stat 결과)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// 파일 크기 (바이트)
    pub size: u64,
    /// 수정 시각 (epoch 초)
    pub mtime: f64,
}

/// 인시던트 카테고리 (예: `FAILED_LOGIN`, `CRASH`, `SUSPICIOUS`)
///
/// 카테고리 집합은 설정으로 정의되며 프로세스 수명 동안 변하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// 카테고리를 생성합니다.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 카테고리 이름을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_source_uses_localhost_label() {
        let id = SourceId::local("/var/log/auth.log");
        assert!(id.is_local());
        assert_eq!(id.to_string(), "localhost:/var/log/auth.log");
    }

    #[test]
    fn remote_source_label_includes_port() {
        let id = SourceId::remote("web-01", 2222, "/var/log/syslog");
        assert!(!id.is_local());
        assert_eq!(id.host, "web-01:2222");
        assert_eq!(id.to_string(), "web-01:2222:/var/log/syslog");
    }

    #[test]
    fn default_checkpoint_is_origin() {
        let cp = Checkpoint::default();
        assert_eq!(cp.offset, 0);
        assert_eq!(cp.mtime, 0.0);
    }

    #[test]
    fn category_serializes_as_plain_string() {
        let cat = Category::new("CRASH");
        let json = serde_json::to_string(&cat).unwrap();
        assert_eq!(json, "\"CRASH\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cat);
    }
}
