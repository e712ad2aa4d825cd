//! 소스 리더: 로컬 파일과 원격 파일을 동일한 방식으로 다루는 추상화
//!
//! [`SourceReader`]는 한 호스트의 파일들에 대한 stat/open/목록 조회를 제공합니다.
//! 테일러는 이 trait만 사용하므로 로컬과 원격의 읽기 경로가 같습니다.
//!
//! - [`local`]: 로컬 파일시스템 리더
//! - [`remote`]: 원격 세션 풀과 커넥터
//! - [`discovery`]: 디렉토리/글롭 확장

pub mod discovery;
pub mod local;
pub mod remote;

use std::io::{self, Read, Seek};
use std::time::{SystemTime, UNIX_EPOCH};

use tailguard_core::types::{SourceId, SourceMetadata};

pub use discovery::{FilenameFilter, expand_local_paths, expand_remote_paths};
pub use local::LocalReader;
pub use remote::{Connector, SessionPool};
#[cfg(feature = "sftp")]
pub use remote::SftpConnector;

/// 위치 이동이 가능한 바이트 스트림
pub trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send + ?Sized> SeekRead for T {}

/// 한 호스트의 파일에 대한 읽기 접근
pub trait SourceReader: Send + Sync {
    /// 소스 식별에 사용하는 호스트 레이블 (`localhost` 또는 `host:port`)
    fn host_label(&self) -> &str;

    /// 파일 크기와 수정 시각을 조회합니다.
    fn stat(&self, path: &str) -> io::Result<SourceMetadata>;

    /// 파일을 읽기 전용으로 엽니다.
    fn open(&self, path: &str) -> io::Result<Box<dyn SeekRead>>;

    /// 경로가 디렉토리인지 확인합니다.
    fn is_dir(&self, path: &str) -> io::Result<bool>;

    /// 디렉토리 바로 아래의 일반 파일 경로를 반환합니다 (비재귀).
    fn list_dir(&self, path: &str) -> io::Result<Vec<String>>;

    /// 경로에 대한 소스 식별자를 만듭니다.
    fn source_id(&self, path: &str) -> SourceId {
        SourceId::new(self.host_label(), path)
    }
}

/// `SystemTime`을 epoch 초(소수부 포함)로 변환합니다.
///
/// epoch 이전 시각은 0으로 취급합니다.
pub(crate) fn epoch_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn epoch_seconds_keeps_fraction() {
        let t = UNIX_EPOCH + Duration::from_millis(1_500);
        assert!((epoch_seconds(t) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn epoch_seconds_before_epoch_is_zero() {
        let t = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(epoch_seconds(t), 0.0);
    }
}
