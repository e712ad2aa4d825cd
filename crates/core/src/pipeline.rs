//! 파이프라인 trait: 외부 협력자와의 경계 정의
//!
//! 스캐너 코어는 저장소와 알림 채널을 직접 구현하지 않고 이 trait들에만 의존합니다.
//!
//! - [`CheckpointStore`]: 소스별 "어디까지 읽었는가" 저장
//! - [`EventStore`]: 분류된 이벤트의 내구성 있는 추가
//! - [`Notifier`] / [`DynNotifier`]: 알림 전송 채널

use std::future::Future;
use std::pin::Pin;

use crate::error::{NotifyError, StorageError};
use crate::event::IncidentEvent;
use crate::types::{Checkpoint, SourceId};

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 체크포인트 저장소
///
/// 크래시 일관성이 있어야 합니다: 재시작 후 마지막으로 성공한 `set` 값부터 재개합니다.
pub trait CheckpointStore: Send + Sync {
    /// 소스의 체크포인트를 조회합니다. 처음 보는 소스는 `Checkpoint::default()`입니다.
    fn get(&self, source: &SourceId) -> Result<Checkpoint, StorageError>;

    /// 소스의 체크포인트를 기록합니다.
    fn set(&self, source: &SourceId, checkpoint: Checkpoint) -> Result<(), StorageError>;
}

/// 이벤트 저장소
///
/// 중복 제거를 보장하지 않습니다. 재시도로 인한 중복 행은 허용됩니다.
pub trait EventStore: Send + Sync {
    /// 이벤트를 순서대로 추가합니다.
    fn append_many(&self, events: &[IncidentEvent]) -> Result<(), StorageError>;
}

/// 알림 전송 채널
///
/// 실패는 코어에 치명적이지 않으며, 호출자가 로그로만 남깁니다.
pub trait Notifier: Send + Sync {
    /// 채널 이름 (로그/메트릭 레이블)
    fn name(&self) -> &str;

    /// 알림을 전송합니다.
    fn deliver(
        &self,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// dyn-compatible 알림 채널 trait
///
/// `Notifier`는 RPITIT를 사용하므로 `dyn Notifier`가 불가합니다.
/// `DynNotifier`는 `BoxFuture`를 반환하여 `Vec<Box<dyn DynNotifier>>`로
/// 여러 채널을 동적으로 관리할 수 있게 합니다.
pub trait DynNotifier: Send + Sync {
    /// 채널 이름
    fn name(&self) -> &str;

    /// 알림을 전송합니다.
    fn deliver<'a>(&'a self, subject: &'a str, body: &'a str)
    -> BoxFuture<'a, Result<(), NotifyError>>;
}

/// Notifier를 구현한 타입은 자동으로 DynNotifier도 구현됩니다.
impl<T: Notifier> DynNotifier for T {
    fn name(&self) -> &str {
        Notifier::name(self)
    }

    fn deliver<'a>(
        &'a self,
        subject: &'a str,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(Notifier::deliver(self, subject, body))
    }
}
