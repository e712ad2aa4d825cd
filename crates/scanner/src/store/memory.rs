//! 인메모리 저장소

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tailguard_core::error::StorageError;
use tailguard_core::event::IncidentEvent;
use tailguard_core::pipeline::{CheckpointStore, EventStore};
use tailguard_core::types::{Checkpoint, SourceId};

/// 프로세스 메모리에만 존재하는 체크포인트/이벤트 저장소
#[derive(Debug, Default)]
pub struct MemoryStore {
    checkpoints: Mutex<HashMap<SourceId, Checkpoint>>,
    events: Mutex<Vec<IncidentEvent>>,
}

impl MemoryStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 이벤트 사본
    pub fn events(&self) -> Result<Vec<IncidentEvent>, StorageError> {
        Ok(lock(&self.events)?.clone())
    }

    /// 저장된 이벤트 수
    pub fn event_count(&self) -> Result<usize, StorageError> {
        Ok(lock(&self.events)?.len())
    }

    /// 체크포인트가 기록된 소스 수
    pub fn source_count(&self) -> Result<usize, StorageError> {
        Ok(lock(&self.checkpoints)?.len())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Poisoned(e.to_string()))
}

impl CheckpointStore for MemoryStore {
    fn get(&self, source: &SourceId) -> Result<Checkpoint, StorageError> {
        Ok(lock(&self.checkpoints)?
            .get(source)
            .copied()
            .unwrap_or_default())
    }

    fn set(&self, source: &SourceId, checkpoint: Checkpoint) -> Result<(), StorageError> {
        lock(&self.checkpoints)?.insert(source.clone(), checkpoint);
        Ok(())
    }
}

impl EventStore for MemoryStore {
    fn append_many(&self, events: &[IncidentEvent]) -> Result<(), StorageError> {
        lock(&self.events)?.extend_from_slice(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tailguard_core::types::Category;

    #[test]
    fn unknown_source_has_default_checkpoint() {
        let store = MemoryStore::new();
        let cp = store.get(&SourceId::local("/var/log/auth.log")).unwrap();
        assert_eq!(cp, Checkpoint::default());
    }

    #[test]
    fn set_then_get_roundtrips() {
        let store = MemoryStore::new();
        let id = SourceId::remote("web-01", 22, "/var/log/syslog");
        store.set(&id, Checkpoint::new(128, 3.5)).unwrap();
        assert_eq!(store.get(&id).unwrap(), Checkpoint::new(128, 3.5));
        assert_eq!(store.source_count().unwrap(), 1);
    }

    #[test]
    fn append_preserves_order() {
        let store = MemoryStore::new();
        let id = SourceId::local("/var/log/app.log");
        let events = vec![
            IncidentEvent::new(&id, Category::new("CRASH"), "p", "first"),
            IncidentEvent::new(&id, Category::new("CRASH"), "p", "second"),
        ];
        store.append_many(&events).unwrap();
        store.append_many(&events[..1]).unwrap();

        let stored = store.events().unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1].line, "second");
    }
}
