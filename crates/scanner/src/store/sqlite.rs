//! SQLite 저장소
//!
//! 스키마:
//! - `files(id, host, path)`: 소스 식별자, `(host, path)` 유일
//! - `checkpoints(file_id, byte_offset, mtime)`: 소스별 진행 위치
//! - `events(id, ts_utc, host, filepath, category, pattern, line)`: 분류된 이벤트
//!
//! WAL 모드로 열며 이벤트 추가는 배치 단위 트랜잭션입니다.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use tailguard_core::config::StorageConfig;
use tailguard_core::error::StorageError;
use tailguard_core::event::IncidentEvent;
use tailguard_core::pipeline::{CheckpointStore, EventStore};
use tailguard_core::types::{Checkpoint, SourceId};

use super::CsvMirror;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    host TEXT NOT NULL,
    path TEXT NOT NULL,
    UNIQUE(host, path)
);

CREATE TABLE IF NOT EXISTS checkpoints (
    file_id INTEGER PRIMARY KEY REFERENCES files(id),
    byte_offset INTEGER NOT NULL,
    mtime REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts_utc TEXT NOT NULL,
    host TEXT NOT NULL,
    filepath TEXT NOT NULL,
    category TEXT NOT NULL,
    pattern TEXT NOT NULL,
    line TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_ts ON events(ts_utc);
CREATE INDEX IF NOT EXISTS idx_events_category ON events(category);
";

/// SQLite 기반 체크포인트/이벤트 저장소
pub struct SqliteStore {
    conn: Mutex<Connection>,
    mirror: Option<CsvMirror>,
}

impl SqliteStore {
    /// 파일 데이터베이스를 엽니다. 상위 디렉토리가 없으면 생성합니다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Connection(format!(
                    "failed to create dir {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            StorageError::Connection(format!("failed to open {}: {e}", path.display()))
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(query_err)?;

        tracing::debug!(path = %path.display(), "opened sqlite store");
        Self::with_connection(conn)
    }

    /// 인메모리 데이터베이스를 엽니다.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StorageError::Connection(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// 설정으로 저장소를 엽니다. `csv_path`가 비어 있지 않으면 CSV 미러를 붙입니다.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let store = Self::open(&config.sqlite_path)?;
        if config.csv_path.trim().is_empty() {
            Ok(store)
        } else {
            Ok(store.with_csv_mirror(CsvMirror::new(&config.csv_path)))
        }
    }

    /// CSV 미러를 설정합니다.
    pub fn with_csv_mirror(mut self, mirror: CsvMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA).map_err(query_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
            mirror: None,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    /// 저장된 이벤트 수
    pub fn event_count(&self) -> Result<u64, StorageError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .map_err(query_err)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// 카테고리별 저장된 이벤트 수
    pub fn count_by_category(&self, category: &str) -> Result<u64, StorageError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM events WHERE category = ?1",
                params![category],
                |row| row.get(0),
            )
            .map_err(query_err)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// VACUUM/ANALYZE를 실행합니다.
    pub fn maintenance(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute_batch("VACUUM; ANALYZE;").map_err(query_err)?;
        tracing::info!("sqlite maintenance completed");
        Ok(())
    }
}

fn query_err(err: rusqlite::Error) -> StorageError {
    StorageError::Query(err.to_string())
}

fn to_i64(value: u64, field: &str) -> Result<i64, StorageError> {
    i64::try_from(value).map_err(|_| StorageError::Query(format!("{field} out of range: {value}")))
}

impl CheckpointStore for SqliteStore {
    fn get(&self, source: &SourceId) -> Result<Checkpoint, StorageError> {
        let conn = self.lock()?;
        let row: Option<(i64, f64)> = conn
            .query_row(
                "SELECT c.byte_offset, c.mtime
                 FROM checkpoints c JOIN files f ON f.id = c.file_id
                 WHERE f.host = ?1 AND f.path = ?2",
                params![source.host, source.path],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(query_err)?;

        Ok(row
            .map(|(offset, mtime)| Checkpoint::new(u64::try_from(offset).unwrap_or_default(), mtime))
            .unwrap_or_default())
    }

    fn set(&self, source: &SourceId, checkpoint: Checkpoint) -> Result<(), StorageError> {
        let offset = to_i64(checkpoint.offset, "offset")?;
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(query_err)?;

        tx.execute(
            "INSERT OR IGNORE INTO files(host, path) VALUES (?1, ?2)",
            params![source.host, source.path],
        )
        .map_err(query_err)?;
        let file_id: i64 = tx
            .query_row(
                "SELECT id FROM files WHERE host = ?1 AND path = ?2",
                params![source.host, source.path],
                |row| row.get(0),
            )
            .map_err(query_err)?;
        tx.execute(
            "INSERT INTO checkpoints(file_id, byte_offset, mtime) VALUES (?1, ?2, ?3)
             ON CONFLICT(file_id) DO UPDATE SET byte_offset = excluded.byte_offset, mtime = excluded.mtime",
            params![file_id, offset, checkpoint.mtime],
        )
        .map_err(query_err)?;

        tx.commit().map_err(query_err)
    }
}

impl EventStore for SqliteStore {
    fn append_many(&self, events: &[IncidentEvent]) -> Result<(), StorageError> {
        if events.is_empty() {
            return Ok(());
        }

        {
            let mut conn = self.lock()?;
            let tx = conn.transaction().map_err(query_err)?;
            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT INTO events(ts_utc, host, filepath, category, pattern, line)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    )
                    .map_err(query_err)?;
                for event in events {
                    stmt.execute(params![
                        event.timestamp.to_rfc3339(),
                        event.host,
                        event.filepath,
                        event.category.as_str(),
                        event.pattern,
                        event.line,
                    ])
                    .map_err(query_err)?;
                }
            }
            tx.commit().map_err(query_err)?;
        }

        if let Some(ref mirror) = self.mirror {
            if let Err(e) = mirror.append(events) {
                tracing::warn!(
                    path = %mirror.path().display(),
                    error = %e,
                    "csv mirror append failed"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tailguard_core::types::Category;

    fn sample_events(source: &SourceId, n: usize) -> Vec<IncidentEvent> {
        (0..n)
            .map(|i| {
                IncidentEvent::new(
                    source,
                    Category::new("FAILED_LOGIN"),
                    "Invalid user",
                    format!("Invalid user u{i} from 10.0.0.{i}"),
                )
            })
            .collect()
    }

    #[test]
    fn missing_checkpoint_is_default() {
        let store = SqliteStore::open_in_memory().unwrap();
        let cp = store.get(&SourceId::local("/var/log/auth.log")).unwrap();
        assert_eq!(cp, Checkpoint::default());
    }

    #[test]
    fn checkpoint_upsert_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = SourceId::remote("db-01", 22, "/var/log/syslog");

        store.set(&id, Checkpoint::new(100, 1.5)).unwrap();
        store.set(&id, Checkpoint::new(250, 2.5)).unwrap();

        assert_eq!(store.get(&id).unwrap(), Checkpoint::new(250, 2.5));
    }

    #[test]
    fn checkpoints_are_keyed_by_host_and_path() {
        let store = SqliteStore::open_in_memory().unwrap();
        let local = SourceId::local("/var/log/syslog");
        let remote = SourceId::remote("web-01", 22, "/var/log/syslog");

        store.set(&local, Checkpoint::new(10, 1.0)).unwrap();
        store.set(&remote, Checkpoint::new(20, 1.0)).unwrap();

        assert_eq!(store.get(&local).unwrap().offset, 10);
        assert_eq!(store.get(&remote).unwrap().offset, 20);
    }

    #[test]
    fn append_many_and_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = SourceId::local("/var/log/auth.log");
        store.append_many(&sample_events(&id, 4)).unwrap();
        store.append_many(&[]).unwrap();

        assert_eq!(store.event_count().unwrap(), 4);
        assert_eq!(store.count_by_category("FAILED_LOGIN").unwrap(), 4);
        assert_eq!(store.count_by_category("CRASH").unwrap(), 0);
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.db");
        let id = SourceId::local("/var/log/auth.log");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set(&id, Checkpoint::new(4096, 7.25)).unwrap();
            store.append_many(&sample_events(&id, 2)).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get(&id).unwrap(), Checkpoint::new(4096, 7.25));
        assert_eq!(reopened.event_count().unwrap(), 2);
    }

    #[test]
    fn mirror_receives_appended_events() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            sqlite_path: dir.path().join("events.db").display().to_string(),
            csv_path: dir.path().join("events.csv").display().to_string(),
            maintenance_interval_hours: 24,
        };
        let store = SqliteStore::from_config(&config).unwrap();
        let id = SourceId::local("/var/log/auth.log");
        store.append_many(&sample_events(&id, 3)).unwrap();

        let csv = std::fs::read_to_string(&config.csv_path).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn maintenance_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("events.db")).unwrap();
        store
            .append_many(&sample_events(&SourceId::local("/a.log"), 1))
            .unwrap();
        store.maintenance().unwrap();
        assert_eq!(store.event_count().unwrap(), 1);
    }
}
