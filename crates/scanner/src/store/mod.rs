//! 저장소 구현: 체크포인트/이벤트 저장소
//!
//! - [`MemoryStore`]: 인메모리 구현 (테스트, `--dry-run`)
//! - [`SqliteStore`]: SQLite 구현 (WAL, 트랜잭션 단위 추가)
//! - [`CsvMirror`]: 추가된 이벤트의 CSV 사본

pub mod csv_mirror;
pub mod memory;
pub mod sqlite;

pub use csv_mirror::CsvMirror;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
