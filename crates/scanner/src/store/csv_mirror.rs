//! CSV 미러: 추가된 이벤트를 사람이 읽기 쉬운 CSV 파일에도 기록합니다.
//!
//! 미러 실패는 이벤트 저장 실패가 아닙니다. 호출자가 경고만 남깁니다.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tailguard_core::error::StorageError;
use tailguard_core::event::IncidentEvent;

/// CSV 헤더
pub const CSV_HEADER: [&str; 6] = ["ts_utc", "host", "filepath", "category", "pattern", "line"];

/// CSV 미러 파일
#[derive(Debug, Clone)]
pub struct CsvMirror {
    path: PathBuf,
}

impl CsvMirror {
    /// 미러 경로를 지정합니다. 파일은 첫 기록 시 생성됩니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 미러 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 이벤트를 파일 끝에 추가합니다. 새 파일이면 헤더를 먼저 씁니다.
    pub fn append(&self, events: &[IncidentEvent]) -> Result<(), StorageError> {
        if events.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(mirror_err)?;
        }

        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(mirror_err)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(CSV_HEADER).map_err(mirror_err)?;
        }

        for event in events {
            writer
                .write_record([
                    event.timestamp_display().as_str(),
                    event.host.as_str(),
                    event.filepath.as_str(),
                    event.category.as_str(),
                    event.pattern.as_str(),
                    event.line.as_str(),
                ])
                .map_err(mirror_err)?;
        }

        writer.flush().map_err(mirror_err)?;
        Ok(())
    }
}

fn mirror_err(err: impl std::fmt::Display) -> StorageError {
    StorageError::Mirror(err.to_string())
}
