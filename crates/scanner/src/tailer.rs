//! 체크포인트 기반 증분 테일러
//!
//! 소스의 현재 메타데이터와 마지막 체크포인트로 재개 위치를 정하고,
//! 그 위치부터 스트림 끝까지 새 라인을 읽습니다.
//!
//! # 재개 위치
//! - `mtime_now >= old.mtime` 이고 `old.offset <= size`: `old.offset`에서 재개
//! - 그 외 (크기 축소, mtime 역행): 로테이션/트렁케이션으로 보고 0부터 다시 읽음
//!
//! # 읽기
//! 바이트를 줄 단위로 나누고 UTF-8로 관대하게 디코딩합니다 (잘못된 바이트는 대체).
//! 새 오프셋은 스트림 끝 위치이며, 개행으로 끝나지 않은 마지막 조각도 소비된 것으로 봅니다.
//!
//! 테일러는 체크포인트를 저장하지 않습니다. 저장은 이벤트가 기록된 뒤
//! 호출자가 수행합니다.

use std::io::{BufRead, BufReader, Seek, SeekFrom};

use tailguard_core::types::{Checkpoint, SourceId, SourceMetadata};

use crate::error::ScannerError;
use crate::source::SourceReader;

/// 파일이 사라졌을 때의 `SourceUnavailable` 사유
pub const VANISHED_REASON: &str = "source no longer exists";

/// 한 번의 테일 결과
#[derive(Debug, Clone, PartialEq)]
pub struct TailOutcome {
    /// 새 라인 (줄바꿈 제거, 파일 순서)
    pub lines: Vec<String>,
    /// 저장할 새 체크포인트
    pub checkpoint: Checkpoint,
    /// 실제 읽기를 시작한 위치
    pub start_offset: u64,
    /// 이번 읽기 전 체크포인트의 오프셋
    pub previous_offset: u64,
    /// 읽은 바이트 수
    pub bytes_read: u64,
    /// 로테이션/트렁케이션으로 0부터 다시 읽었는지 여부
    pub rotated: bool,
}

/// 마지막 체크포인트와 현재 메타데이터로 재개 위치를 계산합니다.
pub fn resume_offset(old: Checkpoint, current: &SourceMetadata) -> u64 {
    if current.mtime >= old.mtime && old.offset <= current.size {
        old.offset
    } else {
        0
    }
}

/// 소스 하나를 체크포인트부터 끝까지 읽습니다.
///
/// # Errors
/// - [`ScannerError::SourceUnavailable`]: stat 또는 open 실패. 체크포인트를 바꾸지 않습니다.
/// - [`ScannerError::SourceReadInterrupted`]: seek/read 도중 실패. 부분 결과는 버립니다.
pub fn tail(
    reader: &dyn SourceReader,
    path: &str,
    previous: Checkpoint,
) -> Result<TailOutcome, ScannerError> {
    let source = reader.source_id(path);

    let meta = reader.stat(path).map_err(|e| unavailable(&source, e))?;
    let start = resume_offset(previous, &meta);
    let rotated = start != previous.offset;

    let mut file = reader.open(path).map_err(|e| unavailable(&source, e))?;
    file.seek(SeekFrom::Start(start))
        .map_err(|e| interrupted(&source, e))?;

    let mut buffered = BufReader::new(file);
    let mut lines = Vec::new();
    let mut raw = Vec::new();
    let mut consumed: u64 = 0;

    loop {
        raw.clear();
        let n = buffered
            .read_until(b'\n', &mut raw)
            .map_err(|e| interrupted(&source, e))?;
        if n == 0 {
            break;
        }
        consumed += n as u64;

        let text = String::from_utf8_lossy(&raw);
        lines.push(text.trim_end_matches(['\n', '\r']).to_owned());
    }

    Ok(TailOutcome {
        lines,
        checkpoint: Checkpoint::new(start + consumed, meta.mtime),
        start_offset: start,
        previous_offset: previous.offset,
        bytes_read: consumed,
        rotated,
    })
}

fn unavailable(source: &SourceId, err: std::io::Error) -> ScannerError {
    let reason = if err.kind() == std::io::ErrorKind::NotFound {
        VANISHED_REASON.to_owned()
    } else {
        err.to_string()
    };
    ScannerError::SourceUnavailable {
        source_id: source.to_string(),
        reason,
    }
}

fn interrupted(source: &SourceId, err: std::io::Error) -> ScannerError {
    ScannerError::SourceReadInterrupted {
        source_id: source.to_string(),
        reason: err.to_string(),
    }
}
