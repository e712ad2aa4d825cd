//! 소스 탐색: 설정된 경로를 실제 파일 목록으로 확장합니다.
//!
//! 로컬 디렉토리는 `walkdir`로 재귀 탐색하고(파일명 정렬), 원격 디렉토리는
//! [`SourceReader::list_dir`]로 한 단계만 나열합니다. 두 경우 모두 파일명이
//! 설정된 글롭 중 하나와 일치하는 파일만 포함합니다.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::SourceReader;
use crate::error::ScannerError;

/// 파일명 글롭 필터
///
/// 글롭 목록이 비어 있으면 모든 파일을 허용합니다.
#[derive(Debug, Clone, Default)]
pub struct FilenameFilter {
    patterns: Vec<glob::Pattern>,
}

impl FilenameFilter {
    /// 글롭 문자열 목록에서 필터를 생성합니다.
    pub fn new(globs: &[String]) -> Result<Self, ScannerError> {
        let patterns = globs
            .iter()
            .map(|g| {
                glob::Pattern::new(g).map_err(|e| ScannerError::Config {
                    field: "filename_globs".to_owned(),
                    reason: format!("invalid glob '{g}': {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// 파일명이 글롭 중 하나와 일치하는지 확인합니다.
    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(file_name))
    }

    fn matches_path(&self, path: &str) -> bool {
        Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.matches(name))
    }
}

/// 로컬 경로 목록을 파일 목록으로 확장합니다.
///
/// - 디렉토리: 재귀 탐색, 글롭과 일치하는 파일만 포함
/// - 그 외 경로: 그대로 포함
/// - 존재하지 않는 경로는 조용히 제외
/// - 중복은 처음 등장한 순서를 유지하며 제거
pub fn expand_local_paths(paths: &[String], filter: &FilenameFilter) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for path in paths {
        let p = Path::new(path);
        if p.is_dir() {
            let walker = WalkDir::new(p)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        debug!(path = %path, error = %e, "skipping unreadable directory entry");
                        None
                    }
                });

            for entry in walker {
                if !entry.file_type().is_file() {
                    continue;
                }
                let matched = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| filter.matches(name));
                if matched {
                    let found = entry.path().display().to_string();
                    if seen.insert(found.clone()) {
                        files.push(found);
                    }
                }
            }
        } else if p.exists() {
            if seen.insert(path.clone()) {
                files.push(path.clone());
            }
        } else {
            debug!(path = %path, "configured local path does not exist, skipping");
        }
    }

    files
}

/// 원격 호스트의 경로 목록을 파일 목록으로 확장합니다.
///
/// 디렉토리로 보고된 경로는 한 단계만 나열하고 글롭으로 거릅니다.
/// stat할 수 없는 경로는 그대로 두어 테일러가 `SourceUnavailable`로 처리하게 합니다.
pub fn expand_remote_paths(
    reader: &dyn SourceReader,
    paths: &[String],
    filter: &FilenameFilter,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for path in paths {
        let listed = match reader.is_dir(path) {
            Ok(true) => match reader.list_dir(path) {
                Ok(entries) => entries
                    .into_iter()
                    .filter(|entry| filter.matches_path(entry))
                    .collect(),
                Err(e) => {
                    debug!(
                        host = reader.host_label(),
                        path = %path,
                        error = %e,
                        "failed to list remote directory"
                    );
                    Vec::new()
                }
            },
            Ok(false) | Err(_) => vec![path.clone()],
        };

        for file in listed {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }

    files
}
