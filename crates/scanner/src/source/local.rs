//! 로컬 파일시스템 리더

use std::fs::{self, File};
use std::io;

use tailguard_core::types::{LOCAL_HOST, SourceMetadata};

use super::{SeekRead, SourceReader, epoch_seconds};

/// 로컬 파일 리더 (`host = "localhost"`)
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalReader;

impl SourceReader for LocalReader {
    fn host_label(&self) -> &str {
        LOCAL_HOST
    }

    fn stat(&self, path: &str) -> io::Result<SourceMetadata> {
        let meta = fs::metadata(path)?;
        Ok(SourceMetadata {
            size: meta.len(),
            mtime: epoch_seconds(meta.modified()?),
        })
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn SeekRead>> {
        Ok(Box::new(File::open(path)?))
    }

    fn is_dir(&self, path: &str) -> io::Result<bool> {
        Ok(fs::metadata(path)?.is_dir())
    }

    fn list_dir(&self, path: &str) -> io::Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path().display().to_string());
            }
        }
        files.sort();
        Ok(files)
    }
}
