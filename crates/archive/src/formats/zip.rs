//! zip 어댑터
//!
//! 중앙 디렉토리로 엔트리를 인덱스로 접근합니다. 엔트리 하나의 메타데이터나
//! 콘텐츠를 읽지 못해도 다른 엔트리에는 영향이 없으므로 모두 복구 가능한 에러입니다.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{ArchiveError, SourceError};
use crate::formats::{Candidate, EntrySource, Sniffed, open_file, read_sniffed};

/// zip 어댑터
pub struct ZipSource<R> {
    archive: ZipArchive<R>,
    next_index: usize,
}

impl ZipSource<BufReader<File>> {
    /// 파일 경로로 zip을 엽니다.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = open_file(path)?;
        Self::new(BufReader::new(file)).map_err(|e| match e {
            ArchiveError::Open { reason, .. } => ArchiveError::Open {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }
}

impl<R: Read + Seek> ZipSource<R> {
    /// 리더에서 중앙 디렉토리를 읽습니다.
    pub fn new(reader: R) -> Result<Self, ArchiveError> {
        let archive = ZipArchive::new(reader).map_err(|e| ArchiveError::Open {
            path: "<reader>".to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            archive,
            next_index: 0,
        })
    }

    /// 중앙 디렉토리에 기록된 엔트리 수
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// 엔트리가 없는지
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }
}

impl<R: Read + Seek> EntrySource for ZipSource<R> {
    fn next_candidate(&mut self) -> Result<Option<Candidate>, SourceError> {
        if self.next_index >= self.archive.len() {
            return Ok(None);
        }
        let index = self.next_index;
        self.next_index += 1;

        let file = self.archive.by_index_raw(index).map_err(|e| {
            SourceError::Recoverable(ArchiveError::Entry {
                name: format!("#{index}"),
                reason: e.to_string(),
            })
        })?;

        Ok(Some(Candidate {
            name: file.name().to_owned(),
            size: file.size(),
            is_file: !file.is_dir(),
            index,
        }))
    }

    fn read_candidate(
        &mut self,
        candidate: &Candidate,
        limit: u64,
    ) -> Result<Sniffed, SourceError> {
        let entry_error = |reason: String| {
            SourceError::Recoverable(ArchiveError::Entry {
                name: candidate.name.clone(),
                reason,
            })
        };

        let mut file = self
            .archive
            .by_index(candidate.index)
            .map_err(|e| entry_error(e.to_string()))?;
        read_sniffed(&mut file, limit).map_err(|e| entry_error(e.to_string()))
    }
}
