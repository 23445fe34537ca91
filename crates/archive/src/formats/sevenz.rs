//! 7z 어댑터
//!
//! 헤더의 파일 목록으로 후보를 나열하고, 콘텐츠는 디코더를 처음부터 돌려
//! 대상 엔트리에 도달했을 때 읽습니다. solid 블록 때문에 엔트리 하나를 읽으려면
//! 앞선 엔트리를 모두 풀어야 하므로 엔트리당 비용은 아카이브 크기에 비례합니다.
//! 엔트리 단위 실패는 복구 가능한 에러입니다.

use std::fs::File;
use std::io;
use std::path::Path;

use sevenz_rust::{Password, SevenZReader};

use crate::error::{ArchiveError, SourceError};
use crate::formats::{Candidate, EntrySource, Sniffed, read_sniffed};

#[derive(Debug, Clone)]
struct EntryMeta {
    name: String,
    size: u64,
    is_dir: bool,
}

/// 7z 어댑터
pub struct SevenZSource {
    reader: SevenZReader<File>,
    entries: Vec<EntryMeta>,
    next_index: usize,
}

impl SevenZSource {
    /// 파일 경로로 7z를 엽니다. 암호화된 헤더는 지원하지 않습니다.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let reader = SevenZReader::open(path, Password::empty()).map_err(|e| ArchiveError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let entries = reader
            .archive()
            .files
            .iter()
            .map(|f| EntryMeta {
                name: f.name.clone(),
                size: f.size,
                is_dir: f.is_directory,
            })
            .collect();

        Ok(Self {
            reader,
            entries,
            next_index: 0,
        })
    }

    /// 헤더에 기록된 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 엔트리가 없는지
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 같은 이름을 가진 앞선 파일 엔트리의 수 (디코딩 순서에서 대상을 구분하는 데 사용)
    fn ordinal_of(&self, index: usize) -> usize {
        let name = &self.entries[index].name;
        self.entries[..index]
            .iter()
            .filter(|e| !e.is_dir && e.name == *name)
            .count()
    }
}

impl EntrySource for SevenZSource {
    fn next_candidate(&mut self) -> Result<Option<Candidate>, SourceError> {
        let Some(meta) = self.entries.get(self.next_index) else {
            return Ok(None);
        };
        let candidate = Candidate {
            name: meta.name.clone(),
            size: meta.size,
            is_file: !meta.is_dir,
            index: self.next_index,
        };
        self.next_index += 1;
        Ok(Some(candidate))
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

        if candidate.index >= self.entries.len() {
            return Err(entry_error("entry index out of range".to_owned()));
        }
        let target = self.entries[candidate.index].name.clone();
        let ordinal = self.ordinal_of(candidate.index);

        let mut seen = 0usize;
        let mut outcome: Option<io::Result<Sniffed>> = None;
        let decoded = self.reader.for_each_entries(|entry, rd| {
            if entry.is_directory || entry.name != target {
                // 다음 엔트리를 위해 현재 스트림을 끝까지 소비
                if let Err(e) = io::copy(rd, &mut io::sink()) {
                    outcome = Some(Err(e));
                    return Ok(false);
                }
                return Ok(true);
            }
            if seen < ordinal {
                seen += 1;
                if let Err(e) = io::copy(rd, &mut io::sink()) {
                    outcome = Some(Err(e));
                    return Ok(false);
                }
                return Ok(true);
            }
            outcome = Some(read_sniffed(rd, limit));
            Ok(false)
        });

        if let Err(e) = decoded {
            return Err(entry_error(e.to_string()));
        }
        match outcome {
            Some(Ok(sniffed)) => Ok(sniffed),
            Some(Err(e)) => Err(entry_error(e.to_string())),
            None => Err(entry_error("entry not found in decoded stream".to_owned())),
        }
    }
}
