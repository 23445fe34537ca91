//! 아카이브 엔트리 반복자 -- 선읽기(lookahead) 버퍼를 가진 상태 머신
//!
//! # 상태 전이
//!
//! ```text
//! Unopened --open ok--> Buffering --lookahead--> Ready { current, next }
//!    |                                               |
//!    +--open 실패------------------------------> Exhausted <--advance (next 없음) / close()
//! ```
//!
//! 엔트리가 current가 되는 즉시 다음 조건을 만족하는 엔트리를 찾아 `next`에 버퍼링합니다.
//! 따라서 [`ArchiveEntryIterator::has_more`]는 부수 효과 없이 버퍼만 확인합니다.
//! 선읽기가 더 이상 엔트리를 찾지 못하면 컨테이너 핸들을 즉시 놓습니다.
//!
//! 한 번에 메모리에 있는 엔트리는 최대 두 개(current, next)입니다.
//!
//! 목록에서 본 모든 일반 파일 이름은 크기, 이름 조건, 판별 결과와 무관하게 기록되며
//! [`ArchiveEntryIterator::take_listed`]로 가져갈 수 있습니다. 이름만 보는 검사는
//! 이 목록을 사용합니다.

use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use contraband_core::metrics as m;

use crate::detect::ArchiveFormat;
use crate::entry::ArchiveEntry;
use crate::error::{ArchiveError, SourceError};
use crate::filter::EntryFilter;
use crate::formats::{Candidate, EntrySource, FormatSource, Sniffed};

/// 반복자 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IteratorState {
    /// 아직 컨테이너를 열지 않음
    Unopened,
    /// 다음 엔트리를 찾는 중
    Buffering,
    /// 현재 엔트리와 선읽기 버퍼
    Ready {
        /// 현재 엔트리 (첫 `advance` 전에는 없음)
        current: Option<ArchiveEntry>,
        /// 다음 엔트리
        next: Option<ArchiveEntry>,
    },
    /// 더 이상 엔트리 없음 (핸들 해제됨)
    Exhausted,
}

/// 반복이 끝난 이유
#[derive(Debug)]
pub enum Termination {
    /// 컨테이너 끝까지 읽음
    Completed,
    /// 컨테이너를 열지 못함 (엔트리 0개)
    OpenFailed(ArchiveError),
    /// 순차 스트림 손상으로 중단 (이전 엔트리는 유효)
    Truncated(ArchiveError),
    /// 호출자가 `close()`로 중단
    Closed,
}

impl Termination {
    /// 정상 종료 여부 (`Completed` 또는 `Closed`)
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }
}

/// 읽지 못하고 건너뛴 엔트리
#[derive(Debug)]
pub struct SkippedEntry {
    /// 엔트리 이름 (알 수 없으면 `#index`)
    pub name: String,
    /// 실패 원인
    pub error: ArchiveError,
}

/// 아카이브 엔트리 반복자
///
/// 한 호출자가 `&mut self`로 구동합니다. 컨테이너 핸들은 하나만 가지며
/// `Exhausted`, `close()`, drop 중 가장 먼저 일어나는 시점에 한 번 해제됩니다.
pub struct ArchiveEntryIterator<S: EntrySource = FormatSource> {
    archive_path: PathBuf,
    format: ArchiveFormat,
    filter: EntryFilter,
    source: Option<S>,
    state: IteratorState,
    termination: Option<Termination>,
    skipped: Vec<SkippedEntry>,
    binary_skipped: usize,
    listed: Vec<String>,
}

impl ArchiveEntryIterator<FormatSource> {
    /// 컨테이너를 열고 첫 엔트리를 버퍼링합니다.
    ///
    /// 실패하지 않습니다. 열 수 없는 컨테이너는 엔트리 0개로 끝나며
    /// 에러는 [`open_error`](Self::open_error)로 확인합니다.
    pub fn open(path: impl AsRef<Path>, format: ArchiveFormat, filter: EntryFilter) -> Self {
        let path = path.as_ref();
        let mut iter = Self::unopened(path, format, filter);
        iter.prime(FormatSource::open(path, format));
        iter
    }
}

impl<S: EntrySource> ArchiveEntryIterator<S> {
    /// 이미 열린 어댑터로 반복자를 만듭니다.
    pub fn from_source(
        source: S,
        format: ArchiveFormat,
        archive_path: impl AsRef<Path>,
        filter: EntryFilter,
    ) -> Self {
        let mut iter = Self::unopened(archive_path.as_ref(), format, filter);
        iter.prime(Ok(source));
        iter
    }

    fn unopened(path: &Path, format: ArchiveFormat, filter: EntryFilter) -> Self {
        Self {
            archive_path: path.to_path_buf(),
            format,
            filter,
            source: None,
            state: IteratorState::Unopened,
            termination: None,
            skipped: Vec::new(),
            binary_skipped: 0,
            listed: Vec::new(),
        }
    }

    fn prime(&mut self, opened: Result<S, ArchiveError>) {
        match opened {
            Ok(source) => {
                debug!(
                    archive = %self.archive_path.display(),
                    format = %self.format,
                    "archive opened"
                );
                self.source = Some(source);
                self.state = IteratorState::Buffering;
                match self.fetch_next() {
                    Some(first) => {
                        self.state = IteratorState::Ready {
                            current: None,
                            next: Some(first),
                        };
                    }
                    None => self.state = IteratorState::Exhausted,
                }
            }
            Err(e) => {
                warn!(
                    archive = %self.archive_path.display(),
                    format = %self.format,
                    error = %e,
                    "failed to open archive"
                );
                self.termination = Some(Termination::OpenFailed(e));
                self.state = IteratorState::Exhausted;
            }
        }
    }

    /// 다음 엔트리가 버퍼에 있는지 (부수 효과 없음)
    pub fn has_more(&self) -> bool {
        matches!(self.state, IteratorState::Ready { next: Some(_), .. })
    }

    /// 버퍼된 엔트리를 current로 옮기고 그 다음 엔트리를 선읽기합니다.
    ///
    /// 새 엔트리가 current가 되었으면 `true`.
    pub fn advance(&mut self) -> bool {
        match mem::replace(&mut self.state, IteratorState::Buffering) {
            IteratorState::Ready {
                next: Some(entry), ..
            } => {
                metrics::counter!(m::ARCHIVE_ENTRIES_YIELDED_TOTAL, m::LABEL_FORMAT => self.format.as_str())
                    .increment(1);
                let next = self.fetch_next();
                self.state = IteratorState::Ready {
                    current: Some(entry),
                    next,
                };
                true
            }
            IteratorState::Unopened => {
                self.state = IteratorState::Unopened;
                false
            }
            _ => {
                self.release(Termination::Completed);
                self.state = IteratorState::Exhausted;
                false
            }
        }
    }

    /// 현재 엔트리
    pub fn current(&self) -> Option<&ArchiveEntry> {
        match &self.state {
            IteratorState::Ready { current, .. } => current.as_ref(),
            _ => None,
        }
    }

    /// 현재 상태
    pub fn state(&self) -> &IteratorState {
        &self.state
    }

    /// 반복을 중단하고 컨테이너 핸들을 해제합니다.
    pub fn close(&mut self) {
        self.release(Termination::Closed);
        self.state = IteratorState::Exhausted;
    }

    /// 반복이 끝난 이유 (아직 진행 중이면 `None`)
    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    /// 컨테이너 열기 에러
    pub fn open_error(&self) -> Option<&ArchiveError> {
        match &self.termination {
            Some(Termination::OpenFailed(e)) => Some(e),
            _ => None,
        }
    }

    /// 복구 가능한 에러로 건너뛴 엔트리 수
    pub fn skipped(&self) -> usize {
        self.skipped.len()
    }

    /// 건너뛴 엔트리 목록 (발생 순서)
    pub fn skipped_entries(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// 바이너리로 판별되어 건너뛴 엔트리 수
    pub fn binary_skipped(&self) -> usize {
        self.binary_skipped
    }

    /// 마지막 호출 이후 목록에서 본 일반 파일 이름을 가져갑니다.
    ///
    /// 읽지 않은 엔트리(0 바이트, 크기 초과, 이름 조건 불일치, 바이너리)도 포함됩니다.
    pub fn take_listed(&mut self) -> Vec<String> {
        mem::take(&mut self.listed)
    }

    /// 컨테이너 형식
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// 컨테이너 경로
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// 컨테이너 핸들을 아직 가지고 있는지
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    fn fetch_next(&mut self) -> Option<ArchiveEntry> {
        let limit = self.filter.max_entry_size();
        loop {
            let listed = self.source.as_mut()?.next_candidate();
            let candidate = match listed {
                Ok(Some(candidate)) => candidate,
                Ok(None) => {
                    self.release(Termination::Completed);
                    return None;
                }
                Err(SourceError::Recoverable(e)) => {
                    self.record_skip(entry_name(&e), e);
                    continue;
                }
                Err(SourceError::Fatal(e)) => {
                    self.truncate(e);
                    return None;
                }
            };

            if candidate.is_file {
                self.listed.push(candidate.name.clone());
            }
            if !self.filter.qualifies(&candidate) {
                continue;
            }

            let read = self.source.as_mut()?.read_candidate(&candidate, limit);
            match read {
                Ok(Sniffed::Text(content)) => {
                    return Some(self.entry_from(candidate, content));
                }
                Ok(Sniffed::Binary) => {
                    debug!(
                        archive = %self.archive_path.display(),
                        entry = %candidate.name,
                        "skipping binary entry"
                    );
                    self.binary_skipped += 1;
                }
                Err(SourceError::Recoverable(e)) => self.record_skip(candidate.name, e),
                Err(SourceError::Fatal(e)) => {
                    self.truncate(e);
                    return None;
                }
            }
        }
    }

    fn entry_from(&self, candidate: Candidate, content: Vec<u8>) -> ArchiveEntry {
        ArchiveEntry::new(candidate.name, content, self.format, &self.archive_path)
    }

    fn record_skip(&mut self, name: String, error: ArchiveError) {
        warn!(
            archive = %self.archive_path.display(),
            entry = %name,
            error = %error,
            "skipping unreadable archive entry"
        );
        metrics::counter!(m::ARCHIVE_ENTRIES_SKIPPED_TOTAL, m::LABEL_FORMAT => self.format.as_str())
            .increment(1);
        self.skipped.push(SkippedEntry { name, error });
    }

    fn truncate(&mut self, error: ArchiveError) {
        warn!(
            archive = %self.archive_path.display(),
            format = %self.format,
            error = %error,
            "archive stream truncated, remaining entries ignored"
        );
        metrics::counter!(m::ARCHIVE_TRUNCATED_TOTAL, m::LABEL_FORMAT => self.format.as_str())
            .increment(1);
        self.release(Termination::Truncated(error));
    }

    /// 핸들을 놓고 처음 기록된 종료 사유만 유지합니다.
    fn release(&mut self, reason: Termination) {
        if self.source.take().is_some() {
            debug!(archive = %self.archive_path.display(), "archive handle released");
        }
        if self.termination.is_none() {
            self.termination = Some(reason);
        }
    }
}

impl<S: EntrySource> Iterator for ArchiveEntryIterator<S> {
    type Item = ArchiveEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            self.current().cloned()
        } else {
            None
        }
    }
}

fn entry_name(error: &ArchiveError) -> String {
    match error {
        ArchiveError::Entry { name, .. } => name.clone(),
        _ => "<unknown>".to_owned(),
    }
}
