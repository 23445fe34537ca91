//! 스캔 작업 -- 콘텐츠 하나에 적용 가능한 콘텐츠 검사를 실행
//!
//! 일반 파일은 워커 안에서 읽고, 아카이브 엔트리는 반복자가 이미 읽은 콘텐츠를 받습니다.
//! 파일 읽기 실패는 작업 실패가 아니라 `FileRead` 경고가 담긴 결과입니다.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use contraband_archive::{ContentKind, SNIFF_LEN, sniff};
use contraband_core::types::{Issue, IssueSource, ScanWarning, WarningKind};

use crate::check::CheckSet;
use crate::error::ScannerError;
use crate::pool::Job;

/// 작업이 검사할 콘텐츠
#[derive(Debug)]
pub enum TaskContent {
    /// 워커에서 읽을 파일 (`size` 바이트까지)
    File {
        /// 파일 경로
        path: PathBuf,
        /// 승인된 크기
        size: u64,
    },
    /// 이미 읽은 아카이브 엔트리 콘텐츠
    Entry(Bytes),
}

/// 워커가 한 번 소비하는 스캔 작업
#[derive(Debug)]
pub struct ScanTask {
    /// 파일 표시 이름 또는 엔트리 이름
    pub location: String,
    /// 상위 아카이브
    pub archive: Option<String>,
    /// 콘텐츠
    pub content: TaskContent,
    checks: Arc<CheckSet>,
    applicable: Vec<usize>,
}

/// 작업 결과
#[derive(Debug, Default)]
pub struct TaskOutcome {
    /// 파일 범위 이슈
    pub issues: Vec<Issue>,
    /// 저장소 범위 검사별 발견 키워드 (스캔 끝에 검사당 하나로 합침)
    pub repository_hits: Vec<(String, BTreeSet<String>)>,
    /// 파일 읽기 경고
    pub warnings: Vec<ScanWarning>,
}

impl ScanTask {
    /// 일반 파일 작업
    pub fn file(
        location: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
        checks: Arc<CheckSet>,
        applicable: Vec<usize>,
    ) -> Self {
        Self {
            location: location.into(),
            archive: None,
            content: TaskContent::File {
                path: path.into(),
                size,
            },
            checks,
            applicable,
        }
    }

    /// 아카이브 엔트리 작업
    pub fn entry(
        name: impl Into<String>,
        archive: impl Into<String>,
        content: Bytes,
        checks: Arc<CheckSet>,
        applicable: Vec<usize>,
    ) -> Self {
        Self {
            location: name.into(),
            archive: Some(archive.into()),
            content: TaskContent::Entry(content),
            checks,
            applicable,
        }
    }

    fn evaluate(&self, content: &[u8]) -> TaskOutcome {
        let mut outcome = TaskOutcome::default();

        for &index in &self.applicable {
            let Some(check) = self.checks.content.get(index) else {
                continue;
            };
            let matched = check.find(content);
            if matched.is_empty() {
                continue;
            }
            match check.scope {
                IssueSource::File => outcome.issues.push(Issue {
                    check: check.name.clone(),
                    message: check.message.clone(),
                    source: IssueSource::File,
                    location: self.location.clone(),
                    archive: self.archive.clone(),
                    matched,
                }),
                IssueSource::Repository => {
                    outcome.repository_hits.push((check.name.clone(), matched));
                }
            }
        }

        outcome
    }
}

impl Job for ScanTask {
    type Output = TaskOutcome;

    fn admission_bytes(&self) -> u64 {
        match &self.content {
            TaskContent::File { size, .. } => *size,
            TaskContent::Entry(bytes) => bytes.len() as u64,
        }
    }

    fn run(self) -> Result<TaskOutcome, ScannerError> {
        match &self.content {
            TaskContent::Entry(bytes) => Ok(self.evaluate(bytes)),
            TaskContent::File { path, size } => match read_text(path, *size) {
                Ok(Some(content)) => Ok(self.evaluate(&content)),
                Ok(None) => {
                    debug!(path = %path.display(), "skipping binary file");
                    Ok(TaskOutcome::default())
                }
                Err(e) => Ok(TaskOutcome {
                    warnings: vec![ScanWarning::new(
                        WarningKind::FileRead,
                        self.location.clone(),
                        e.to_string(),
                    )],
                    ..TaskOutcome::default()
                }),
            },
        }
    }
}

/// 최대 `limit` 바이트를 읽습니다. 앞부분이 바이너리로 판별되면 `None`.
fn read_text(path: &std::path::Path, limit: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut file = File::open(path)?.take(limit);
    let mut content = Vec::with_capacity(SNIFF_LEN);
    (&mut file).take(SNIFF_LEN as u64).read_to_end(&mut content)?;
    if sniff(&content) == ContentKind::Binary {
        return Ok(None);
    }
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}
