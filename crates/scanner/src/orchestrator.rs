//! 스캔 오케스트레이터 -- 전체 스캔 흐름 관리
//!
//! # 내부 아키텍처
//!
//! ```text
//! Vec<FileRef> --+-- 일반 파일 --> filename checks --> ScanTask::file ----------+
//!                |                                                            |
//!                +-- 아카이브 --> spawn_blocking(ArchiveEntryIterator)        |
//!                                   | mpsc(1)                                 v
//!                                   +--> Name  --> filename checks            |
//!                                   +--> Entry --> ScanTask::entry ------> WorkerPool
//!                                                                             |
//!                                                  TaskHandle::join --> ScanReport
//! ```
//!
//! 아카이브 목록의 모든 일반 파일 이름은 `Name` 이벤트로 전달되어 파일 이름 검사를 받습니다.
//! 콘텐츠는 적용되는 콘텐츠 검사가 있는 엔트리만 읽습니다.
//!
//! 설정 에러와 스캔 대상 에러만 `Err`로 반환합니다. 그 외의 실패(아카이브 열기,
//! 손상, 예산 부족, 큐 거부, 작업 실패)는 모두 보고서의 경고가 됩니다.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use contraband_archive::{
    ArchiveEntry, ArchiveEntryIterator, ArchiveFormat, EntryFilter, Termination, detect_format,
};
use contraband_core::error::RootError;
use contraband_core::metrics as m;
use contraband_core::types::{FileRef, Issue, IssueSource, ScanReport, ScanWarning, WarningKind};
use contraband_matcher::MatcherCache;

use crate::budget::MemoryBudget;
use crate::check::CheckSet;
use crate::config::ScannerConfig;
use crate::error::{ScannerError, SubmitError};
use crate::pool::{TaskHandle, WorkerPool};
use crate::task::{ScanTask, TaskOutcome};

/// 아카이브 생산자가 비동기 쪽으로 보내는 이벤트
enum ArchiveEvent {
    Name(String),
    Entry(ArchiveEntry),
    Warning(ScanWarning),
}

/// 한 번의 스캔 동안 쌓이는 상태
struct ScanRun {
    report: ScanReport,
    pending: Vec<(String, TaskHandle<TaskOutcome>)>,
}

impl ScanRun {
    fn warn(&mut self, warning: ScanWarning) {
        warn!(kind = %warning.kind, location = %warning.location, "{}", warning.message);
        metrics::counter!(m::SCANNER_WARNINGS_TOTAL, m::LABEL_WARNING_KIND => warning.kind.to_string())
            .increment(1);
        self.report.warnings.push(warning);
    }
}

/// 스캔 오케스트레이터
///
/// 검사는 생성 시 한 번 컴파일되며, 매처는 주입된 [`MatcherCache`]에서 공유됩니다.
/// 워커 풀과 메모리 예산은 `scan` 호출마다 새로 만들어 스캔이 끝나면 정지합니다.
pub struct ScanOrchestrator {
    config: ScannerConfig,
    checks: Arc<CheckSet>,
    cache: Arc<MatcherCache>,
}

impl ScanOrchestrator {
    /// 설정을 검증하고 검사를 컴파일합니다.
    ///
    /// # Errors
    ///
    /// 크기 제한, 풀 설정, 키워드, glob 패턴이 잘못되면 `ScannerError::Config`
    pub fn new(config: ScannerConfig, cache: Arc<MatcherCache>) -> Result<Self, ScannerError> {
        config.validate()?;
        let checks = CheckSet::compile(&config.content_checks, &config.filename_checks, &cache)?;

        info!(
            content_checks = checks.content.len(),
            filename_checks = checks.filename.len(),
            cached_matchers = cache.len(),
            "scan orchestrator initialized"
        );

        Ok(Self {
            config,
            checks: Arc::new(checks),
            cache,
        })
    }

    /// 스캐너 설정
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// 공유 매처 캐시
    pub fn cache(&self) -> &Arc<MatcherCache> {
        &self.cache
    }

    /// 대상의 파일 목록을 스캔합니다.
    ///
    /// # Errors
    ///
    /// 대상이 없거나 `files`가 비어 있으면 `ScannerError::Root`
    pub async fn scan(
        &self,
        target: &Path,
        files: Vec<FileRef>,
    ) -> Result<ScanReport, ScannerError> {
        if !target.exists() {
            return Err(RootError::TargetNotFound {
                path: target.display().to_string(),
            }
            .into());
        }
        if files.is_empty() {
            return Err(RootError::NoFiles {
                path: target.display().to_string(),
            }
            .into());
        }

        let target_name = target.display().to_string();
        info!(target = %target_name, files = files.len(), "scan started");

        let budget = Arc::new(MemoryBudget::new(self.config.max_total_archive_memory));
        let pool = WorkerPool::start(self.config.pool.clone(), budget);
        let mut run = ScanRun {
            report: ScanReport::new(target_name.clone()),
            pending: Vec::new(),
        };

        for file in &files {
            self.check_filename(&mut run, &file.display_name, file.archive_name.as_deref());
            if file.is_archive {
                self.scan_archive(&mut run, &pool, file).await;
            } else {
                self.scan_file(&mut run, &pool, file).await;
            }
        }

        let pending = std::mem::take(&mut run.pending);
        let mut repository: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (location, handle) in pending {
            match handle.join().await {
                Ok(outcome) => {
                    run.report.issues.extend(outcome.issues);
                    for (check, matched) in outcome.repository_hits {
                        repository.entry(check).or_default().extend(matched);
                    }
                    for warning in outcome.warnings {
                        run.warn(warning);
                    }
                }
                Err(e) => run.warn(ScanWarning::new(
                    WarningKind::TaskFailed,
                    location,
                    e.to_string(),
                )),
            }
        }
        pool.stop().await;

        for (check_name, matched) in repository {
            let message = self
                .checks
                .content
                .iter()
                .find(|c| c.name == check_name)
                .map(|c| c.message.clone())
                .unwrap_or_default();
            run.report.issues.push(Issue {
                check: check_name,
                message,
                source: IssueSource::Repository,
                location: target_name.clone(),
                archive: None,
                matched,
            });
        }

        let mut report = run.report;
        report.normalize();
        for issue in &report.issues {
            metrics::counter!(m::SCANNER_ISSUES_TOTAL, m::LABEL_CHECK => issue.check.clone())
                .increment(1);
        }

        info!(
            target = %target_name,
            files = report.files_scanned,
            entries = report.entries_scanned,
            issues = report.issues.len(),
            warnings = report.warnings.len(),
            "scan completed"
        );
        Ok(report)
    }

    fn check_filename(&self, run: &mut ScanRun, name: &str, archive: Option<&str>) {
        for check in &self.checks.filename {
            let matched = check.matches(name);
            if matched.is_empty() {
                continue;
            }
            run.report.issues.push(Issue {
                check: check.name.clone(),
                message: check.message.clone(),
                source: IssueSource::File,
                location: name.to_owned(),
                archive: archive.map(str::to_owned),
                matched,
            });
        }
    }

    async fn scan_file(&self, run: &mut ScanRun, pool: &WorkerPool<ScanTask>, file: &FileRef) {
        run.report.files_scanned += 1;
        metrics::counter!(m::SCANNER_FILES_SCANNED_TOTAL).increment(1);

        if file.size > self.config.max_content_scan_file_size {
            run.warn(ScanWarning::new(
                WarningKind::FileTooLarge,
                file.display_name.clone(),
                format!(
                    "{} bytes exceeds content scan limit of {} bytes",
                    file.size, self.config.max_content_scan_file_size
                ),
            ));
            return;
        }
        if file.size == 0 {
            return;
        }

        let applicable = self.checks.applicable(&file.display_name);
        if applicable.is_empty() {
            return;
        }

        let mut task = ScanTask::file(
            file.display_name.clone(),
            file.path.clone(),
            file.size,
            Arc::clone(&self.checks),
            applicable,
        );
        task.archive = file.archive_name.clone();
        self.submit(run, pool, task).await;
    }

    async fn scan_archive(&self, run: &mut ScanRun, pool: &WorkerPool<ScanTask>, file: &FileRef) {
        run.report.files_scanned += 1;
        metrics::counter!(m::SCANNER_FILES_SCANNED_TOTAL).increment(1);

        let Some(format) = detect_format(&file.path) else {
            run.warn(ScanWarning::new(
                WarningKind::ArchiveOpen,
                file.display_name.clone(),
                "unrecognized archive format",
            ));
            return;
        };

        let archive_name = file.display_name.clone();
        let checks = Arc::clone(&self.checks);
        let filter = EntryFilter::new(self.config.max_archive_entry_size)
            .with_predicate(Arc::new(move |name: &str| checks.wants_content(name)));
        let (tx, mut rx) = mpsc::channel(1);
        let producer = {
            let path = file.path.clone();
            let archive_name = archive_name.clone();
            tokio::task::spawn_blocking(move || {
                produce_entries(path, format, filter, archive_name, tx);
            })
        };

        while let Some(event) = rx.recv().await {
            match event {
                ArchiveEvent::Warning(warning) => run.warn(warning),
                ArchiveEvent::Name(name) => self.check_filename(run, &name, Some(&archive_name)),
                ArchiveEvent::Entry(entry) => {
                    run.report.entries_scanned += 1;
                    metrics::counter!(m::SCANNER_ENTRIES_SCANNED_TOTAL).increment(1);

                    let applicable = self.checks.applicable(&entry.name);
                    if applicable.is_empty() {
                        continue;
                    }
                    let task = ScanTask::entry(
                        entry.name,
                        archive_name.clone(),
                        entry.content,
                        Arc::clone(&self.checks),
                        applicable,
                    );
                    self.submit(run, pool, task).await;
                }
            }
        }

        if let Err(e) = producer.await {
            run.warn(ScanWarning::new(
                WarningKind::TaskFailed,
                archive_name,
                format!("archive reader failed: {e}"),
            ));
        }
    }

    async fn submit(&self, run: &mut ScanRun, pool: &WorkerPool<ScanTask>, task: ScanTask) {
        let location = match &task.archive {
            Some(archive) => format!("{archive}!/{}", task.location),
            None => task.location.clone(),
        };

        match pool.submit(task).await {
            Ok(handle) => run.pending.push((location, handle)),
            Err(e @ SubmitError::BudgetExceeded { .. }) => {
                run.warn(ScanWarning::new(WarningKind::BudgetExceeded, location, e.to_string()));
            }
            Err(e @ SubmitError::QueueFull) => {
                run.warn(ScanWarning::new(WarningKind::QueueRejected, location, e.to_string()));
            }
            Err(e @ SubmitError::Closed) => {
                run.warn(ScanWarning::new(WarningKind::TaskFailed, location, e.to_string()));
            }
        }
    }
}

/// blocking 스레드에서 아카이브를 읽어 엔트리와 경고를 보냅니다.
///
/// 수신 측이 사라지면 반복자를 닫고 즉시 반환합니다.
fn produce_entries(
    path: PathBuf,
    format: ArchiveFormat,
    filter: EntryFilter,
    archive_name: String,
    tx: mpsc::Sender<ArchiveEvent>,
) {
    let mut iter = ArchiveEntryIterator::open(&path, format, filter);
    let mut forwarded_skips = 0usize;

    loop {
        if !forward_names(&mut iter, &tx) {
            iter.close();
            return;
        }
        if !iter.advance() {
            break;
        }
        if !forward_skips(&iter, &mut forwarded_skips, &archive_name, &tx) {
            iter.close();
            return;
        }
        let Some(entry) = iter.current().cloned() else {
            continue;
        };
        if tx.blocking_send(ArchiveEvent::Entry(entry)).is_err() {
            debug!(archive = %archive_name, "entry consumer dropped, closing archive");
            iter.close();
            return;
        }
    }

    if !forward_names(&mut iter, &tx)
        || !forward_skips(&iter, &mut forwarded_skips, &archive_name, &tx)
    {
        return;
    }

    let warning = match iter.termination() {
        Some(Termination::OpenFailed(e)) => Some(ScanWarning::new(
            WarningKind::ArchiveOpen,
            archive_name.clone(),
            e.to_string(),
        )),
        Some(Termination::Truncated(e)) => Some(ScanWarning::new(
            WarningKind::ArchiveTruncated,
            archive_name.clone(),
            e.to_string(),
        )),
        _ => None,
    };
    if let Some(warning) = warning {
        let _ = tx.blocking_send(ArchiveEvent::Warning(warning));
    }
}

/// 목록에서 새로 본 엔트리 이름을 보냅니다. 수신 측이 사라졌으면 `false`.
fn forward_names(iter: &mut ArchiveEntryIterator, tx: &mpsc::Sender<ArchiveEvent>) -> bool {
    iter.take_listed()
        .into_iter()
        .all(|name| tx.blocking_send(ArchiveEvent::Name(name)).is_ok())
}

/// 아직 보내지 않은 건너뛴 엔트리를 경고로 보냅니다. 수신 측이 사라졌으면 `false`.
fn forward_skips(
    iter: &ArchiveEntryIterator,
    forwarded: &mut usize,
    archive_name: &str,
    tx: &mpsc::Sender<ArchiveEvent>,
) -> bool {
    for skipped in &iter.skipped_entries()[*forwarded..] {
        let warning = ScanWarning::new(
            WarningKind::EntryRead,
            format!("{archive_name}!/{}", skipped.name),
            skipped.error.to_string(),
        );
        if tx.blocking_send(ArchiveEvent::Warning(warning)).is_err() {
            return false;
        }
        *forwarded += 1;
    }
    true
}
