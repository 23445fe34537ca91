//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 수집기가 만든 [`FileRef`]를 엔진이 읽기 전용으로 소비하고,
//! 엔진은 [`Issue`]와 [`ScanWarning`]을 [`ScanReport`]로 모아 돌려줍니다.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 아카이브로 취급하는 파일 이름 접미사 (소문자)
const ARCHIVE_SUFFIXES: &[&str] = &[
    ".zip", ".jar", ".whl", ".nupkg", ".tar", ".tar.gz", ".tgz", ".7z",
];

/// 스캔 대상 파일 참조
///
/// 수집기가 생성하며 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// 파일시스템 경로
    pub path: PathBuf,
    /// 파일 이름 (경로의 마지막 컴포넌트)
    pub name: String,
    /// 보고용 표시 이름 (보통 스캔 루트 기준 상대 경로)
    pub display_name: String,
    /// 파일 크기 (바이트)
    pub size: u64,
    /// 상위 아카이브 (중첩된 경우)
    pub archive_name: Option<String>,
    /// 아카이브 여부
    pub is_archive: bool,
}

impl FileRef {
    /// 모든 필드를 직접 지정하여 생성합니다.
    ///
    /// `is_archive`는 이름 접미사로 판정합니다.
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_archive = is_archive_name(&name);
        Self {
            path,
            name,
            display_name: display_name.into(),
            size,
            archive_name: None,
            is_archive,
        }
    }

    /// 파일시스템 메타데이터로부터 생성합니다.
    ///
    /// `root`는 표시 이름을 만들기 위한 스캔 루트입니다.
    pub fn from_path(path: &Path, root: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let display_name = path
            .strip_prefix(root)
            .ok()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(path)
            .display()
            .to_string();
        Ok(Self::new(path, display_name, metadata.len()))
    }

    /// 상위 아카이브 이름을 지정합니다.
    pub fn with_archive_name(mut self, archive: impl Into<String>) -> Self {
        self.archive_name = Some(archive.into());
        self
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.archive_name {
            Some(archive) => write!(f, "{}!{} ({} bytes)", archive, self.display_name, self.size),
            None => write!(f, "{} ({} bytes)", self.display_name, self.size),
        }
    }
}

/// 파일 이름이 지원하는 아카이브 접미사로 끝나는지 확인합니다 (대소문자 무시).
pub fn is_archive_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// 이슈 발생 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSource {
    /// 개별 파일 (또는 아카이브 엔트리)
    File,
    /// 스캔 대상 전체
    Repository,
}

impl fmt::Display for IssueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Repository => write!(f, "repository"),
        }
    }
}

/// 정책 위반 이슈
///
/// 이슈 간 순서는 의미가 없습니다. 결과는 집합으로 취급합니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Issue {
    /// 검사 이름
    pub check: String,
    /// 사람이 읽는 메시지
    pub message: String,
    /// 발생 범위
    pub source: IssueSource,
    /// 위치 (파일 표시 이름 또는 아카이브 엔트리 이름, 저장소 범위면 스캔 대상)
    pub location: String,
    /// 상위 아카이브 (엔트리에서 발생한 경우)
    pub archive: Option<String>,
    /// 매칭된 키워드 또는 파일 이름 패턴
    pub matched: BTreeSet<String>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.archive {
            Some(archive) => write!(
                f,
                "[{}] {}!{}: {}",
                self.check, archive, self.location, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.check, self.location, self.message),
        }
    }
}

/// 비치명적 경고 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// 아카이브 컨테이너를 열 수 없음
    ArchiveOpen,
    /// 아카이브 엔트리를 읽을 수 없음 (건너뜀)
    EntryRead,
    /// 순차 포맷 손상으로 아카이브 나머지를 포기함
    ArchiveTruncated,
    /// 메모리 예산 부족으로 작업을 건너뜀
    BudgetExceeded,
    /// 콘텐츠 스캔 크기 제한 초과
    FileTooLarge,
    /// 파일 읽기 실패
    FileRead,
    /// 작업 실행 실패
    TaskFailed,
    /// 작업 큐 포화로 거부됨
    QueueRejected,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ArchiveOpen => "archive_open",
            Self::EntryRead => "entry_read",
            Self::ArchiveTruncated => "archive_truncated",
            Self::BudgetExceeded => "budget_exceeded",
            Self::FileTooLarge => "file_too_large",
            Self::FileRead => "file_read",
            Self::TaskFailed => "task_failed",
            Self::QueueRejected => "queue_rejected",
        };
        write!(f, "{s}")
    }
}

/// 비치명적 경고
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanWarning {
    /// 경고 종류
    pub kind: WarningKind,
    /// 위치 (파일 또는 아카이브 엔트리)
    pub location: String,
    /// 상세 메시지
    pub message: String,
}

impl ScanWarning {
    /// 새 경고를 생성합니다.
    pub fn new(kind: WarningKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.location, self.message)
    }
}

/// 스캔 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// 스캔 ID
    pub scan_id: String,
    /// 스캔 대상
    pub target: String,
    /// 처리된 일반 파일 수
    pub files_scanned: usize,
    /// 처리된 아카이브 엔트리 수
    pub entries_scanned: usize,
    /// 발견된 이슈
    pub issues: Vec<Issue>,
    /// 비치명적 경고
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    /// 빈 결과를 생성합니다.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            scan_id: uuid::Uuid::new_v4().to_string(),
            target: target.into(),
            files_scanned: 0,
            entries_scanned: 0,
            issues: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// 이슈가 하나라도 있는지 반환합니다.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// 결정적 출력을 위해 이슈와 경고를 정렬하고 중복을 제거합니다.
    pub fn normalize(&mut self) {
        self.issues.sort();
        self.issues.dedup();
        self.warnings.sort();
    }

    /// 특정 검사에서 발생한 이슈 수를 반환합니다.
    pub fn issue_count_for(&self, check: &str) -> usize {
        self.issues.iter().filter(|i| i.check == check).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issue(location: &str) -> Issue {
        Issue {
            check: "credentials".to_owned(),
            message: "found forbidden keywords".to_owned(),
            source: IssueSource::File,
            location: location.to_owned(),
            archive: None,
            matched: BTreeSet::from(["password".to_owned()]),
        }
    }

    #[test]
    fn archive_name_detection() {
        assert!(is_archive_name("bundle.zip"));
        assert!(is_archive_name("BUNDLE.ZIP"));
        assert!(is_archive_name("src.tar.gz"));
        assert!(is_archive_name("src.tgz"));
        assert!(is_archive_name("data.7z"));
        assert!(is_archive_name("lib.jar"));
        assert!(!is_archive_name("notes.txt"));
        assert!(!is_archive_name("zip"));
    }

    #[test]
    fn file_ref_new_sets_name_and_archive_flag() {
        let file = FileRef::new("/tmp/pkg/release.tar.gz", "pkg/release.tar.gz", 100);
        assert_eq!(file.name, "release.tar.gz");
        assert!(file.is_archive);
        assert!(file.archive_name.is_none());
    }

    #[test]
    fn file_ref_from_path_uses_relative_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let file = FileRef::from_path(&path, dir.path()).unwrap();
        assert_eq!(file.display_name, "notes.txt");
        assert_eq!(file.size, 5);
        assert!(!file.is_archive);
    }

    #[test]
    fn file_ref_from_path_missing_file_fails() {
        let result = FileRef::from_path(Path::new("/nonexistent/file.txt"), Path::new("/"));
        assert!(result.is_err());
    }

    #[test]
    fn file_ref_display_includes_archive() {
        let file = FileRef::new("/tmp/a.txt", "a.txt", 3).with_archive_name("outer.zip");
        assert_eq!(file.to_string(), "outer.zip!a.txt (3 bytes)");
    }

    #[test]
    fn issue_display() {
        let mut issue = sample_issue("notes.txt");
        assert_eq!(
            issue.to_string(),
            "[credentials] notes.txt: found forbidden keywords"
        );
        issue.archive = Some("bundle.zip".to_owned());
        assert!(issue.to_string().contains("bundle.zip!notes.txt"));
    }

    #[test]
    fn report_normalize_dedups_issues() {
        let mut report = ScanReport::new("./target");
        report.issues.push(sample_issue("b.txt"));
        report.issues.push(sample_issue("a.txt"));
        report.issues.push(sample_issue("b.txt"));
        report.normalize();
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].location, "a.txt");
        assert_eq!(report.issue_count_for("credentials"), 2);
        assert!(report.has_issues());
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = ScanReport::new("./target");
        report.issues.push(sample_issue("notes.txt"));
        report.warnings.push(ScanWarning::new(
            WarningKind::ArchiveOpen,
            "broken.zip",
            "invalid zip header",
        ));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["issues"][0]["source"], "file");
        assert_eq!(json["warnings"][0]["kind"], "archive_open");
    }

    #[test]
    fn warning_display() {
        let warning = ScanWarning::new(WarningKind::BudgetExceeded, "big.bin", "denied");
        assert_eq!(warning.to_string(), "budget_exceeded big.bin: denied");
    }
}
