//! 에러 타입: 도메인별 에러 정의
//!
//! 치명적 에러는 두 종류뿐입니다: [`ConfigError`] (스캔 시작 전 설정 검증 실패)와
//! [`RootError`] (스캔 대상이 없거나 파일이 하나도 없음).
//! 나머지 도메인 에러는 각 모듈에서 로컬 복구되어 경고로 기록되며,
//! 상위로 전파될 때만 [`ContrabandError`]로 변환됩니다.

/// contraband 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ContrabandError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 루트 에러
    #[error("root error: {0}")]
    Root(#[from] RootError),

    /// 아카이브 처리 에러
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// 패턴 매칭 에러
    #[error("match error: {0}")]
    Match(#[from] MatchError),

    /// 스캔 실행 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContrabandError {
    /// 스캔 전체를 중단시키는 치명적 에러인지 반환합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Root(_))
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스캔 루트 에러
#[derive(Debug, thiserror::Error)]
pub enum RootError {
    /// 스캔 대상 경로가 존재하지 않음
    #[error("target not found: {path}")]
    TargetNotFound { path: String },

    /// 스캔 대상에서 파일을 하나도 찾지 못함
    #[error("no files discovered under {path}")]
    NoFiles { path: String },
}

/// 아카이브 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// 컨테이너를 열 수 없음
    #[error("open failed: {0}")]
    OpenFailed(String),

    /// 개별 엔트리 읽기 실패
    #[error("entry failed: {0}")]
    EntryFailed(String),

    /// 지원하지 않는 형식
    #[error("unsupported format: {0}")]
    Unsupported(String),
}

/// 패턴 매칭 에러
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// 키워드가 필요한 곳에 빈 패턴 집합이 주어짐
    #[error("empty pattern set: {0}")]
    EmptyPatternSet(String),

    /// 오토마톤 빌드 실패
    #[error("matcher build failed: {0}")]
    BuildFailed(String),
}

/// 스캔 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 메모리 예산 초과
    #[error("memory budget exceeded: requested {requested} bytes (capacity: {capacity})")]
    BudgetExceeded { requested: u64, capacity: u64 },

    /// 작업 큐가 닫힘
    #[error("task queue closed")]
    QueueClosed,

    /// 작업 실행 실패
    #[error("task failed: {0}")]
    TaskFailed(String),
}
