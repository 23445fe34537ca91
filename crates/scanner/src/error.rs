//! 스캐너 에러 타입
//!
//! [`ScannerError`]는 스캔 시작 전(설정, 스캔 대상)과 스캔 실행 중의 에러를 나타냅니다.
//! 워커 풀 제출과 작업 결과는 각각 [`SubmitError`], [`TaskError`]로 분리되며,
//! 오케스트레이터는 이 둘을 보고서 경고로 바꿉니다.
//!
//! # 에러 카테고리
//!
//! - **설정**: `Config` (치명적)
//! - **스캔 대상**: `Root` (치명적)
//! - **메모리 예산**: `Budget`
//! - **워커 풀**: `Pool`
//! - **파일 I/O**: `Io`

use contraband_core::error::{ConfigError, ContrabandError, RootError, ScanError};

/// 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 스캔 대상 에러
    #[error(transparent)]
    Root(#[from] RootError),

    /// 메모리 예산으로 수용할 수 없는 요청
    #[error("memory budget exceeded: requested {requested} bytes (capacity: {capacity})")]
    Budget {
        /// 요청 바이트
        requested: u64,
        /// 예산 용량
        capacity: u64,
    },

    /// 워커 풀 에러
    #[error("worker pool error: {0}")]
    Pool(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl ScannerError {
    /// 스캔을 시작할 수 없게 만드는 에러인지 반환합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Root(_))
    }
}

impl From<ScannerError> for ContrabandError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::Config { field, reason } => {
                ContrabandError::Config(ConfigError::InvalidValue { field, reason })
            }
            ScannerError::Root(e) => ContrabandError::Root(e),
            ScannerError::Budget {
                requested,
                capacity,
            } => ContrabandError::Scan(ScanError::BudgetExceeded {
                requested,
                capacity,
            }),
            ScannerError::Pool(msg) => ContrabandError::Scan(ScanError::TaskFailed(msg)),
            ScannerError::Io { source, .. } => ContrabandError::Io(source),
        }
    }
}

/// 워커 풀 제출 실패
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// 대기 시간 안에 메모리 예산을 확보하지 못함
    #[error("memory budget exhausted: requested {requested} bytes, available {available} of {capacity}")]
    BudgetExceeded {
        /// 요청 바이트
        requested: u64,
        /// 거부 시점의 여유 바이트
        available: u64,
        /// 예산 용량
        capacity: u64,
    },

    /// 큐가 가득 참 (`Reject` 정책)
    #[error("task queue is full")]
    QueueFull,

    /// 풀이 정지됨
    #[error("worker pool is closed")]
    Closed,
}

/// 작업 실행 실패 (해당 작업에만 영향)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// 작업 본문이 에러를 반환함
    #[error("task failed: {0}")]
    Failed(String),

    /// 작업 본문이 panic함
    #[error("task panicked: {0}")]
    Panicked(String),

    /// 결과를 받기 전에 작업이 취소됨
    #[error("task cancelled")]
    Cancelled,
}
