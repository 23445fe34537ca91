//! 스캐너 설정
//!
//! [`ScannerConfig`]는 core의 [`ContrabandConfig`]에서 스캔 엔진이 쓰는 값만 꺼내
//! 문자열 설정을 타입으로 바꾼 것입니다 (`queue_policy` -> [`QueuePolicy`],
//! `scope` 검증 등).
//!
//! # 사용 예시
//!
//! ```
//! use contraband_scanner::{QueuePolicy, ScannerConfigBuilder};
//!
//! let config = ScannerConfigBuilder::new()
//!     .worker_count(8)
//!     .queue_policy(QueuePolicy::Reject)
//!     .max_archive_entry_size(1024 * 1024)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.pool.worker_count, 8);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use contraband_core::config::{
    ContentCheckConfig, ContrabandConfig, FilenameCheckConfig, MAX_QUEUE_CAPACITY,
    MAX_WORKER_COUNT,
};

use crate::error::ScannerError;

/// 큐가 가득 찼을 때의 제출 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePolicy {
    /// 자리가 날 때까지 대기 (backpressure)
    #[default]
    Block,
    /// 즉시 `QueueFull`로 거부
    Reject,
}

impl QueuePolicy {
    /// 설정 문자열을 파싱합니다 (대소문자 무시).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Some(Self::Block),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// 워커 풀 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// 병렬 워커 수
    pub worker_count: usize,
    /// 작업 큐 용량
    pub queue_capacity: usize,
    /// 큐 포화 시 정책
    pub queue_policy: QueuePolicy,
    /// 메모리 예산 대기 시간 (밀리초). 0이면 대기하지 않음
    pub admission_wait_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 64,
            queue_policy: QueuePolicy::Block,
            admission_wait_ms: 5_000,
        }
    }
}

impl WorkerPoolConfig {
    /// 메모리 예산 대기 시간
    pub fn admission_wait(&self) -> Duration {
        Duration::from_millis(self.admission_wait_ms)
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.worker_count == 0 || self.worker_count > MAX_WORKER_COUNT {
            return Err(ScannerError::Config {
                field: "pool.worker_count".to_owned(),
                reason: format!("must be between 1 and {MAX_WORKER_COUNT}"),
            });
        }
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ScannerError::Config {
                field: "pool.queue_capacity".to_owned(),
                reason: format!("must be between 1 and {MAX_QUEUE_CAPACITY}"),
            });
        }
        Ok(())
    }
}

/// 스캐너 설정
///
/// # 필드
///
/// - **max_archive_entry_size**: 이보다 큰 아카이브 엔트리는 읽지 않음
/// - **max_total_archive_memory**: 메모리 예산 용량
/// - **max_content_scan_file_size**: 이보다 큰 일반 파일은 `FileTooLarge` 경고
/// - **pool**: 워커 수, 큐 용량, 큐 정책, 예산 대기 시간
/// - **content_checks** / **filename_checks**: 검사 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// 아카이브 엔트리 최대 크기 (바이트)
    pub max_archive_entry_size: u64,
    /// 메모리 예산 용량 (바이트)
    pub max_total_archive_memory: u64,
    /// 일반 파일 콘텐츠 스캔 최대 크기 (바이트)
    pub max_content_scan_file_size: u64,
    /// 워커 풀 설정
    pub pool: WorkerPoolConfig,
    /// 콘텐츠 키워드 검사
    pub content_checks: Vec<ContentCheckConfig>,
    /// 파일 이름 검사
    pub filename_checks: Vec<FilenameCheckConfig>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::from_core(&ContrabandConfig::default())
    }
}

impl ScannerConfig {
    /// core 설정에서 스캐너 설정을 생성합니다.
    ///
    /// 알 수 없는 `queue_policy`는 `Block`으로 대체합니다
    /// (core 설정의 `validate()`가 먼저 걸러냅니다).
    pub fn from_core(core: &ContrabandConfig) -> Self {
        let queue_policy =
            QueuePolicy::from_str_loose(&core.pool.queue_policy).unwrap_or(QueuePolicy::Block);

        Self {
            max_archive_entry_size: core.limits.max_archive_entry_size,
            max_total_archive_memory: core.limits.max_total_archive_memory,
            max_content_scan_file_size: core.limits.max_content_scan_file_size,
            pool: WorkerPoolConfig {
                worker_count: core.pool.worker_count,
                queue_capacity: core.pool.queue_capacity,
                queue_policy,
                admission_wait_ms: core.pool.admission_wait_ms,
            },
            content_checks: core.checks.content.clone(),
            filename_checks: core.checks.filename.clone(),
        }
    }

    /// 크기 제한과 풀 설정을 검증합니다.
    ///
    /// 검사 정의(키워드, glob)는 [`ScanOrchestrator::new`](crate::ScanOrchestrator::new)에서
    /// 컴파일하며 검증됩니다.
    ///
    /// # 검증 규칙
    ///
    /// - 모든 크기 제한은 0보다 커야 함
    /// - `max_archive_entry_size <= max_total_archive_memory` (엔트리 하나는 항상 예산에 들어가야 함)
    /// - `max_content_scan_file_size <= max_total_archive_memory` (일반 파일도 마찬가지)
    /// - `worker_count`: 1-256, `queue_capacity`: 1-65536
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.max_archive_entry_size == 0 {
            return Err(ScannerError::Config {
                field: "max_archive_entry_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.max_total_archive_memory == 0 {
            return Err(ScannerError::Config {
                field: "max_total_archive_memory".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.max_content_scan_file_size == 0 {
            return Err(ScannerError::Config {
                field: "max_content_scan_file_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.max_archive_entry_size > self.max_total_archive_memory {
            return Err(ScannerError::Config {
                field: "max_archive_entry_size".to_owned(),
                reason: format!(
                    "must not exceed max_total_archive_memory ({})",
                    self.max_total_archive_memory
                ),
            });
        }
        if self.max_content_scan_file_size > self.max_total_archive_memory {
            return Err(ScannerError::Config {
                field: "max_content_scan_file_size".to_owned(),
                reason: format!(
                    "must not exceed max_total_archive_memory ({})",
                    self.max_total_archive_memory
                ),
            });
        }
        self.pool.validate()
    }
}

/// [`ScannerConfig`] 빌더
///
/// 빌드 시 유효성을 검증합니다.
#[derive(Default)]
pub struct ScannerConfigBuilder {
    config: ScannerConfig,
}

impl ScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 아카이브 엔트리 최대 크기를 설정합니다.
    pub fn max_archive_entry_size(mut self, bytes: u64) -> Self {
        self.config.max_archive_entry_size = bytes;
        self
    }

    /// 메모리 예산 용량을 설정합니다.
    pub fn max_total_archive_memory(mut self, bytes: u64) -> Self {
        self.config.max_total_archive_memory = bytes;
        self
    }

    /// 일반 파일 콘텐츠 스캔 최대 크기를 설정합니다.
    pub fn max_content_scan_file_size(mut self, bytes: u64) -> Self {
        self.config.max_content_scan_file_size = bytes;
        self
    }

    /// 워커 수를 설정합니다.
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.pool.worker_count = count;
        self
    }

    /// 큐 용량을 설정합니다.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.pool.queue_capacity = capacity;
        self
    }

    /// 큐 정책을 설정합니다.
    pub fn queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.config.pool.queue_policy = policy;
        self
    }

    /// 메모리 예산 대기 시간을 설정합니다.
    pub fn admission_wait(mut self, wait: Duration) -> Self {
        self.config.pool.admission_wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// 콘텐츠 검사 목록을 교체합니다.
    pub fn content_checks(mut self, checks: Vec<ContentCheckConfig>) -> Self {
        self.config.content_checks = checks;
        self
    }

    /// 콘텐츠 검사를 추가합니다.
    pub fn content_check(mut self, check: ContentCheckConfig) -> Self {
        self.config.content_checks.push(check);
        self
    }

    /// 파일 이름 검사 목록을 교체합니다.
    pub fn filename_checks(mut self, checks: Vec<FilenameCheckConfig>) -> Self {
        self.config.filename_checks = checks;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ScannerError::Config` 반환
    pub fn build(self) -> Result<ScannerConfig, ScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
