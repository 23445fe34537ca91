#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`budget`]: CAS 기반 메모리 예산과 RAII 예약
//! - [`pool`]: 승인 제어가 있는 bounded 워커 풀
//! - [`check`]: 설정에서 컴파일된 콘텐츠/파일 이름 검사
//! - [`task`]: 워커가 실행하는 스캔 작업
//! - [`orchestrator`]: 반복자, 매처, 워커 풀을 연결하는 스캔 흐름
//! - [`config`]: 스캐너 설정과 빌더
//! - [`error`]: 에러 타입

pub mod budget;
pub mod check;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pool;
pub mod task;

pub use budget::{MemoryBudget, Reservation};
pub use check::{CheckSet, ContentCheck, FilenameCheck};
pub use config::{QueuePolicy, ScannerConfig, ScannerConfigBuilder, WorkerPoolConfig};
pub use error::{ScannerError, SubmitError, TaskError};
pub use orchestrator::ScanOrchestrator;
pub use pool::{Job, PoolStatsSnapshot, TaskHandle, WorkerPool};
pub use task::{ScanTask, TaskContent, TaskOutcome};
