//! 워커 풀 -- 메모리 예산 승인 후 bounded 큐로 작업 분배
//!
//! # 내부 아키텍처
//!
//! ```text
//! submit(job) --reserve(admission_bytes)--> mpsc(queue_capacity) --> worker 0..N
//!                                                                      |
//!                                                               spawn_blocking(job.run)
//!                                                                      |
//!                                                      oneshot --> TaskHandle::join()
//! ```
//!
//! - 승인은 제출 시점에 일어납니다. 예약은 작업 본문이 끝날 때까지 유지됩니다.
//! - `Block` 정책은 큐 자리가 날 때까지 기다리고, `Reject` 정책은 즉시 거부합니다.
//! - 한 작업의 에러나 panic은 그 작업의 [`TaskHandle`]에만 전달됩니다.
//! - [`WorkerPool::stop`]은 큐를 닫고 남은 작업을 모두 처리한 뒤 반환합니다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use contraband_core::metrics as m;

use crate::budget::{MemoryBudget, Reservation};
use crate::config::{QueuePolicy, WorkerPoolConfig};
use crate::error::{ScannerError, SubmitError, TaskError};

/// 워커 풀이 실행하는 작업
///
/// `run`은 blocking 스레드에서 호출되므로 파일 읽기나 CPU 작업을 그대로 수행해도 됩니다.
pub trait Job: Send + 'static {
    /// 작업 결과
    type Output: Send + 'static;

    /// 승인 시 예약할 메모리 (바이트)
    fn admission_bytes(&self) -> u64;

    /// 작업 본문
    fn run(self) -> Result<Self::Output, ScannerError>;
}

/// 큐에 들어간 작업
struct Queued<J: Job> {
    job: J,
    reservation: Reservation,
    reply: oneshot::Sender<Result<J::Output, TaskError>>,
}

/// 제출된 작업의 결과 핸들
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    /// 작업이 끝날 때까지 기다려 결과를 받습니다.
    pub async fn join(self) -> Result<T, TaskError> {
        self.rx.await.unwrap_or(Err(TaskError::Cancelled))
    }
}

/// 풀 통계
#[derive(Debug, Default)]
struct PoolStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

/// 풀 통계 스냅샷
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatsSnapshot {
    /// 큐에 들어간 작업 수
    pub submitted: u64,
    /// 성공한 작업 수
    pub completed: u64,
    /// 에러나 panic으로 끝난 작업 수
    pub failed: u64,
    /// 예산 부족이나 큐 포화로 거부된 제출 수
    pub rejected: u64,
}

/// 고정 크기 워커 풀
pub struct WorkerPool<J: Job> {
    config: WorkerPoolConfig,
    budget: Arc<MemoryBudget>,
    sender: Mutex<Option<mpsc::Sender<Queued<J>>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<PoolStats>,
}

impl<J: Job> WorkerPool<J> {
    /// 워커를 띄우고 풀을 시작합니다. tokio 런타임 안에서 호출해야 합니다.
    pub fn start(config: WorkerPoolConfig, budget: Arc<MemoryBudget>) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let stats = Arc::new(PoolStats::default());

        let workers = (0..config.worker_count.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                let stats = Arc::clone(&stats);
                tokio::spawn(worker_loop(id, rx, stats))
            })
            .collect();

        info!(
            workers = config.worker_count,
            queue_capacity = config.queue_capacity,
            policy = ?config.queue_policy,
            budget = budget.capacity(),
            "worker pool started"
        );

        Self {
            config,
            budget,
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            stats,
        }
    }

    /// 메모리 예산을 확보한 뒤 작업을 큐에 넣습니다.
    ///
    /// # Errors
    ///
    /// - `BudgetExceeded`: 대기 시간 안에 예산을 확보하지 못함
    /// - `QueueFull`: `Reject` 정책에서 큐가 가득 참
    /// - `Closed`: `stop()` 이후 제출
    pub async fn submit(&self, job: J) -> Result<TaskHandle<J::Output>, SubmitError> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SubmitError::Closed)?;

        let requested = job.admission_bytes();
        let Some(reservation) = self
            .budget
            .reserve(requested, self.config.admission_wait())
            .await
        else {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(m::SCANNER_BUDGET_REJECTIONS_TOTAL).increment(1);
            return Err(SubmitError::BudgetExceeded {
                requested,
                available: self.budget.available(),
                capacity: self.budget.capacity(),
            });
        };

        let (reply, rx) = oneshot::channel();
        let queued = Queued {
            job,
            reservation,
            reply,
        };

        match self.config.queue_policy {
            QueuePolicy::Block => sender
                .send(queued)
                .await
                .map_err(|_| SubmitError::Closed)?,
            QueuePolicy::Reject => sender.try_send(queued).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    SubmitError::QueueFull
                }
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            })?,
        }

        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(TaskHandle { rx })
    }

    /// 큐를 닫고 대기 중이거나 실행 중인 작업이 모두 끝날 때까지 기다립니다.
    ///
    /// 이후 제출은 `Closed`로 실패합니다. 여러 번 호출해도 안전합니다.
    pub async fn stop(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        let workers: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if workers.is_empty() {
            return;
        }

        for handle in workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task ended abnormally");
            }
        }

        let stats = self.stats();
        info!(
            submitted = stats.submitted,
            completed = stats.completed,
            failed = stats.failed,
            rejected = stats.rejected,
            "worker pool stopped"
        );
    }

    /// 풀이 아직 제출을 받는지
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            submitted: self.stats.submitted.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
        }
    }

    /// 공유 메모리 예산
    pub fn budget(&self) -> &Arc<MemoryBudget> {
        &self.budget
    }
}

async fn worker_loop<J: Job>(
    id: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Queued<J>>>>,
    stats: Arc<PoolStats>,
) {
    debug!(worker = id, "worker started");

    loop {
        // 수신 중에만 잠금을 잡고, 실행은 잠금 밖에서
        let next = rx.lock().await.recv().await;
        let Some(Queued {
            job,
            reservation,
            reply,
        }) = next
        else {
            break;
        };

        let started = Instant::now();
        let joined = tokio::task::spawn_blocking(move || {
            let _reservation = reservation;
            job.run()
        })
        .await;
        metrics::histogram!(m::SCANNER_TASK_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        let outcome = match joined {
            Ok(Ok(output)) => {
                stats.completed.fetch_add(1, Ordering::Relaxed);
                Ok(output)
            }
            Ok(Err(e)) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(worker = id, error = %e, "task failed");
                Err(TaskError::Failed(e.to_string()))
            }
            Err(e) if e.is_panic() => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                let message = panic_message(e.into_panic());
                warn!(worker = id, panic = %message, "task panicked");
                Err(TaskError::Panicked(message))
            }
            Err(_) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                Err(TaskError::Cancelled)
            }
        };

        // 핸들을 버린 제출자는 결과를 받지 않음
        let _ = reply.send(outcome);
    }

    debug!(worker = id, "worker stopped");
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
