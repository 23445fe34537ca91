//! 메모리 예산 -- 동시에 메모리에 올릴 콘텐츠 총량 제한
//!
//! [`MemoryBudget`]은 `0 <= allocated <= capacity`를 항상 유지합니다.
//! 확인과 할당은 하나의 compare-and-swap 루프에서 일어나므로
//! 여러 워커가 동시에 할당해도 용량을 넘지 않습니다.
//!
//! [`Reservation`]은 drop 시 예약한 바이트를 반환합니다. 작업이 에러로 끝나거나
//! panic해도 반환이 보장됩니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use contraband_core::metrics as m;

/// CAS 기반 메모리 예산
#[derive(Debug)]
pub struct MemoryBudget {
    capacity: u64,
    allocated: AtomicU64,
    /// 반환이 일어날 때 대기 중인 예약 요청을 깨움
    released: Notify,
}

impl MemoryBudget {
    /// 용량을 지정해 예산을 생성합니다.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            allocated: AtomicU64::new(0),
            released: Notify::new(),
        }
    }

    /// 예산 용량
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// 현재 할당된 바이트
    pub fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::Acquire)
    }

    /// 여유 바이트
    pub fn available(&self) -> u64 {
        self.capacity.saturating_sub(self.allocated())
    }

    /// 지금 `bytes`를 할당할 수 있는지 (참고용, 결과는 즉시 낡을 수 있음)
    pub fn can_allocate(&self, bytes: u64) -> bool {
        bytes <= self.available()
    }

    /// `allocated + bytes <= capacity`일 때만 할당합니다.
    pub fn allocate(&self, bytes: u64) -> bool {
        let result = self
            .allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current
                    .checked_add(bytes)
                    .filter(|next| *next <= self.capacity)
            });

        match result {
            Ok(previous) => {
                metrics::gauge!(m::SCANNER_BUDGET_ALLOCATED_BYTES).set((previous + bytes) as f64);
                true
            }
            Err(_) => false,
        }
    }

    /// `bytes`를 반환하고 대기 중인 예약 요청을 깨웁니다.
    ///
    /// 할당량보다 많이 반환해도 0 아래로 내려가지 않습니다.
    pub fn release(&self, bytes: u64) {
        let result = self
            .allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(bytes))
            });
        if let Ok(previous) = result {
            metrics::gauge!(m::SCANNER_BUDGET_ALLOCATED_BYTES)
                .set(previous.saturating_sub(bytes) as f64);
        }
        self.released.notify_waiters();
    }

    /// 즉시 예약을 시도합니다.
    pub fn try_reserve(self: &Arc<Self>, bytes: u64) -> Option<Reservation> {
        self.allocate(bytes).then(|| Reservation {
            budget: Arc::clone(self),
            bytes,
        })
    }

    /// 예약을 시도하고, 여유가 없으면 다른 예약이 반환되기를 최대 `wait` 동안 기다립니다.
    ///
    /// 용량보다 큰 요청은 기다리지 않고 `None`을 반환합니다.
    pub async fn reserve(self: &Arc<Self>, bytes: u64, wait: Duration) -> Option<Reservation> {
        if let Some(reservation) = self.try_reserve(bytes) {
            return Some(reservation);
        }
        if bytes > self.capacity || wait.is_zero() {
            return None;
        }

        debug!(
            requested = bytes,
            available = self.available(),
            "memory budget exhausted, deferring admission"
        );
        let deadline = Instant::now() + wait;

        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            // 재확인 전에 등록해야 그 사이의 반환을 놓치지 않음
            notified.as_mut().enable();

            if let Some(reservation) = self.try_reserve(bytes) {
                return Some(reservation);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_reserve(bytes);
            }
        }
    }
}

/// 예약된 메모리. drop 시 예산에 반환됩니다.
#[derive(Debug)]
#[must_use = "dropping a reservation releases it immediately"]
pub struct Reservation {
    budget: Arc<MemoryBudget>,
    bytes: u64,
}

impl Reservation {
    /// 예약한 바이트
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.budget.release(self.bytes);
    }
}
