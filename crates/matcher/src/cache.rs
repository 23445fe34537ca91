//! 매처 캐시: 키워드 집합별 오토마톤 재사용
//!
//! [`MatcherCache`]는 같은 [`PatternSet`]에 대한 오토마톤을 정확히 한 번만 빌드합니다.
//! 읽기 잠금으로 빠른 경로를 처리하고, 미스가 나면 쓰기 잠금 아래에서
//! 다시 확인한 뒤 빌드합니다. 전역 상태가 아니므로 오케스트레이터에 주입해서 사용합니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use contraband_core::metrics as m;

use crate::error::MatcherError;
use crate::matcher::PatternMatcher;
use crate::pattern_set::PatternSet;

/// 키워드 집합 → 컴파일된 매처 캐시
#[derive(Debug, Default)]
pub struct MatcherCache {
    entries: RwLock<HashMap<PatternSet, Arc<PatternMatcher>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MatcherCache {
    /// 빈 캐시를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 캐시된 매처를 반환하거나, 없으면 빌드하여 저장한 뒤 반환합니다.
    ///
    /// 여러 스레드가 동시에 같은 집합을 요청해도 빌드는 한 번만 일어나며
    /// 모두 같은 `Arc`를 받습니다.
    pub fn get_or_build(&self, set: &PatternSet) -> Result<Arc<PatternMatcher>, MatcherError> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(matcher) = entries.get(set) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::MATCHER_CACHE_HITS_TOTAL).increment(1);
                return Ok(Arc::clone(matcher));
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // 잠금을 기다리는 동안 다른 스레드가 빌드했을 수 있음
        if let Some(matcher) = entries.get(set) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(m::MATCHER_CACHE_HITS_TOTAL).increment(1);
            return Ok(Arc::clone(matcher));
        }

        let matcher = Arc::new(PatternMatcher::build(set)?);
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::MATCHER_CACHE_MISSES_TOTAL).increment(1);
        debug!(
            keywords = set.len(),
            memory = matcher.memory_usage(),
            "built keyword matcher"
        );
        entries.insert(set.clone(), Arc::clone(&matcher));
        Ok(matcher)
    }

    /// 캐시된 매처 수
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 캐시가 비어 있는지
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 모든 매처를 제거합니다. 이미 발급된 `Arc`는 계속 유효합니다.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// 캐시 적중 수
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// 캐시 미스(빌드) 수
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
