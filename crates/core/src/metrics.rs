//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다. 레코더(exporter)는 설치하지 않으며,
//! 임베딩하는 쪽에서 원하는 레코더를 설치하면 값이 수집됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `contraband_`
//! - 모듈명: `archive_`, `matcher_`, `scanner_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), `_bytes` (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(contraband_core::metrics::SCANNER_FILES_SCANNED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 아카이브 포맷 레이블 키 (zip, tar, tar.gz, 7z)
pub const LABEL_FORMAT: &str = "format";

/// 검사 이름 레이블 키
pub const LABEL_CHECK: &str = "check";

/// 경고 종류 레이블 키
pub const LABEL_WARNING_KIND: &str = "kind";

// ─── Archive 메트릭 ─────────────────────────────────────────────────

/// Archive: 소비자에게 전달된 엔트리 수 (counter, label: format)
pub const ARCHIVE_ENTRIES_YIELDED_TOTAL: &str = "contraband_archive_entries_yielded_total";

/// Archive: 복구 가능한 에러로 건너뛴 엔트리 수 (counter, label: format)
pub const ARCHIVE_ENTRIES_SKIPPED_TOTAL: &str = "contraband_archive_entries_skipped_total";

/// Archive: 치명적 에러로 중단된 아카이브 수 (counter, label: format)
pub const ARCHIVE_TRUNCATED_TOTAL: &str = "contraband_archive_truncated_total";

// ─── Matcher 메트릭 ─────────────────────────────────────────────────

/// Matcher: 캐시 적중 수 (counter)
pub const MATCHER_CACHE_HITS_TOTAL: &str = "contraband_matcher_cache_hits_total";

/// Matcher: 캐시 미스(오토마톤 빌드) 수 (counter)
pub const MATCHER_CACHE_MISSES_TOTAL: &str = "contraband_matcher_cache_misses_total";

// ─── Scanner 메트릭 ─────────────────────────────────────────────────

/// Scanner: 스캔한 일반 파일 수 (counter)
pub const SCANNER_FILES_SCANNED_TOTAL: &str = "contraband_scanner_files_scanned_total";

/// Scanner: 스캔한 아카이브 엔트리 수 (counter)
pub const SCANNER_ENTRIES_SCANNED_TOTAL: &str = "contraband_scanner_entries_scanned_total";

/// Scanner: 발견된 이슈 수 (counter, label: check)
pub const SCANNER_ISSUES_TOTAL: &str = "contraband_scanner_issues_total";

/// Scanner: 기록된 경고 수 (counter, label: kind)
pub const SCANNER_WARNINGS_TOTAL: &str = "contraband_scanner_warnings_total";

/// Scanner: 메모리 예산 거부 수 (counter)
pub const SCANNER_BUDGET_REJECTIONS_TOTAL: &str = "contraband_scanner_budget_rejections_total";

/// Scanner: 현재 예약된 메모리 (gauge, 바이트)
pub const SCANNER_BUDGET_ALLOCATED_BYTES: &str = "contraband_scanner_budget_allocated_bytes";

/// Scanner: 작업 하나의 실행 시간 (histogram, 초)
pub const SCANNER_TASK_DURATION_SECONDS: &str = "contraband_scanner_task_duration_seconds";

// ─── 히스토그램 버킷 ────────────────────────────────────────────────

/// 작업 실행 시간 히스토그램 버킷 (초)
///
/// 100us ~ 10s 범위 (엔트리 하나의 매칭은 대부분 ms 이하)
pub const TASK_DURATION_BUCKETS: [f64; 10] = [
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 레코더가 설치되지 않은 상태에서 호출해도 안전합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Archive
    describe_counter!(
        ARCHIVE_ENTRIES_YIELDED_TOTAL,
        "Archive entries handed to the consumer"
    );
    describe_counter!(
        ARCHIVE_ENTRIES_SKIPPED_TOTAL,
        "Archive entries skipped after a recoverable read error"
    );
    describe_counter!(
        ARCHIVE_TRUNCATED_TOTAL,
        "Archives whose iteration stopped on a fatal read error"
    );

    // Matcher
    describe_counter!(MATCHER_CACHE_HITS_TOTAL, "Matcher cache hits");
    describe_counter!(
        MATCHER_CACHE_MISSES_TOTAL,
        "Matcher cache misses (automaton builds)"
    );

    // Scanner
    describe_counter!(SCANNER_FILES_SCANNED_TOTAL, "Plain files scanned");
    describe_counter!(SCANNER_ENTRIES_SCANNED_TOTAL, "Archive entries scanned");
    describe_counter!(SCANNER_ISSUES_TOTAL, "Policy issues found");
    describe_counter!(SCANNER_WARNINGS_TOTAL, "Non-fatal scan warnings");
    describe_counter!(
        SCANNER_BUDGET_REJECTIONS_TOTAL,
        "Tasks skipped because the memory budget could not admit them"
    );
    describe_gauge!(
        SCANNER_BUDGET_ALLOCATED_BYTES,
        "Bytes currently reserved from the memory budget"
    );
    describe_histogram!(
        SCANNER_TASK_DURATION_SECONDS,
        "Time spent running one scan task"
    );
}
