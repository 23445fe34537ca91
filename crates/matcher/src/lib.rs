#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`pattern_set`]: 키워드 정규화 (`PatternSet`)
//! - [`matcher`]: Aho-Corasick 매처 (`PatternMatcher`)
//! - [`cache`]: 키워드 집합별 매처 캐시 (`MatcherCache`)
//! - [`error`]: 도메인 에러 타입

pub mod cache;
pub mod error;
pub mod matcher;
pub mod pattern_set;

pub use cache::MatcherCache;
pub use error::MatcherError;
pub use matcher::PatternMatcher;
pub use pattern_set::PatternSet;
