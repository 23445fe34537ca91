#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`iterator`]: 선읽기 상태 머신 [`ArchiveEntryIterator`]
//! - [`formats`]: 포맷 어댑터 ([`EntrySource`] 계약과 zip, tar, 7z 구현)
//! - [`filter`]: 크기 제한과 include/exclude glob
//! - [`sniff`]: 텍스트/바이너리 판별
//! - [`detect`]: 확장자와 매직 바이트로 형식 판별
//! - [`error`]: 에러 타입과 복구 가능 여부

pub mod detect;
pub mod entry;
pub mod error;
pub mod filter;
pub mod formats;
pub mod iterator;
pub mod sniff;

pub use detect::{ArchiveFormat, detect_format, detect_from_name, sniff_format};
pub use entry::ArchiveEntry;
pub use error::{ArchiveError, SourceError};
pub use filter::{EntryFilter, NameFilter, NamePredicate, base_name};
pub use formats::{Candidate, EntrySource, FormatSource, Sniffed};
pub use iterator::{ArchiveEntryIterator, IteratorState, SkippedEntry, Termination};
pub use sniff::{ContentKind, SNIFF_LEN, sniff};
