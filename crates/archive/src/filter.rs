//! 엔트리 필터: 크기 제한과 include/exclude glob
//!
//! 이름 규칙:
//! - exclude 목록이 비어 있지 않으면 exclude만 적용합니다 (일치하면 거부).
//! - include 목록만 비어 있지 않으면 include에 일치해야 합니다.
//! - 둘 다 비어 있으면 모든 이름이 통과합니다.
//!
//! 패턴은 전체 엔트리 경로와 마지막 경로 컴포넌트(base name) 양쪽에 대해 검사합니다.

use std::fmt;
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::ArchiveError;
use crate::formats::Candidate;

/// include/exclude glob 이름 필터
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl NameFilter {
    /// glob 패턴 목록으로 필터를 생성합니다.
    ///
    /// 빈 문자열 패턴은 무시합니다.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, ArchiveError> {
        Ok(Self {
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    /// 모든 이름을 통과시키는 필터
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// 이름이 필터를 통과하는지 확인합니다.
    pub fn allows(&self, name: &str) -> bool {
        if let Some(exclude) = &self.exclude {
            return !matches_name(exclude, name);
        }
        if let Some(include) = &self.include {
            return matches_name(include, name);
        }
        true
    }
}

/// 엔트리 이름에 대한 추가 조건
pub type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// 아카이브 엔트리 필터
#[derive(Clone)]
pub struct EntryFilter {
    max_entry_size: u64,
    names: NameFilter,
    predicate: Option<NamePredicate>,
}

impl fmt::Debug for EntryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryFilter")
            .field("max_entry_size", &self.max_entry_size)
            .field("names", &self.names)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl EntryFilter {
    /// 크기 제한만 있는 필터를 생성합니다.
    pub fn new(max_entry_size: u64) -> Self {
        Self {
            max_entry_size,
            names: NameFilter::allow_all(),
            predicate: None,
        }
    }

    /// 이름 필터를 지정합니다.
    pub fn with_names(mut self, names: NameFilter) -> Self {
        self.names = names;
        self
    }

    /// 이름 조건을 지정합니다. 조건을 통과하지 못한 엔트리는 읽지 않습니다.
    pub fn with_predicate(mut self, predicate: NamePredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// 엔트리 최대 크기
    pub fn max_entry_size(&self) -> u64 {
        self.max_entry_size
    }

    /// 후보 엔트리가 읽을 대상인지 판단합니다.
    ///
    /// 일반 파일이고, 0 바이트가 아니며, 크기 제한 이하이고, 이름 필터와 이름 조건을
    /// 통과해야 합니다.
    pub fn qualifies(&self, candidate: &Candidate) -> bool {
        candidate.is_file
            && candidate.size > 0
            && candidate.size <= self.max_entry_size
            && self.names.allows(&candidate.name)
            && self
                .predicate
                .as_ref()
                .is_none_or(|predicate| predicate(&candidate.name))
    }
}

fn build_set<S: AsRef<str>>(patterns: &[S]) -> Result<Option<GlobSet>, ArchiveError> {
    let mut builder = GlobSetBuilder::new();
    let mut count = 0usize;

    for pattern in patterns {
        let pattern = pattern.as_ref().trim();
        if pattern.is_empty() {
            continue;
        }
        let glob = Glob::new(pattern).map_err(|e| ArchiveError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
        count += 1;
    }

    if count == 0 {
        return Ok(None);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| ArchiveError::InvalidPattern {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            reason: e.to_string(),
        })
}

fn matches_name(set: &GlobSet, name: &str) -> bool {
    set.is_match(name) || set.is_match(base_name(name))
}

/// 경로의 마지막 컴포넌트. `/`와 `\` 모두 구분자로 취급합니다.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}
