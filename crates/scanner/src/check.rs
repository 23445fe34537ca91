//! 컴파일된 검사
//!
//! 설정의 검사 정의를 스캔에 바로 쓸 수 있는 형태로 바꿉니다.
//! - 콘텐츠 검사: 키워드 -> [`PatternSet`] -> 캐시된 [`PatternMatcher`], include/exclude -> [`NameFilter`]
//! - 파일 이름 검사: 패턴 -> 대소문자를 무시하는 [`GlobSet`]

use std::collections::BTreeSet;
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use contraband_archive::{NameFilter, base_name};
use contraband_core::config::{ContentCheckConfig, FilenameCheckConfig};
use contraband_core::types::IssueSource;
use contraband_matcher::{MatcherCache, PatternMatcher, PatternSet};

use crate::error::ScannerError;

/// 콘텐츠 키워드 검사
#[derive(Debug)]
pub struct ContentCheck {
    /// 검사 이름
    pub name: String,
    /// 이슈 메시지
    pub message: String,
    /// 이슈 범위
    pub scope: IssueSource,
    names: NameFilter,
    matcher: Arc<PatternMatcher>,
}

impl ContentCheck {
    fn compile(
        index: usize,
        config: &ContentCheckConfig,
        cache: &MatcherCache,
    ) -> Result<Self, ScannerError> {
        let field = |suffix: &str| format!("checks.content[{index}].{suffix}");

        let scope = match config.scope.trim().to_ascii_lowercase().as_str() {
            "file" => IssueSource::File,
            "repository" => IssueSource::Repository,
            other => {
                return Err(ScannerError::Config {
                    field: field("scope"),
                    reason: format!("unknown scope '{other}' (expected file or repository)"),
                });
            }
        };

        let set = PatternSet::new(&config.keywords).map_err(|e| ScannerError::Config {
            field: field("keywords"),
            reason: e.to_string(),
        })?;
        let matcher = cache.get_or_build(&set).map_err(|e| ScannerError::Config {
            field: field("keywords"),
            reason: e.to_string(),
        })?;
        let names = NameFilter::new(&config.include, &config.exclude).map_err(|e| {
            ScannerError::Config {
                field: field("include/exclude"),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            name: config.name.clone(),
            message: issue_message(&config.name, &config.reason, "content matches forbidden keywords"),
            scope,
            names,
            matcher,
        })
    }

    /// 이 이름의 파일이나 엔트리에 검사가 적용되는지
    pub fn applies_to(&self, name: &str) -> bool {
        self.names.allows(name)
    }

    /// 콘텐츠에서 발견된 키워드
    pub fn find(&self, content: &[u8]) -> BTreeSet<String> {
        self.matcher.find_matches(content)
    }

    /// 공유 매처
    pub fn matcher(&self) -> &Arc<PatternMatcher> {
        &self.matcher
    }
}

/// 파일 이름 검사
#[derive(Debug)]
pub struct FilenameCheck {
    /// 검사 이름
    pub name: String,
    /// 이슈 메시지
    pub message: String,
    patterns: Vec<String>,
    set: GlobSet,
}

impl FilenameCheck {
    fn compile(index: usize, config: &FilenameCheckConfig) -> Result<Self, ScannerError> {
        let field = format!("checks.filename[{index}].patterns");
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();

        for pattern in config.patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(false)
                .build()
                .map_err(|e| ScannerError::Config {
                    field: field.clone(),
                    reason: format!("invalid pattern '{pattern}': {e}"),
                })?;
            builder.add(glob);
            patterns.push(pattern.to_owned());
        }

        if patterns.is_empty() {
            return Err(ScannerError::Config {
                field,
                reason: "must contain at least one non-empty pattern".to_owned(),
            });
        }

        let set = builder.build().map_err(|e| ScannerError::Config {
            field,
            reason: e.to_string(),
        })?;

        Ok(Self {
            name: config.name.clone(),
            message: issue_message(&config.name, &config.reason, "file name matches a forbidden pattern"),
            patterns,
            set,
        })
    }

    /// 이름(전체 경로 또는 base name)에 일치하는 패턴
    pub fn matches(&self, name: &str) -> BTreeSet<String> {
        let mut hits = self.set.matches(name);
        let base = base_name(name);
        if base != name {
            hits.extend(self.set.matches(base));
        }
        hits.into_iter().map(|i| self.patterns[i].clone()).collect()
    }
}

/// 한 번의 스캔에 쓰이는 모든 검사
#[derive(Debug, Default)]
pub struct CheckSet {
    /// 콘텐츠 검사
    pub content: Vec<ContentCheck>,
    /// 파일 이름 검사
    pub filename: Vec<FilenameCheck>,
}

impl CheckSet {
    /// 검사 정의를 컴파일합니다. 같은 키워드 집합은 캐시의 매처를 공유합니다.
    pub fn compile(
        content: &[ContentCheckConfig],
        filename: &[FilenameCheckConfig],
        cache: &MatcherCache,
    ) -> Result<Self, ScannerError> {
        let mut seen = BTreeSet::new();
        let names = content
            .iter()
            .map(|c| c.name.as_str())
            .chain(filename.iter().map(|c| c.name.as_str()));
        for name in names {
            if name.trim().is_empty() {
                return Err(ScannerError::Config {
                    field: "checks.name".to_owned(),
                    reason: "must not be empty".to_owned(),
                });
            }
            if !seen.insert(name) {
                return Err(ScannerError::Config {
                    field: "checks.name".to_owned(),
                    reason: format!("duplicate check name '{name}'"),
                });
            }
        }

        Ok(Self {
            content: content
                .iter()
                .enumerate()
                .map(|(i, c)| ContentCheck::compile(i, c, cache))
                .collect::<Result<_, _>>()?,
            filename: filename
                .iter()
                .enumerate()
                .map(|(i, c)| FilenameCheck::compile(i, c))
                .collect::<Result<_, _>>()?,
        })
    }

    /// 이름에 적용되는 콘텐츠 검사의 인덱스
    pub fn applicable(&self, name: &str) -> Vec<usize> {
        self.content
            .iter()
            .enumerate()
            .filter(|(_, c)| c.applies_to(name))
            .map(|(i, _)| i)
            .collect()
    }

    /// 이름에 적용되는 콘텐츠 검사가 하나라도 있는지
    pub fn wants_content(&self, name: &str) -> bool {
        self.content.iter().any(|c| c.applies_to(name))
    }
}

fn issue_message(name: &str, reason: &str, fallback: &str) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        format!("{fallback} ({name})")
    } else {
        reason.to_owned()
    }
}
