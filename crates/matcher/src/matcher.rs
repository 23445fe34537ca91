//! Aho-Corasick 기반 다중 키워드 매처
//!
//! [`PatternMatcher`]는 [`PatternSet`]의 키워드를 하나의 오토마톤으로 컴파일합니다.
//! 오토마톤은 ASCII 대소문자를 무시하며, 스캔은 입력 길이에 선형입니다.
//! 키워드에 ASCII가 아닌 문자가 있으면 입력도 유니코드 소문자로 바꾼 뒤 스캔합니다.
//! UTF-8이 아닌 구간은 대체 문자로 바뀌므로 그 구간의 비ASCII 키워드는 찾지 못합니다.
//! 빌드 후에는 불변이므로 여러 스레드에서 동시에 사용할 수 있습니다.

use std::borrow::Cow;
use std::collections::BTreeSet;

use aho_corasick::{AhoCorasick, MatchKind};

use crate::error::MatcherError;
use crate::pattern_set::PatternSet;

/// 컴파일된 다중 키워드 매처
#[derive(Debug)]
pub struct PatternMatcher {
    automaton: AhoCorasick,
    keywords: Vec<String>,
    unicode_fold: bool,
}

impl PatternMatcher {
    /// 키워드 집합으로 오토마톤을 빌드합니다.
    pub fn build(set: &PatternSet) -> Result<Self, MatcherError> {
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(set.keywords())?;

        Ok(Self {
            automaton,
            keywords: set.keywords().to_vec(),
            unicode_fold: set.keywords().iter().any(|k| !k.is_ascii()),
        })
    }

    fn fold<'a>(&self, haystack: &'a [u8]) -> Cow<'a, [u8]> {
        if !self.unicode_fold || haystack.is_ascii() {
            return Cow::Borrowed(haystack);
        }
        Cow::Owned(String::from_utf8_lossy(haystack).to_lowercase().into_bytes())
    }

    /// 입력에 등장하는 키워드 집합을 반환합니다.
    ///
    /// 겹치는 등장도 고려합니다 (`"password"`와 `"word"` 모두 보고).
    /// 모든 키워드를 찾으면 입력의 나머지는 스캔하지 않습니다.
    pub fn find_matches(&self, haystack: &[u8]) -> BTreeSet<String> {
        let haystack = self.fold(haystack);
        let mut seen = vec![false; self.keywords.len()];
        let mut remaining = self.keywords.len();

        for m in self.automaton.find_overlapping_iter(haystack.as_ref()) {
            let idx = m.pattern().as_usize();
            if !seen[idx] {
                seen[idx] = true;
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }
        }

        seen.iter()
            .zip(&self.keywords)
            .filter(|(hit, _)| **hit)
            .map(|(_, keyword)| keyword.clone())
            .collect()
    }

    /// 키워드가 하나라도 등장하는지 반환합니다. 첫 매치에서 멈춥니다.
    pub fn has_any_match(&self, haystack: &[u8]) -> bool {
        self.automaton.is_match(self.fold(haystack).as_ref())
    }

    /// 컴파일된 키워드 (정렬됨)
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// 오토마톤이 사용하는 힙 메모리 (바이트)
    pub fn memory_usage(&self) -> usize {
        self.automaton.memory_usage()
    }
}
