//! 키워드 집합 정규화
//!
//! [`PatternSet`]은 매처 캐시의 키입니다. 입력 순서나 대소문자와 무관하게
//! 같은 키워드를 담은 집합은 같은 값이 됩니다.

use std::fmt;

use crate::error::MatcherError;

/// 정규화된 키워드 집합
///
/// 키워드는 앞뒤 공백을 제거하고 소문자로 바꾼 뒤 빈 문자열을 버리고,
/// 중복을 제거하여 정렬된 상태로 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternSet {
    keywords: Vec<String>,
}

impl PatternSet {
    /// 키워드 목록으로 집합을 생성합니다.
    ///
    /// # Errors
    ///
    /// 정규화 후 키워드가 하나도 없으면 [`MatcherError::EmptyPatternSet`]을 반환합니다.
    pub fn new<I, S>(keywords: I) -> Result<Self, MatcherError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();

        if normalized.is_empty() {
            return Err(MatcherError::EmptyPatternSet);
        }

        Ok(Self {
            keywords: normalized,
        })
    }

    /// 정렬된 키워드 슬라이스를 반환합니다.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// 키워드 수
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// 항상 false (빈 집합은 생성할 수 없음)
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.keywords.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_whitespace_and_duplicates() {
        let set = PatternSet::new(["  Password ", "TOKEN", "password", ""]).unwrap();
        assert_eq!(set.keywords(), &["password".to_owned(), "token".to_owned()]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = PatternSet::new(["alpha", "beta", "gamma"]).unwrap();
        let b = PatternSet::new(["gamma", "ALPHA", "beta"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_is_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            PatternSet::new(empty),
            Err(MatcherError::EmptyPatternSet)
        ));
        assert!(matches!(
            PatternSet::new(["", "   "]),
            Err(MatcherError::EmptyPatternSet)
        ));
    }

    #[test]
    fn display_lists_keywords() {
        let set = PatternSet::new(["b", "a"]).unwrap();
        assert_eq!(set.to_string(), "[a, b]");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalization_is_idempotent(words in prop::collection::vec("[a-zA-Z ]{0,12}", 1..20)) {
                if let Ok(set) = PatternSet::new(&words) {
                    let again = PatternSet::new(set.keywords()).unwrap();
                    prop_assert_eq!(set, again);
                }
            }

            #[test]
            fn normalized_keywords_are_sorted_unique_lowercase(words in prop::collection::vec("[a-zA-Z0-9_]{1,12}", 1..20)) {
                let set = PatternSet::new(&words).unwrap();
                for pair in set.keywords().windows(2) {
                    prop_assert!(pair[0] < pair[1]);
                }
                for k in set.keywords() {
                    prop_assert_eq!(k.clone(), k.to_lowercase());
                }
            }

            #[test]
            fn reversed_input_yields_same_set(words in prop::collection::vec("[a-z]{1,8}", 1..20)) {
                let forward = PatternSet::new(&words).unwrap();
                let reversed = PatternSet::new(words.iter().rev()).unwrap();
                prop_assert_eq!(forward, reversed);
            }
        }
    }
}
