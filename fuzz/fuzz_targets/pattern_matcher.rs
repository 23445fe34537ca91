#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use contraband_matcher::{PatternMatcher, PatternSet};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 키워드 목록 (최대 16개로 제한)
    keywords: Vec<String>,
    /// 검색 대상
    haystack: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let keywords: Vec<String> = input.keywords.into_iter().take(16).collect();

    // 빈 집합은 에러로 거부되어야 함
    let Ok(set) = PatternSet::new(&keywords) else {
        return;
    };
    let Ok(matcher) = PatternMatcher::build(&set) else {
        return;
    };

    let found = matcher.find_matches(&input.haystack);

    // 발견된 키워드는 모두 정규화된 집합의 원소
    for keyword in &found {
        assert!(set.keywords().contains(keyword));
    }
    assert_eq!(!found.is_empty(), matcher.has_any_match(&input.haystack));

    // 같은 입력은 같은 결과
    assert_eq!(found, matcher.find_matches(&input.haystack));
});
