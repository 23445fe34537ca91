//! 매처 에러 타입
//!
//! [`MatcherError`]는 키워드 집합 정규화와 오토마톤 빌드에서 발생하는 에러입니다.
//! 두 경우 모두 설정 단계의 문제이므로 `From<MatcherError> for ContrabandError` 변환은
//! core의 [`MatchError`]로 옮겨집니다.

use contraband_core::error::{ContrabandError, MatchError};

/// 매처 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// 정규화 후 키워드가 하나도 남지 않음
    #[error("pattern set is empty after normalization")]
    EmptyPatternSet,

    /// Aho-Corasick 오토마톤 빌드 실패
    #[error("failed to build automaton: {0}")]
    Build(#[from] aho_corasick::BuildError),
}

impl From<MatcherError> for ContrabandError {
    fn from(err: MatcherError) -> Self {
        match err {
            MatcherError::EmptyPatternSet => {
                ContrabandError::Match(MatchError::EmptyPatternSet(err.to_string()))
            }
            MatcherError::Build(_) => ContrabandError::Match(MatchError::BuildFailed(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_display() {
        assert!(MatcherError::EmptyPatternSet.to_string().contains("empty"));
    }

    #[test]
    fn converts_to_contraband_error() {
        let err: ContrabandError = MatcherError::EmptyPatternSet.into();
        assert!(matches!(
            err,
            ContrabandError::Match(MatchError::EmptyPatternSet(_))
        ));
    }
}
