//! 아카이브 에러 타입
//!
//! [`ArchiveError`]는 컨테이너 열기, 엔트리 읽기, 스트림 손상을 표현합니다.
//! 포맷 어댑터는 여기에 복구 가능 여부를 붙여 [`SourceError`]로 돌려주며,
//! 반복자는 그 구분에 따라 엔트리만 건너뛸지 반복 전체를 끝낼지 정합니다.

use contraband_core::error::{ArchiveError as CoreArchiveError, ConfigError, ContrabandError};

/// 아카이브 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// 컨테이너를 열 수 없음
    #[error("failed to open archive {path}: {reason}")]
    Open {
        /// 아카이브 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 개별 엔트리 읽기 실패
    #[error("failed to read entry '{name}': {reason}")]
    Entry {
        /// 엔트리 이름 (이름을 알 수 없으면 `#index`)
        name: String,
        /// 실패 사유
        reason: String,
    },

    /// 순차 스트림 손상 (헤더 체크섬 불일치, 잘린 블록 등)
    #[error("corrupt {format} stream at offset {offset}: {reason}")]
    Corrupt {
        /// 포맷 이름
        format: &'static str,
        /// 손상 위치 (바이트 오프셋)
        offset: u64,
        /// 손상 내용
        reason: String,
    },

    /// 잘못된 glob 패턴
    #[error("invalid name pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// 문제가 된 패턴
        pattern: String,
        /// 사유
        reason: String,
    },

    /// 아카이브 형식을 판별할 수 없음
    #[error("unrecognized archive format: {0}")]
    UnknownFormat(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 포맷 어댑터가 돌려주는 에러 (복구 가능 여부 포함)
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 해당 엔트리만 건너뛰고 계속할 수 있음 (임의 접근 포맷)
    #[error("recoverable: {0}")]
    Recoverable(ArchiveError),

    /// 남은 엔트리를 더 읽을 수 없음 (순차 포맷)
    #[error("fatal: {0}")]
    Fatal(ArchiveError),
}

impl SourceError {
    /// 복구 가능 여부
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    /// 내부 에러를 꺼냅니다.
    pub fn into_inner(self) -> ArchiveError {
        match self {
            Self::Recoverable(e) | Self::Fatal(e) => e,
        }
    }
}

impl From<ArchiveError> for ContrabandError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Open { .. } => {
                ContrabandError::Archive(CoreArchiveError::OpenFailed(err.to_string()))
            }
            ArchiveError::Entry { .. } | ArchiveError::Corrupt { .. } => {
                ContrabandError::Archive(CoreArchiveError::EntryFailed(err.to_string()))
            }
            ArchiveError::UnknownFormat(_) => {
                ContrabandError::Archive(CoreArchiveError::Unsupported(err.to_string()))
            }
            ArchiveError::InvalidPattern { pattern, reason } => {
                ContrabandError::Config(ConfigError::InvalidValue {
                    field: format!("pattern '{pattern}'"),
                    reason,
                })
            }
            ArchiveError::Io(e) => ContrabandError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_error_display() {
        let err = ArchiveError::Corrupt {
            format: "tar",
            offset: 1024,
            reason: "header checksum mismatch".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tar"));
        assert!(msg.contains("1024"));
        assert!(msg.contains("checksum"));
    }

    #[test]
    fn source_error_recoverability() {
        let rec = SourceError::Recoverable(ArchiveError::Entry {
            name: "a.txt".to_owned(),
            reason: "crc".to_owned(),
        });
        assert!(rec.is_recoverable());
        let fatal = SourceError::Fatal(ArchiveError::UnknownFormat("x".to_owned()));
        assert!(!fatal.is_recoverable());
        assert!(matches!(fatal.into_inner(), ArchiveError::UnknownFormat(_)));
    }

    #[test]
    fn open_error_converts_to_contraband_error() {
        let err: ContrabandError = ArchiveError::Open {
            path: "broken.zip".to_owned(),
            reason: "invalid header".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            ContrabandError::Archive(CoreArchiveError::OpenFailed(_))
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err: ContrabandError = ArchiveError::InvalidPattern {
            pattern: "[".to_owned(),
            reason: "unclosed class".to_owned(),
        }
        .into();
        assert!(err.is_fatal());
    }
}
