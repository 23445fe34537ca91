//! 반복자가 소비자에게 넘기는 엔트리

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::detect::ArchiveFormat;
use crate::filter::base_name;

/// 필터와 콘텐츠 판별을 통과해 전체가 읽힌 아카이브 엔트리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// 아카이브 내부 경로
    pub name: String,
    /// 읽은 콘텐츠 크기 (바이트)
    pub size: u64,
    /// 콘텐츠
    pub content: Bytes,
    /// 컨테이너 형식
    pub format: ArchiveFormat,
    /// 컨테이너 파일 경로
    pub archive_path: PathBuf,
}

impl ArchiveEntry {
    /// 읽은 콘텐츠로 엔트리를 생성합니다. `size`는 콘텐츠 길이입니다.
    pub fn new(
        name: impl Into<String>,
        content: impl Into<Bytes>,
        format: ArchiveFormat,
        archive_path: impl AsRef<Path>,
    ) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
            format,
            archive_path: archive_path.as_ref().to_path_buf(),
        }
    }

    /// 엔트리 경로의 마지막 컴포넌트
    pub fn base_name(&self) -> &str {
        base_name(&self.name)
    }

    /// `archive.zip!/dir/file.txt` 형태의 표시용 위치
    pub fn location(&self) -> String {
        format!("{}!/{}", self.archive_path.display(), self.name)
    }
}
