//! 포맷 어댑터: zip, tar(.gz), 7z를 하나의 계약으로 통합
//!
//! 각 어댑터는 [`EntrySource`]를 구현합니다.
//! - `next_candidate`: 다음 엔트리의 메타데이터만 읽습니다.
//! - `read_candidate`: 앞 512 바이트로 판별한 뒤 텍스트일 때만 나머지를 읽습니다.
//!
//! 복구 가능 여부는 포맷이 결정합니다. 임의 접근 포맷(zip, 7z)은 엔트리 단위로
//! 실패를 격리하고, 순차 포맷(tar)은 스트림 위치를 잃으므로 모든 에러가 치명적입니다.

pub mod sevenz;
pub mod tar;
pub mod zip;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::detect::ArchiveFormat;
use crate::error::{ArchiveError, SourceError};
use crate::sniff::{ContentKind, SNIFF_LEN, sniff};

pub use self::sevenz::SevenZSource;
pub use self::tar::TarSource;
pub use self::zip::ZipSource;

/// 엔트리 메타데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 아카이브 내부 경로
    pub name: String,
    /// 선언된 (비압축) 크기
    pub size: u64,
    /// 일반 파일 여부 (디렉토리, 링크 등은 false)
    pub is_file: bool,
    /// 컨테이너 내 순번
    pub index: usize,
}

/// 후보 엔트리 읽기 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sniffed {
    /// 텍스트로 판별되어 전체를 읽음
    Text(Vec<u8>),
    /// 바이너리로 판별되어 나머지를 읽지 않음
    Binary,
}

/// 포맷 어댑터 공통 계약
pub trait EntrySource {
    /// 다음 엔트리의 메타데이터를 반환합니다. 더 없으면 `Ok(None)`.
    fn next_candidate(&mut self) -> Result<Option<Candidate>, SourceError>;

    /// 후보 엔트리의 콘텐츠를 최대 `limit` 바이트까지 읽습니다.
    ///
    /// 순차 포맷은 직전 `next_candidate`가 돌려준 후보만 읽을 수 있습니다.
    fn read_candidate(&mut self, candidate: &Candidate, limit: u64)
    -> Result<Sniffed, SourceError>;
}

/// 형식별 어댑터 디스패치
pub enum FormatSource {
    /// zip
    Zip(ZipSource<BufReader<File>>),
    /// tar 또는 tar.gz
    Tar(TarSource<Box<dyn Read + Send>>),
    /// 7z
    SevenZ(SevenZSource),
}

impl FormatSource {
    /// 형식에 맞는 어댑터로 컨테이너를 엽니다.
    pub fn open(path: &Path, format: ArchiveFormat) -> Result<Self, ArchiveError> {
        match format {
            ArchiveFormat::Zip => Ok(Self::Zip(ZipSource::open(path)?)),
            ArchiveFormat::Tar => {
                let file = open_file(path)?;
                Ok(Self::Tar(TarSource::new(Box::new(BufReader::new(file)))))
            }
            ArchiveFormat::TarGz => {
                let file = open_file(path)?;
                let decoder = GzDecoder::new(BufReader::new(file));
                Ok(Self::Tar(TarSource::new(Box::new(decoder))))
            }
            ArchiveFormat::SevenZ => Ok(Self::SevenZ(SevenZSource::open(path)?)),
        }
    }
}

impl EntrySource for FormatSource {
    fn next_candidate(&mut self) -> Result<Option<Candidate>, SourceError> {
        match self {
            Self::Zip(s) => s.next_candidate(),
            Self::Tar(s) => s.next_candidate(),
            Self::SevenZ(s) => s.next_candidate(),
        }
    }

    fn read_candidate(
        &mut self,
        candidate: &Candidate,
        limit: u64,
    ) -> Result<Sniffed, SourceError> {
        match self {
            Self::Zip(s) => s.read_candidate(candidate, limit),
            Self::Tar(s) => s.read_candidate(candidate, limit),
            Self::SevenZ(s) => s.read_candidate(candidate, limit),
        }
    }
}

pub(crate) fn open_file(path: &Path) -> Result<File, ArchiveError> {
    File::open(path).map_err(|e| ArchiveError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// 앞 [`SNIFF_LEN`] 바이트를 판별하고, 텍스트면 나머지를 `limit`까지 읽습니다.
pub(crate) fn read_sniffed<R: Read + ?Sized>(reader: &mut R, limit: u64) -> io::Result<Sniffed> {
    let mut content = Vec::with_capacity(SNIFF_LEN);
    (&mut *reader)
        .take((SNIFF_LEN as u64).min(limit))
        .read_to_end(&mut content)?;

    if sniff(&content) == ContentKind::Binary {
        return Ok(Sniffed::Binary);
    }

    let remaining = limit.saturating_sub(content.len() as u64);
    (&mut *reader).take(remaining).read_to_end(&mut content)?;
    Ok(Sniffed::Text(content))
}
