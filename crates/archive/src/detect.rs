//! 아카이브 형식 판별
//!
//! 확장자를 먼저 보고, 확장자로 알 수 없으면 파일 앞부분의 매직 바이트로 판별합니다.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// ustar 매직 위치
const USTAR_MAGIC_OFFSET: usize = 257;

/// 판별에 필요한 헤더 길이
const DETECT_HEADER_LEN: usize = 512;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const SEVENZ_MAGIC: &[u8] = &[0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c];

/// 지원하는 아카이브 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// zip (jar, whl, nupkg 포함)
    Zip,
    /// 비압축 tar
    Tar,
    /// gzip 압축 tar
    TarGz,
    /// 7z
    SevenZ,
}

impl ArchiveFormat {
    /// 메트릭 레이블 및 로그용 이름
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::SevenZ => "7z",
        }
    }

    /// 엔트리 에러를 건너뛰고 계속할 수 있는 임의 접근 포맷인지
    pub const fn is_random_access(self) -> bool {
        matches!(self, Self::Zip | Self::SevenZ)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 파일 이름 접미사로 형식을 판별합니다 (대소문자 무시).
pub fn detect_from_name(name: &str) -> Option<ArchiveFormat> {
    let lower = name.trim_end_matches('/').to_ascii_lowercase();

    // 다중 접미사 먼저
    if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
        return Some(ArchiveFormat::TarGz);
    }
    if lower.ends_with(".tar") {
        return Some(ArchiveFormat::Tar);
    }
    if lower.ends_with(".7z") {
        return Some(ArchiveFormat::SevenZ);
    }
    if [".zip", ".jar", ".whl", ".nupkg"]
        .iter()
        .any(|ext| lower.ends_with(ext))
    {
        return Some(ArchiveFormat::Zip);
    }
    None
}

/// 헤더 바이트의 매직 넘버로 형식을 판별합니다.
///
/// gzip 스트림은 tar.gz로 간주합니다.
pub fn sniff_format(header: &[u8]) -> Option<ArchiveFormat> {
    if header.starts_with(ZIP_MAGIC) || header.starts_with(ZIP_EMPTY_MAGIC) {
        return Some(ArchiveFormat::Zip);
    }
    if header.starts_with(SEVENZ_MAGIC) {
        return Some(ArchiveFormat::SevenZ);
    }
    if header.starts_with(GZIP_MAGIC) {
        return Some(ArchiveFormat::TarGz);
    }
    if header.len() >= USTAR_MAGIC_OFFSET + 5
        && &header[USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + 5] == b"ustar"
    {
        return Some(ArchiveFormat::Tar);
    }
    None
}

/// 경로로 형식을 판별합니다. 확장자 우선, 실패하면 파일 헤더를 읽어 판별합니다.
///
/// 파일을 읽을 수 없으면 `None`을 반환합니다.
pub fn detect_format(path: &Path) -> Option<ArchiveFormat> {
    if let Some(format) = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(detect_from_name)
    {
        return Some(format);
    }

    let file = File::open(path).ok()?;
    let mut header = Vec::with_capacity(DETECT_HEADER_LEN);
    file.take(DETECT_HEADER_LEN as u64)
        .read_to_end(&mut header)
        .ok()?;
    sniff_format(&header)
}
