//! 콘텐츠 판별: 앞 512 바이트로 텍스트/바이너리 분류
//!
//! 바이너리로 분류된 엔트리는 전체를 읽지 않고 건너뜁니다.
//! 판별 순서: BOM → 알려진 바이너리 매직 → NUL 바이트 → 제어 문자 비율.
//!
//! `MZ`, `BZh`처럼 출력 가능한 문자만으로 된 매직은 텍스트 파일도 그렇게 시작할 수 있으므로
//! NUL, 제어 문자, 잘못된 UTF-8 중 하나가 함께 있을 때만 바이너리로 봅니다.

/// 판별에 사용하는 최대 바이트 수
pub const SNIFF_LEN: usize = 512;

/// 제어 문자 비율 상한 (백분율). 초과하면 바이너리로 봅니다.
const MAX_CONTROL_PERCENT: usize = 10;

/// 바이너리 매직 시그니처
const BINARY_MAGICS: &[&[u8]] = &[
    b"\x89PNG\r\n\x1a\n",
    b"GIF87a",
    b"GIF89a",
    &[0xff, 0xd8, 0xff],             // JPEG
    b"%PDF-",
    b"PK\x03\x04",                   // zip
    &[0x1f, 0x8b],                   // gzip
    &[0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c], // 7z
    b"BZh",
    &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00], // xz
    b"\x7fELF",
    b"MZ",                           // PE
    &[0xca, 0xfe, 0xba, 0xbe],       // Java class / Mach-O fat
    &[0xcf, 0xfa, 0xed, 0xfe],       // Mach-O 64
    &[0xce, 0xfa, 0xed, 0xfe],       // Mach-O 32
    b"\0asm",                        // wasm
    b"SQLite format 3\0",
    b"RIFF",
    b"OggS",
    b"ID3",
];

/// 콘텐츠 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// 텍스트 (키워드 매칭 대상)
    Text,
    /// 바이너리 (건너뜀)
    Binary,
}

/// 버퍼 앞부분을 보고 텍스트인지 바이너리인지 판별합니다.
///
/// `SNIFF_LEN`보다 긴 입력은 앞부분만 봅니다. 빈 입력은 텍스트입니다.
pub fn sniff(data: &[u8]) -> ContentKind {
    let head = &data[..data.len().min(SNIFF_LEN)];

    // UTF-8 / UTF-16 BOM
    if head.starts_with(&[0xef, 0xbb, 0xbf])
        || head.starts_with(&[0xff, 0xfe])
        || head.starts_with(&[0xfe, 0xff])
    {
        return ContentKind::Text;
    }

    let magic = BINARY_MAGICS.iter().find(|magic| head.starts_with(magic));
    if magic.is_some_and(|magic| !is_printable(magic) || has_binary_evidence(head)) {
        return ContentKind::Binary;
    }

    if head.contains(&0) {
        return ContentKind::Binary;
    }

    let control = head.iter().filter(|&&b| is_suspicious_control(b)).count();
    if control * 100 > head.len() * MAX_CONTROL_PERCENT {
        return ContentKind::Binary;
    }

    ContentKind::Text
}

fn is_printable(magic: &[u8]) -> bool {
    magic.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
}

/// NUL, 의심스러운 제어 문자, 잘못된 UTF-8 (끝에서 잘린 문자는 제외)
fn has_binary_evidence(head: &[u8]) -> bool {
    if head.iter().any(|&b| b == 0 || is_suspicious_control(b)) {
        return true;
    }
    match std::str::from_utf8(head) {
        Ok(_) => false,
        Err(e) => e.error_len().is_some(),
    }
}

fn is_suspicious_control(b: u8) -> bool {
    match b {
        b'\t' | b'\n' | b'\r' | 0x0c | 0x1b => false,
        0x00..=0x1f | 0x7f => true,
        _ => false,
    }
}
