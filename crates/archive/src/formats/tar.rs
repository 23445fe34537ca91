//! 순차 tar 리더
//!
//! 512 바이트 헤더 블록을 하나씩 읽는 전진 전용 리더입니다.
//! 앞 엔트리의 데이터와 패딩은 다음 헤더를 읽기 전에 건너뜁니다.
//!
//! 지원 범위:
//! - ustar / GNU 헤더, ustar `prefix` 필드
//! - GNU long name (`L`), PAX 확장 헤더 (`x`)의 `path` 레코드, 전역 PAX (`g`)는 무시
//! - 8진수 및 base-256 크기 필드
//!
//! 헤더 체크섬 불일치, 잘린 블록, 잘못된 크기 필드는 모두 치명적 에러입니다.
//! 스트림 위치를 신뢰할 수 없으므로 재동기화를 시도하지 않습니다.

use std::io::{self, Read};

use crate::error::{ArchiveError, SourceError};
use crate::formats::{Candidate, EntrySource, Sniffed, read_sniffed};

/// tar 블록 크기
pub const BLOCK_LEN: usize = 512;

/// GNU long name / PAX 레코드 최대 크기
const MAX_METADATA_LEN: u64 = 64 * 1024;

const NAME_RANGE: std::ops::Range<usize> = 0..100;
const SIZE_RANGE: std::ops::Range<usize> = 124..136;
const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;
const TYPEFLAG_OFFSET: usize = 156;
const MAGIC_RANGE: std::ops::Range<usize> = 257..262;
const PREFIX_RANGE: std::ops::Range<usize> = 345..500;

/// 순차 tar 어댑터
pub struct TarSource<R> {
    inner: R,
    /// 지금까지 소비한 바이트 수 (에러 보고용)
    offset: u64,
    /// 현재 엔트리에서 아직 읽지 않은 데이터
    remaining: u64,
    /// 현재 엔트리 데이터 뒤의 패딩
    padding: u64,
    /// 다음 엔트리 순번
    next_index: usize,
    /// 종료 블록을 만났거나 치명적 에러가 발생함
    done: bool,
}

impl<R: Read> TarSource<R> {
    /// 리더를 감쌉니다. 헤더는 `next_candidate`에서 읽습니다.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            remaining: 0,
            padding: 0,
            next_index: 0,
            done: false,
        }
    }

    fn corrupt(&mut self, reason: impl Into<String>) -> SourceError {
        self.done = true;
        SourceError::Fatal(ArchiveError::Corrupt {
            format: "tar",
            offset: self.offset,
            reason: reason.into(),
        })
    }

    fn io_fatal(&mut self, err: io::Error) -> SourceError {
        let reason = err.to_string();
        self.corrupt(reason)
    }

    /// 현재 엔트리의 남은 데이터와 패딩을 건너뜁니다.
    fn skip_remaining(&mut self) -> Result<(), SourceError> {
        let n = self.remaining.saturating_add(self.padding);
        self.remaining = 0;
        self.padding = 0;
        self.skip(n)
    }

    fn skip(&mut self, n: u64) -> Result<(), SourceError> {
        if n == 0 {
            return Ok(());
        }
        let result = io::copy(&mut (&mut self.inner).take(n), &mut io::sink());
        let copied = match result {
            Ok(copied) => copied,
            Err(e) => return Err(self.io_fatal(e)),
        };
        self.offset += copied;
        if copied < n {
            return Err(self.corrupt("unexpected end of stream inside entry data"));
        }
        Ok(())
    }

    /// 헤더 블록 하나를 읽습니다. 블록 경계에서 스트림이 끝나면 `Ok(false)`.
    fn read_block(&mut self, block: &mut [u8; BLOCK_LEN]) -> Result<bool, SourceError> {
        let mut filled = 0;
        while filled < BLOCK_LEN {
            match self.inner.read(&mut block[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => return Err(self.corrupt("truncated header block")),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.io_fatal(e)),
            }
        }
        self.offset += BLOCK_LEN as u64;
        Ok(true)
    }

    /// 메타데이터 엔트리(long name, PAX)의 본문을 읽습니다.
    fn read_metadata(&mut self, size: u64) -> Result<Vec<u8>, SourceError> {
        if size > MAX_METADATA_LEN {
            return Err(self.corrupt(format!("metadata record too large: {size} bytes")));
        }
        let mut buf = Vec::with_capacity(size as usize);
        let result = (&mut self.inner).take(size).read_to_end(&mut buf);
        if let Err(e) = result {
            return Err(self.io_fatal(e));
        }
        self.offset += buf.len() as u64;
        if (buf.len() as u64) < size {
            return Err(self.corrupt("unexpected end of stream inside metadata record"));
        }
        self.skip(pad(size))?;
        Ok(buf)
    }
}

impl<R: Read> EntrySource for TarSource<R> {
    fn next_candidate(&mut self) -> Result<Option<Candidate>, SourceError> {
        if self.done {
            return Ok(None);
        }
        self.skip_remaining()?;

        let mut override_name: Option<String> = None;
        loop {
            let mut block = [0u8; BLOCK_LEN];
            if !self.read_block(&mut block)? {
                self.done = true;
                return Ok(None);
            }
            if block.iter().all(|&b| b == 0) {
                // 종료 마커
                self.done = true;
                return Ok(None);
            }

            if !checksum_matches(&block) {
                return Err(self.corrupt("header checksum mismatch"));
            }
            let Some(size) = parse_size(&block[SIZE_RANGE]) else {
                return Err(self.corrupt("invalid size field"));
            };

            match block[TYPEFLAG_OFFSET] {
                b'L' => {
                    let data = self.read_metadata(size)?;
                    override_name = Some(String::from_utf8_lossy(cstr(&data)).into_owned());
                    continue;
                }
                b'x' => {
                    let data = self.read_metadata(size)?;
                    if let Some(path) = pax_path(&data) {
                        override_name = Some(path);
                    }
                    continue;
                }
                b'g' => {
                    self.skip(size.saturating_add(pad(size)))?;
                    continue;
                }
                _ => {}
            }

            let typeflag = block[TYPEFLAG_OFFSET];
            let name = override_name.take().unwrap_or_else(|| header_name(&block));
            let is_file = matches!(typeflag, b'0' | b'\0' | b'7') && !name.ends_with('/');

            self.remaining = size;
            self.padding = pad(size);
            let index = self.next_index;
            self.next_index += 1;

            return Ok(Some(Candidate {
                name,
                size,
                is_file,
                index,
            }));
        }
    }

    fn read_candidate(
        &mut self,
        candidate: &Candidate,
        limit: u64,
    ) -> Result<Sniffed, SourceError> {
        if candidate.index + 1 != self.next_index {
            return Err(SourceError::Fatal(ArchiveError::Entry {
                name: candidate.name.clone(),
                reason: "tar entries can only be read in stream order".to_owned(),
            }));
        }

        let mut data = (&mut self.inner).take(self.remaining);
        let result = read_sniffed(&mut data, limit);
        let unread = data.limit();
        let consumed = self.remaining - unread;
        self.offset += consumed;
        self.remaining = unread;

        result.map_err(|e| self.io_fatal(e))
    }
}

fn pad(size: u64) -> u64 {
    let rem = size % BLOCK_LEN as u64;
    if rem == 0 { 0 } else { BLOCK_LEN as u64 - rem }
}

fn cstr(field: &[u8]) -> &[u8] {
    match field.iter().position(|&b| b == 0) {
        Some(i) => &field[..i],
        None => field,
    }
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let digits: Vec<u8> = field
        .iter()
        .copied()
        .skip_while(|&b| b == b' ' || b == 0)
        .take_while(|b| (b'0'..=b'7').contains(b))
        .collect();
    digits.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(8)?.checked_add(u64::from(d - b'0'))
    })
}

/// 8진수 또는 GNU base-256 크기 필드
fn parse_size(field: &[u8]) -> Option<u64> {
    if field.first().is_some_and(|&b| b & 0x80 != 0) {
        let mut value: u64 = u64::from(field[0] & 0x7f);
        for &b in &field[1..] {
            value = value.checked_mul(256)?.checked_add(u64::from(b))?;
        }
        return Some(value);
    }
    // 필드 끝에 종료 문자가 없으면 길이가 잘린 값일 수 있음
    let trailing_ok = field
        .iter()
        .skip_while(|&&b| b == b' ' || b == 0)
        .skip_while(|b| (b'0'..=b'7').contains(*b))
        .all(|&b| b == b' ' || b == 0);
    if !trailing_ok {
        return None;
    }
    parse_octal(field)
}

/// 체크섬 필드를 공백으로 간주한 헤더 바이트 합을 비교합니다.
/// 일부 구현이 쓰는 부호 있는 합도 허용합니다.
fn checksum_matches(block: &[u8; BLOCK_LEN]) -> bool {
    let Some(stored) = parse_octal(&block[CHECKSUM_RANGE]) else {
        return false;
    };

    let mut unsigned: u64 = 0;
    let mut signed: i64 = 0;
    for (i, &b) in block.iter().enumerate() {
        let b = if CHECKSUM_RANGE.contains(&i) { b' ' } else { b };
        unsigned += u64::from(b);
        signed += i64::from(b as i8);
    }
    stored == unsigned || i64::try_from(stored).is_ok_and(|s| s == signed)
}

fn header_name(block: &[u8; BLOCK_LEN]) -> String {
    let name = cstr(&block[NAME_RANGE]);
    let prefix = cstr(&block[PREFIX_RANGE]);
    let is_ustar = &block[MAGIC_RANGE] == b"ustar";

    if is_ustar && !prefix.is_empty() {
        let mut full = String::from_utf8_lossy(prefix).into_owned();
        if !full.ends_with('/') {
            full.push('/');
        }
        full.push_str(&String::from_utf8_lossy(name));
        full
    } else {
        String::from_utf8_lossy(name).into_owned()
    }
}

/// PAX 레코드(`"<len> <key>=<value>\n"`)에서 `path` 값을 찾습니다.
///
/// 형식이 어긋나면 그 지점에서 파싱을 멈춥니다.
fn pax_path(data: &[u8]) -> Option<String> {
    let mut path = None;
    let mut rest = data;

    while !rest.is_empty() {
        let space = rest.iter().position(|&b| b == b' ')?;
        let len: usize = std::str::from_utf8(&rest[..space]).ok()?.parse().ok()?;
        if len <= space + 1 || len > rest.len() {
            break;
        }
        let record = &rest[space + 1..len];
        let record = record.strip_suffix(b"\n").unwrap_or(record);
        if let Some(eq) = record.iter().position(|&b| b == b'=') {
            if &record[..eq] == b"path" {
                path = Some(String::from_utf8_lossy(&record[eq + 1..]).into_owned());
            }
        }
        rest = &rest[len..];
    }

    path
}
