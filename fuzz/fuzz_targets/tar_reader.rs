#![no_main]

use libfuzzer_sys::fuzz_target;
use contraband_archive::formats::TarSource;
use contraband_archive::{ArchiveEntryIterator, ArchiveFormat, EntryFilter, IteratorState};

// 손상된 헤더는 Truncated 종료로만 끝나야 하며 패닉은 허용하지 않음
fuzz_target!(|data: &[u8]| {
    let source = TarSource::new(data);
    let mut iter = ArchiveEntryIterator::from_source(
        source,
        ArchiveFormat::Tar,
        "fuzz.tar",
        EntryFilter::new(64 * 1024),
    );

    let mut yielded = 0usize;
    while iter.advance() {
        if let Some(entry) = iter.current() {
            assert!(entry.size <= 64 * 1024);
            yielded += 1;
        }
        // 무한 루프 방지: 입력 512바이트당 엔트리 하나를 넘을 수 없음
        assert!(yielded <= data.len() / 512 + 1);
    }
    assert_eq!(*iter.state(), IteratorState::Exhausted);
    assert!(!iter.is_open());
});
