#![no_main]

use libfuzzer_sys::fuzz_target;
use contraband_archive::{ContentKind, SNIFF_LEN, sniff, sniff_format};

fuzz_target!(|data: &[u8]| {
    let kind = sniff(data);

    // 판별은 앞부분만 본다
    if data.len() > SNIFF_LEN {
        assert_eq!(kind, sniff(&data[..SNIFF_LEN]));
    }
    if data.is_empty() {
        assert_eq!(kind, ContentKind::Text);
    }

    let _ = sniff_format(data);
});
