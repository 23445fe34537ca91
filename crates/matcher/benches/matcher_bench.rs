//! 키워드 매처 벤치마크
//!
//! 키워드 수와 입력 크기에 따른 매칭 성능, 캐시 조회 비용을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use contraband_matcher::{MatcherCache, PatternMatcher, PatternSet};

fn keywords(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("keyword_{i:04}")).collect()
}

fn haystack(len: usize) -> Vec<u8> {
    let line = b"lorem ipsum dolor sit amet, consectetur adipiscing elit\n";
    line.iter().copied().cycle().take(len).collect()
}

fn bench_find_matches_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_matches_keywords");
    let input = haystack(64 * 1024);
    group.throughput(Throughput::Bytes(input.len() as u64));

    for n in [1usize, 10, 100, 1000] {
        let set = PatternSet::new(keywords(n)).unwrap();
        let matcher = PatternMatcher::build(&set).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| matcher.find_matches(black_box(&input)))
        });
    }

    group.finish();
}

fn bench_input_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_any_match_input");
    let set = PatternSet::new(["password", "secret_key", "api_key"]).unwrap();
    let matcher = PatternMatcher::build(&set).unwrap();

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let input = haystack(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| matcher.has_any_match(black_box(input)))
        });
    }

    group.finish();
}

fn bench_cache_lookup(c: &mut Criterion) {
    let cache = MatcherCache::new();
    let set = PatternSet::new(keywords(50)).unwrap();
    cache.get_or_build(&set).unwrap();

    c.bench_function("cache_hit", |b| {
        b.iter(|| cache.get_or_build(black_box(&set)).unwrap())
    });
}

fn bench_build(c: &mut Criterion) {
    let set = PatternSet::new(keywords(100)).unwrap();
    c.bench_function("build_100_keywords", |b| {
        b.iter(|| PatternMatcher::build(black_box(&set)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_find_matches_scaling,
    bench_input_size,
    bench_cache_lookup,
    bench_build
);
criterion_main!(benches);
