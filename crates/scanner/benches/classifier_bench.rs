//! 분류기 벤치마크
//!
//! 기본 패턴 레지스트리로 일치/불일치 라인의 분류 처리량을 측정합니다.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tailguard_core::config::default_patterns;
use tailguard_core::types::SourceId;
use tailguard_scanner::{IncidentClassifier, PatternRegistry};

/// 어떤 패턴에도 일치하지 않는 라인 (가장 흔한 경우, 전체 패턴 평가)
const MISS: &str = "Mar  1 12:00:00 web-01 systemd[1]: Started Session 42 of user deploy.";

/// 첫 카테고리에서 일치
const HIT_FIRST: &str =
    "Mar  1 12:00:01 web-01 sshd[2211]: Failed password for invalid user admin from 203.0.113.9 port 52144 ssh2";

/// 마지막 카테고리에서 일치
const HIT_LAST: &str =
    "203.0.113.50 - - [01/Mar/2026:12:00:02 +0000] \"GET /index.php?id=1 UNION SELECT user,pass FROM users HTTP/1.1\" 200";

fn classifier() -> IncidentClassifier {
    IncidentClassifier::new(Arc::new(
        PatternRegistry::compile(&default_patterns()).unwrap(),
    ))
}

fn bench_single_line(c: &mut Criterion) {
    let classifier = classifier();
    let mut group = c.benchmark_group("classify_line");
    group.throughput(Throughput::Elements(1));

    for (name, line) in [("miss", MISS), ("hit_first", HIT_FIRST), ("hit_last", HIT_LAST)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| classifier.classify(black_box(line)).is_some())
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let classifier = classifier();
    let source = SourceId::local("/var/log/auth.log");
    let mut group = c.benchmark_group("classify_lines");

    for size in [100usize, 1_000, 10_000] {
        // 10%만 일치하는 현실적인 비율
        let lines: Vec<String> = (0..size)
            .map(|i| if i % 10 == 0 { HIT_FIRST } else { MISS }.to_owned())
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &lines, |b, lines| {
            b.iter(|| classifier.classify_lines(&source, black_box(lines)).len())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_line, bench_batch);
criterion_main!(benches);
