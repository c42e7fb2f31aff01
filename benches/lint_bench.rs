// Criterion benchmark suite: parse + analyze representative patterns.
//
// Run: cargo bench
// Specific group: cargo bench -- parse
// HTML report: target/criterion/report/index.html

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ferrolint::charclass::simplify_charclass;
use ferrolint::checkers::run_all_checkers;
use ferrolint::flags::PatternFlags;
use ferrolint::parser::parse;

const PATTERNS: &[(&str, &str)] = &[
    ("date", r"(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})"),
    ("ident", r"[A-Za-z_][A-Za-z0-9_]*"),
    ("operators", r"(!=|#|&&|&|\(|\)|\*|\+|,|-|-\.)"),
    ("verbose", "(?x)\n    foo   # leading word\n    [ ]   # one space\n    bar+\n"),
    ("classes", r"[^\s][0-9a-fA-F]{2}[\w.-]+"),
];

// ---------------------------------------------------------------------------
// 1. parse -- tokenizer + tree builder
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, pattern) in PATTERNS {
        group.bench_with_input(BenchmarkId::from_parameter(name), pattern, |b, p| {
            b.iter(|| parse(black_box(p), PatternFlags::empty()).unwrap());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. check -- full checker battery over a prebuilt tree
// ---------------------------------------------------------------------------

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");
    for (name, pattern) in PATTERNS {
        let tree = parse(pattern, PatternFlags::empty()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |b, t| {
            b.iter(|| run_all_checkers(black_box(t), None));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 3. simplify -- minimizer subset search
// ---------------------------------------------------------------------------

fn bench_simplify(c: &mut Criterion) {
    let word: Vec<u32> = ('a'..='z')
        .chain('A'..='Z')
        .chain('0'..='9')
        .map(|ch| ch as u32)
        .chain([95])
        .collect();
    let everything: Vec<u32> = (0..256).collect();
    let scattered: Vec<u32> = (0..256).step_by(3).collect();

    let mut group = c.benchmark_group("simplify");
    for (name, codes) in [
        ("word", &word),
        ("everything", &everything),
        ("scattered", &scattered),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), codes, |b, cs| {
            b.iter(|| simplify_charclass(black_box(cs), false));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_check, bench_simplify);
criterion_main!(benches);
