use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fd_methods::{Douglas, HundsdorferVerwer, Implicit};
use fd_pricing::{
    BlackScholesFiniteDifferenceEngine, BlackScholesGridConfig, BlackScholesOption,
    HestonFiniteDifferenceEngine, HestonGridConfig, HestonOption,
};
use std::hint::black_box;

fn bench_black_scholes(c: &mut Criterion) {
    let option = BlackScholesOption::call(100.0, 99.0, 0.06, 0.04, 1.0);
    let mut group = c.benchmark_group("black_scholes_150");
    let engine =
        BlackScholesFiniteDifferenceEngine::new(option, BlackScholesGridConfig::default())
            .expect("grid should build");

    group.bench_function("implicit", |b| {
        let mut e = engine.clone();
        b.iter(|| black_box(e.run(&Implicit::default(), 1.0 / 150.0).expect("run")))
    });
    group.bench_function("douglas", |b| {
        let mut e = engine.clone();
        b.iter(|| black_box(e.run(&Douglas::default(), 1.0 / 150.0).expect("run")))
    });
    group.finish();
}

fn bench_heston(c: &mut Criterion) {
    let mut group = c.benchmark_group("heston");
    group.sample_size(10);
    for (ns, nv) in [(50, 25), (100, 50), (150, 80)] {
        let config = HestonGridConfig::default().with_size(ns, nv);
        let engine = HestonFiniteDifferenceEngine::new(HestonOption::default(), config)
            .expect("grid should build");

        group.bench_with_input(
            BenchmarkId::new("douglas", format!("{ns}x{nv}")),
            &engine,
            |b, engine| {
                let mut e = engine.clone();
                b.iter(|| black_box(e.run(&Douglas::default(), 1.0 / 100.0).expect("run")))
            },
        );

        let diagonal = engine.diagonalize();
        group.bench_with_input(
            BenchmarkId::new("hundsdorfer_verwer", format!("{ns}x{nv}")),
            &diagonal,
            |b, engine| {
                let mut e = engine.clone();
                b.iter(|| {
                    black_box(
                        e.run(&HundsdorferVerwer::default(), 1.0 / 100.0)
                            .expect("run"),
                    )
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_black_scholes, bench_heston);
criterion_main!(benches);
