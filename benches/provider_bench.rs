use std::io::Write;

use bulk_arena::{ClosingStrategy, FileChannelProvider, OpenOptions};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn rw_create() -> OpenOptions {
    OpenOptions {
        read: true,
        write: true,
        create: true,
        truncate: true,
        ..Default::default()
    }
}

fn request_release_cycles(strategy_delay_ms: i64, n: u64) {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "bulk-arena-bench-{}-{}",
        std::process::id(),
        strategy_delay_ms
    ));
    let provider = FileChannelProvider::new(strategy_delay_ms, rw_create());

    for _ in 0..n {
        let mut f = provider.request(Some(&path)).unwrap().unwrap();
        f.write_all(b"x").unwrap();
        provider.release(Some(&path)).unwrap();
    }

    provider.shutdown().unwrap();
    let _ = std::fs::remove_file(&path);
}

fn provider_cycle_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("provider_request_release");

    for delay_ms in [-1i64, 0] {
        let label = match ClosingStrategy::from_delay_ms(delay_ms) {
            ClosingStrategy::KeepOpen => "keep_open",
            ClosingStrategy::CloseImmediately => "close_immediately",
            ClosingStrategy::LazyClose { .. } => "lazy_close",
        };
        group.bench_with_input(BenchmarkId::new(label, delay_ms), &delay_ms, |b, &delay_ms| {
            b.iter(|| black_box(request_release_cycles(delay_ms, 200)))
        });
    }

    group.finish();
}

criterion_group!(benches, provider_cycle_benchmark);
criterion_main!(benches);
