use bulk_arena::{FixedArena, GenericArena, Sizer, VariableArena};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn append_generic(n: u64) -> u64 {
    let mut arena = GenericArena::<u64>::new().unwrap();
    for i in 0..n {
        arena.append(i).unwrap();
    }
    arena.drain().fold(0u64, |acc, v| acc ^ v)
}

fn append_fixed(n: u64) -> u64 {
    let mut arena = FixedArena::new(8).unwrap();
    let blob = [0u8; 8];
    for _ in 0..n {
        arena.append(&blob).unwrap();
    }
    arena.drain().fold(0u64, |acc, v| acc ^ v.len() as u64)
}

fn append_variable(n: u64) -> u64 {
    let mut arena = VariableArena::new(2).unwrap();
    let blob = [1u8, 2, 3, 4, 5, 6, 7];
    for _ in 0..n {
        arena.append(&blob).unwrap();
    }
    arena.drain().fold(0u64, |acc, v| acc ^ v.len() as u64)
}

fn arena_append_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_append");

    for n in [1_000u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("generic", n), &n, |b, &n| {
            b.iter(|| black_box(append_generic(n)))
        });
        group.bench_with_input(BenchmarkId::new("fixed", n), &n, |b, &n| {
            b.iter(|| black_box(append_fixed(n)))
        });
        group.bench_with_input(BenchmarkId::new("variable", n), &n, |b, &n| {
            b.iter(|| black_box(append_variable(n)))
        });
    }

    group.finish();
}

fn sizer_sequence_benchmark(c: &mut Criterion) {
    c.bench_function("sizer_next_size_1000_calls", |b| {
        b.iter(|| {
            let mut sizer = Sizer::semi_expert(4, 1 << 20, 17).unwrap();
            let mut total = 0u64;
            for _ in 0..1_000 {
                total = total.wrapping_add(sizer.next_size().unwrap());
            }
            black_box(total)
        })
    });
}

criterion_group!(benches, arena_append_benchmark, sizer_sequence_benchmark);
criterion_main!(benches);
