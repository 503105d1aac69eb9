// Measures the entry sequence on its own, without the bucket index, so the
// cost of probing can be read off against `probe_map_bench`.
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use probe_map::sequence::{EntryHandle, EntrySequence};
use std::time::Duration;

fn bench_push_back_100k(c: &mut Criterion) {
    c.bench_function("sequence::push_back_100k", |b| {
        b.iter_batched(
            EntrySequence::<u64, u64>::new,
            |mut seq| {
                for i in 0..100_000u64 {
                    seq.push_back(i, i, i);
                }
                black_box(seq)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_every_other_100k(c: &mut Criterion) {
    c.bench_function("sequence::remove_every_other_of_100k", |b| {
        b.iter_batched(
            || {
                let mut seq = EntrySequence::with_capacity(100_000);
                let handles: Vec<EntryHandle> =
                    (0..100_000u64).map(|i| seq.push_back(i, i, i)).collect();
                (seq, handles)
            },
            |(mut seq, handles)| {
                for h in handles.into_iter().step_by(2) {
                    black_box(seq.remove(h));
                }
                black_box(seq)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter_linked_100k(c: &mut Criterion) {
    c.bench_function("sequence::iter_100k", |b| {
        let mut seq = EntrySequence::new();
        for i in 0..100_000u64 {
            seq.push_back(i, i, i);
        }
        b.iter(|| {
            let mut sum = 0u64;
            for (_h, node) in seq.iter() {
                sum = sum.wrapping_add(*node.value());
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_push_back_100k, bench_remove_every_other_100k, bench_iter_linked_100k
}
criterion_main!(benches);
