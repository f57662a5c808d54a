use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spritepack_core::prelude::*;

fn generate_sizes(count: usize, min_size: u32, max_size: u32) -> Vec<Option<(u32, u32)>> {
    let mut rng = StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|_| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            Some((w, h))
        })
        .collect()
}

fn bench_heuristics(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_pack");

    for count in [50, 200, 500] {
        let sizes = generate_sizes(count, 8, 96);
        group.throughput(Throughput::Elements(count as u64));

        for (label, heuristic) in [
            ("BAF", MaxRectsHeuristic::BestAreaFit),
            ("BSSF", MaxRectsHeuristic::BestShortSideFit),
            ("BLSF", MaxRectsHeuristic::BestLongSideFit),
            ("BL", MaxRectsHeuristic::BottomLeft),
            ("CP", MaxRectsHeuristic::ContactPoint),
        ] {
            let cfg = BatchConfig {
                padding: 2,
                max_size: 4096,
                force_square: false,
                heuristic,
                size_hint: None,
            };
            group.bench_with_input(BenchmarkId::new(label, count), &sizes, |b, sizes| {
                b.iter(|| black_box(pack_batch(sizes, &cfg)))
            });
        }
    }

    group.finish();
}

fn bench_incremental_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    let sizes = generate_sizes(100, 8, 48);
    let sources = || {
        sizes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|(w, h)| (i, w, h)))
            .map(|(i, w, h)| {
                let pixels = PixelBuffer::from_fn(w, h, |x, y| [x as u8, y as u8, 0, 255]);
                SourceSprite::new(format!("s{}", i), pixels)
            })
            .collect::<Vec<_>>()
    };
    let rebuilder = AtlasRebuilder::new(RebuildConfig::default()).unwrap();
    let existing = rebuilder.rebuild(None, sources()).unwrap().outcome.into_atlas();

    group.bench_function("replace_one_of_100", |b| {
        b.iter(|| {
            let one = vec![SourceSprite::new("s0", PixelBuffer::new(20, 20))];
            black_box(rebuilder.rebuild(Some(&existing), one))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_heuristics, bench_incremental_rebuild);
criterion_main!(benches);
