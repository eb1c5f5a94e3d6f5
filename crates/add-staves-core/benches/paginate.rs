use add_staves_core::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn generate_score(count: usize, min_height: f64, max_height: f64) -> Vec<Block> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let h = rng.gen_range(min_height..=max_height);
            Block::score(format!("system_{}", i), Rect::new(0.0, 0.0, 520.0, h))
        })
        .collect()
}

fn staff() -> Block {
    Block::staff("staves".to_string(), Rect::new(0.0, 0.0, 538.5, 70.0))
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("paginate");

    for count in [50, 200, 1000] {
        let score = generate_score(count, 60.0, 240.0);
        group.throughput(Throughput::Elements(count as u64));

        let modes = [
            ("Auto", Grouping::Auto),
            ("SinglePage", Grouping::SinglePage),
            ("Groups", Grouping::Groups(vec![3, 4, 2, 5])),
        ];
        for (name, grouping) in modes {
            let cfg = LayoutConfig::builder().grouping(grouping).build();
            group.bench_with_input(BenchmarkId::new(name, count), &score, |b, score| {
                b.iter(|| black_box(lay_out(score.clone(), staff(), &cfg)))
            });
        }
    }

    group.finish();
}

fn bench_render_flags(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_flags");
    let score = generate_score(300, 60.0, 240.0);

    let variants = [
        ("justified", LayoutConfig::builder().build()),
        ("ragged", LayoutConfig::builder().ragged(true).build()),
        (
            "drop_shift_above",
            LayoutConfig::builder()
                .drop_first(true)
                .drop_last(true)
                .shift(12.0)
                .staff_position(StaffPosition::Above)
                .build(),
        ),
    ];
    for (name, cfg) in variants {
        group.bench_function(name, |b| {
            b.iter(|| black_box(lay_out(score.clone(), staff(), &cfg)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grouping, bench_render_flags);
criterion_main!(benches);
