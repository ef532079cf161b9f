use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dd_core::{Category, Roller, ScoreCard};

fn gen_dice_samples(n: usize) -> Vec<[u8; 5]> {
    let mut roller = Roller::seeded(0x1234_5678_9ABC_DEF0);
    (0..n)
        .map(|_| std::array::from_fn(|_| roller.face()))
        .collect()
}

fn bench_scores_for_dice(c: &mut Criterion) {
    let mut g = c.benchmark_group("dd_core_scoring");
    for &n in &[256usize, 4096usize] {
        let samples = gen_dice_samples(n);
        g.bench_with_input(BenchmarkId::new("scores_for_dice_batch", n), &samples, |b, s| {
            b.iter(|| {
                for &dice in s.iter() {
                    black_box(dd_core::scores_for_dice(black_box(dice)));
                }
            })
        });
    }
    g.finish();
}

fn bench_card_total(c: &mut Criterion) {
    let mut card = ScoreCard::default();
    for (i, cat) in Category::ALL.iter().take(9).enumerate() {
        let _ = card.commit(*cat, (i as u32 + 1) * 3);
    }
    c.bench_function("dd_core_card_total", |b| {
        b.iter(|| black_box(black_box(&card).total()))
    });
}

criterion_group!(benches, bench_scores_for_dice, bench_card_total);
criterion_main!(benches);
