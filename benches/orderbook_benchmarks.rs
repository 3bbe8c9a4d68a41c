use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use orderbook_matching_core::{OrderBook, Side};

/// A book with `levels` ask levels above 10_000, ten orders of 10 each
fn setup_deep_book(levels: u64) -> OrderBook {
    let mut book = OrderBook::new("BENCH".to_string());
    for i in 0..levels {
        for _ in 0..10 {
            book.submit_limit_order(Side::Ask, 10_001 + i, 10).unwrap();
        }
    }
    book
}

fn limit_insert_benchmark(c: &mut Criterion) {
    c.bench_function("limit_order_rest", |b| {
        b.iter_batched(
            || setup_deep_book(100),
            |mut book| {
                for i in 0..100u64 {
                    book.submit_limit_order(black_box(Side::Bid), black_box(9_900 + i), 10)
                        .unwrap();
                }
                book
            },
            BatchSize::SmallInput,
        )
    });
}

fn market_sweep_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_sweep");

    // 505 crosses 50 full levels and five orders of the 51st
    for quantity in [10u64, 100, 505] {
        group.bench_with_input(BenchmarkId::from_parameter(quantity), &quantity, |b, &q| {
            b.iter_batched(
                || setup_deep_book(100),
                |mut book| book.submit_market_order(Side::Bid, black_box(q)).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn cancel_benchmark(c: &mut Criterion) {
    c.bench_function("cancel_middle_of_level", |b| {
        b.iter_batched(
            || setup_deep_book(10),
            |mut book| {
                // Ids 5, 15, 25 .. sit in the middle of each level's queue
                for id in (5..100u64).step_by(10) {
                    book.cancel_order(black_box(id)).unwrap();
                }
                book
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    limit_insert_benchmark,
    market_sweep_benchmark,
    cancel_benchmark
);
criterion_main!(benches);
