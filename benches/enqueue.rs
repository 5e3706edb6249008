use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use csflred::prelude::*;
use std::time::Duration;

/// Enqueue/dequeue pairs against a queue held between the thresholds, so every arrival takes
/// the early drop path.
fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue");
    for (name, curve) in [("linear", DropCurve::Linear), ("fuzzy", DropCurve::Fuzzy)] {
        let config = RedConfig::default().with_curve(curve).with_queue_limit(1000);
        let clock = ManualClock::new();
        let mut backlog = DropTailFifo::unbounded();
        for id in 0..10 {
            backlog.push(Packet::new(PacketId::new(id), 500, Duration::ZERO)).expect("unbounded");
        }
        let mut disc = RedQueueDisc::new(config, backlog, clock.clone(), RngSource::seeded(1)).expect("valid config");

        let mut id = 10;
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                clock.advance(Duration::from_micros(100));
                let verdict = disc.enqueue(Packet::new(PacketId::new(id), 500, clock.now()));
                id += 1;
                if !verdict.is_drop() {
                    disc.dequeue();
                }
                black_box(verdict)
            })
        });
    }
    group.finish();
}

fn bench_fuzzy_inference(c: &mut Criterion) {
    c.bench_function("infer_drop_probability", |b| {
        b.iter(|| {
            csflred::fuzzy::infer_drop_probability(
                black_box(0.85),
                black_box(0.05),
                csflred::fuzzy::MembershipMode::Compat,
            )
        })
    });
}

criterion_group!(benches, bench_enqueue, bench_fuzzy_inference);
criterion_main!(benches);
