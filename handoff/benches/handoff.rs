use std::hint::black_box;

use handoff::{HandoffQueue, WakeSignal};

fn main() {
    divan::main();
}

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

#[divan::bench(args = [16, 256, 4096])]
fn bench_push_then_drain(bencher: divan::Bencher, batch: usize) {
    let queue = HandoffQueue::new();
    bencher.bench_local(move || {
        for i in 0..batch {
            queue.push(black_box(i));
        }
        black_box(queue.drain_all());
    });
}

#[divan::bench(args = [1, 64, 1024])]
fn bench_push_and_signal(bencher: divan::Bencher, burst: usize) {
    let queue = HandoffQueue::new();
    let signal = WakeSignal::new().unwrap();
    bencher.bench_local(move || {
        for i in 0..burst {
            queue.push(black_box(i));
            black_box(signal.signal().unwrap());
        }
        signal.acknowledge().unwrap();
        black_box(queue.drain_all());
    });
}
