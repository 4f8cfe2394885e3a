//! Bounded queue throughput and latency benchmark.
//!
//! Usage:
//!     cargo run --release --bin queue_bench
//!
//! Environment variables:
//!     PRODUCER_CPU=0  Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2  Pin consumer to CPU 2 (default: 2)

use std::env;
use std::hint;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use minstant::Instant;
use ringlock::BoundedQueue;

const QUEUE_SIZE: usize = 1 << 10;
const ITERATIONS: usize = 1 << 20;

type Payload = i32;

fn get_cpu_affinity() -> (Option<usize>, Option<usize>) {
    let producer_cpu = env::var("PRODUCER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(0));
    let consumer_cpu = env::var("CONSUMER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(2));
    (producer_cpu, consumer_cpu)
}

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn new_queue() -> Arc<BoundedQueue<Payload>> {
    Arc::new(BoundedQueue::new(QUEUE_SIZE).expect("benchmark queue size is non-zero"))
}

fn wait_ready(ready: &AtomicBool) {
    while !ready.load(Ordering::Acquire) {
        hint::spin_loop();
    }
}

fn bench_throughput(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let queue = new_queue();
    let ready = Arc::new(AtomicBool::new(false));

    let consumer_thread = {
        let queue = Arc::clone(&queue);
        let ready = Arc::clone(&ready);
        std::thread::spawn(move || {
            pin_to_cpu(consumer_cpu);
            ready.store(true, Ordering::Release);

            let mut expected: Payload = 0;
            while let Some(value) = queue.dequeue() {
                assert_eq!(value, expected, "data corruption");
                expected += 1;
            }
            expected as usize
        })
    };

    wait_ready(&ready);
    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..ITERATIONS as Payload {
        queue.enqueue(i).expect("queue shut down during benchmark");
    }
    queue.shutdown();

    let received = consumer_thread.join().unwrap();
    let elapsed = start.elapsed();
    assert_eq!(received, ITERATIONS);

    let ops_per_ms = ITERATIONS as u128 * 1_000_000 / elapsed.as_nanos().max(1);
    println!("{ops_per_ms} ops/ms");
}

fn bench_rtt(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let ping = new_queue();
    let pong = new_queue();
    let ready = Arc::new(AtomicBool::new(false));

    let responder = {
        let ping = Arc::clone(&ping);
        let pong = Arc::clone(&pong);
        let ready = Arc::clone(&ready);
        std::thread::spawn(move || {
            pin_to_cpu(consumer_cpu);
            ready.store(true, Ordering::Release);

            while let Some(value) = ping.dequeue() {
                pong.enqueue(value).expect("pong queue shut down");
            }
        })
    };

    wait_ready(&ready);
    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..ITERATIONS as Payload {
        ping.enqueue(i).expect("ping queue shut down");
        assert_eq!(pong.dequeue(), Some(i));
    }

    let elapsed = start.elapsed();
    ping.shutdown();
    responder.join().unwrap();

    let rtt_ns = elapsed.as_nanos() / ITERATIONS as u128;
    println!("{rtt_ns} ns RTT");
}

fn main() {
    ringlock::init_tracing();
    let (producer_cpu, consumer_cpu) = get_cpu_affinity();

    println!("ringlock BoundedQueue (size={QUEUE_SIZE}, iters={ITERATIONS}):");
    bench_throughput(producer_cpu, consumer_cpu);
    bench_rtt(producer_cpu, consumer_cpu);
}
