//! Multi-threaded tests for the blocking and shutdown behaviour of
//! `BoundedQueue`.
//!
//! # Running with tracing
//!
//! ```bash
//! RUST_LOG=ringlock=debug cargo test --features tracing --test blocking -- --nocapture
//! ```

#![cfg(not(loom))]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Once};
use std::thread;
use std::time::Duration;

use ringlock::{BoundedQueue, Closed, Timeout, TryDequeueError};

static INIT_TRACING: Once = Once::new();

/// Initialize tracing for tests (only once).
fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        ringlock::init_tracing();
    });
}

/// Long enough for a spawned thread to reach its blocking wait.
const SETTLE: Duration = Duration::from_millis(50);

#[test]
fn producer_blocks_until_space() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::new(1).unwrap());
    queue.enqueue(1).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let producer = {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            queue.enqueue(2).unwrap();
            done.store(true, Ordering::Release);
        })
    };

    thread::sleep(SETTLE);
    assert!(!done.load(Ordering::Acquire), "enqueue on a full queue must block");
    assert_eq!(queue.len(), 1);

    assert_eq!(queue.dequeue(), Some(1));
    producer.join().unwrap();
    assert!(done.load(Ordering::Acquire));
    assert_eq!(queue.dequeue(), Some(2));
}

#[test]
fn consumer_blocks_until_item() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::new(4).unwrap());

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.dequeue())
    };

    thread::sleep(SETTLE);
    assert!(!consumer.is_finished(), "dequeue on an empty queue must block");

    queue.enqueue("hello").unwrap();
    assert_eq!(consumer.join().unwrap(), Some("hello"));
}

#[test]
fn shutdown_releases_blocked_consumers() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::<u32>::new(4).unwrap());

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue())
        })
        .collect();

    thread::sleep(SETTLE);
    queue.shutdown();

    for consumer in consumers {
        assert_eq!(consumer.join().unwrap(), None);
    }
    assert!(queue.is_shutdown());
}

#[test]
fn shutdown_releases_blocked_producers_with_their_items() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::new(1).unwrap());
    queue.enqueue(0).unwrap();

    let producers: Vec<_> = (1..=3)
        .map(|value| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.enqueue(value))
        })
        .collect();

    thread::sleep(SETTLE);
    queue.shutdown();

    let mut returned: Vec<i32> = producers
        .into_iter()
        .map(|p| p.join().unwrap().map_err(Closed::into_inner).unwrap_err())
        .collect();
    returned.sort_unstable();
    assert_eq!(returned, vec![1, 2, 3]);

    // The item queued before shutdown is still delivered.
    assert_eq!(queue.dequeue(), Some(0));
    assert_eq!(queue.dequeue(), None);
}

#[test]
fn many_producers_many_consumers_deliver_each_item_once() {
    init_test_tracing();
    const PRODUCERS: u64 = 4;
    const ITEMS: u64 = 2_000;

    let queue = Arc::new(BoundedQueue::new(8).unwrap());
    let start = Arc::new(Barrier::new(PRODUCERS as usize + 4));

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let mut seen = Vec::new();
                while let Some(item) = queue.dequeue() {
                    seen.push(item);
                }
                seen
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for i in 0..ITEMS {
                    queue.enqueue(p * ITEMS + i).unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    queue.shutdown();

    let mut all = HashSet::new();
    for consumer in consumers {
        let seen = consumer.join().unwrap();
        // Each consumer observes every producer's items in production order.
        for p in 0..PRODUCERS {
            let from_p: Vec<u64> = seen.iter().copied().filter(|v| v / ITEMS == p).collect();
            assert!(from_p.windows(2).all(|w| w[0] < w[1]));
        }
        for item in seen {
            assert!(all.insert(item), "item {item} delivered twice");
        }
    }
    assert_eq!(all.len() as u64, PRODUCERS * ITEMS);
    assert!(queue.is_empty());
}

#[test]
fn single_producer_single_consumer_preserve_fifo() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::new(3).unwrap());
    let count = 10_000u64;

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..count {
                queue.enqueue(i).unwrap();
            }
            queue.shutdown();
        })
    };

    let mut received = Vec::with_capacity(count as usize);
    while let Some(item) = queue.dequeue() {
        received.push(item);
    }
    producer.join().unwrap();

    assert_eq!(received, (0..count).collect::<Vec<_>>());
}

#[test]
fn size_never_exceeds_capacity_under_contention() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::new(2).unwrap());
    let max_seen = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let max_seen = Arc::clone(&max_seen);
            thread::spawn(move || {
                for i in 0..500 {
                    queue.enqueue(i).unwrap();
                    max_seen.fetch_max(queue.len(), Ordering::Relaxed);
                }
            })
        })
        .collect();

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut n = 0;
            while queue.dequeue().is_some() {
                n += 1;
            }
            n
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }
    queue.shutdown();

    assert_eq!(consumer.join().unwrap(), 1_500);
    assert!(max_seen.load(Ordering::Relaxed) <= queue.capacity());
}

#[test]
fn dequeue_timeout_wakes_on_arrival() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::new(1).unwrap());

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.dequeue_timeout(Timeout::Duration(Duration::from_secs(10))))
    };

    thread::sleep(SETTLE);
    queue.enqueue(42).unwrap();
    assert_eq!(consumer.join().unwrap(), Ok(42));
}

#[test]
fn dequeue_timeout_released_by_shutdown() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::<u8>::new(1).unwrap());

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.dequeue_timeout(Duration::from_secs(10).into()))
    };

    thread::sleep(SETTLE);
    queue.shutdown();
    assert_eq!(consumer.join().unwrap(), Err(TryDequeueError::Closed));
}

#[test]
fn enqueue_timeout_wakes_on_space() {
    init_test_tracing();
    let queue = Arc::new(BoundedQueue::new(1).unwrap());
    queue.enqueue(1).unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            queue
                .enqueue_timeout(2, Timeout::Duration(Duration::from_secs(10)))
                .is_ok()
        })
    };

    thread::sleep(SETTLE);
    assert_eq!(queue.dequeue(), Some(1));
    assert!(producer.join().unwrap());
    assert_eq!(queue.dequeue(), Some(2));
}
