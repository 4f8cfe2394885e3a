//! Producer/consumer workload over a [`BoundedQueue`].
//!
//! [`run`] spawns `producers` threads that each enqueue `items_per_producer`
//! work items and `consumers` threads that dequeue until the queue reports
//! shutdown-and-drained. Once every producer has finished, the queue is shut
//! down, the consumers drain it and exit, and a [`Report`] comparing produced
//! and consumed counts is returned.
//!
//! # Example
//!
//! ```
//! use ringlock::driver::{self, DriverConfig};
//!
//! let config = DriverConfig {
//!     consumers: 2,
//!     producers: 3,
//!     items_per_producer: 100,
//!     queue_capacity: 4,
//!     delay: false,
//! };
//!
//! let report = driver::run(&config).unwrap();
//! assert!(report.is_balanced());
//! assert_eq!(report.consumed, 300);
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use minstant::Instant;
use rand::Rng;

use crate::error::QueueError;
use crate::queue::BoundedQueue;
use crate::trace::{debug, info, warn};

/// Upper bound of the random per-item pause when [`DriverConfig::delay`] is set.
pub const MAX_ITEM_DELAY: Duration = Duration::from_micros(500);

/// Configuration for a driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Number of consumer threads.
    pub consumers: usize,
    /// Number of producer threads.
    pub producers: usize,
    /// Work items enqueued by each producer.
    pub items_per_producer: usize,
    /// Queue capacity.
    pub queue_capacity: usize,
    /// Sleep a random interval (up to [`MAX_ITEM_DELAY`]) around every item,
    /// to shake out different interleavings.
    pub delay: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            consumers: 1,
            producers: 1,
            items_per_producer: 10,
            queue_capacity: 5,
            delay: false,
        }
    }
}

impl DriverConfig {
    /// Total number of items the producers will enqueue.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.producers * self.items_per_producer
    }

    /// Checks that the run can make progress.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConfig`] if there are no producers, no
    /// consumers, or a zero queue capacity.
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.consumers == 0 {
            return Err(DriverError::InvalidConfig(
                "at least one consumer is required".into(),
            ));
        }
        if self.producers == 0 {
            return Err(DriverError::InvalidConfig(
                "at least one producer is required".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(DriverError::InvalidConfig(
                "queue capacity must be positive".into(),
            ));
        }
        if self.producers.checked_mul(self.items_per_producer).is_none() {
            return Err(DriverError::InvalidConfig(
                "total item count overflows".into(),
            ));
        }
        Ok(())
    }
}

/// Error running the driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The configuration cannot make progress.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Bad command-line usage.
    #[error("{0}")]
    Usage(String),
    /// The queue could not be created.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),
    /// A worker thread panicked.
    #[error("worker thread {0} panicked")]
    WorkerPanicked(String),
}

/// One unit of work: the `seq`-th item of producer `producer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub producer: usize,
    pub seq: usize,
}

/// Outcome of a driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Items accepted by the queue.
    pub produced: usize,
    /// Items handed out by the queue.
    pub consumed: usize,
    /// Items consumed by each consumer, indexed by consumer id.
    pub per_consumer: Vec<usize>,
    /// Times a consumer saw a producer's items out of sequence.
    pub order_violations: usize,
    /// Wall time from the first spawn to the last join.
    pub elapsed: Duration,
}

impl Report {
    /// `true` if every produced item was consumed exactly once and no
    /// per-producer ordering was broken.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.produced == self.consumed && self.order_violations == 0
    }
}

#[derive(Debug, Default)]
struct ConsumerStats {
    consumed: usize,
    order_violations: usize,
}

fn pause(delay: bool) {
    if delay {
        let micros = rand::rng().random_range(0..=MAX_ITEM_DELAY.as_micros() as u64);
        thread::sleep(Duration::from_micros(micros));
    }
}

fn produce(queue: &BoundedQueue<WorkItem>, producer: usize, items: usize, delay: bool) -> usize {
    for seq in 0..items {
        pause(delay);
        if queue.enqueue(WorkItem { producer, seq }).is_err() {
            warn!(producer, seq, "queue shut down before producer finished");
            return seq;
        }
    }
    debug!(producer, items, "producer done");
    items
}

fn consume(queue: &BoundedQueue<WorkItem>, producers: usize, delay: bool) -> ConsumerStats {
    let mut stats = ConsumerStats::default();
    // Last sequence number seen from each producer by this consumer.
    let mut last_seq: Vec<Option<usize>> = vec![None; producers];

    while let Some(item) = queue.dequeue() {
        stats.consumed += 1;
        match last_seq.get_mut(item.producer) {
            Some(last) => {
                if last.is_some_and(|prev| item.seq <= prev) {
                    stats.order_violations += 1;
                }
                *last = Some(item.seq);
            }
            None => stats.order_violations += 1,
        }
        pause(delay);
    }
    debug!(consumed = stats.consumed, "consumer done");
    stats
}

fn spawn_worker<R, F>(name: String, f: F) -> Result<JoinHandle<R>, DriverError>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    thread::Builder::new()
        .name(name)
        .spawn(f)
        .map_err(DriverError::Spawn)
}

fn join_worker<R>(handle: JoinHandle<R>) -> Result<R, DriverError> {
    let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
    handle.join().map_err(|_| DriverError::WorkerPanicked(name))
}

/// Runs the configured workload to completion.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the queue cannot be
/// created, a worker thread cannot be spawned, or a worker panics. In every
/// case the queue is shut down first, so no spawned worker stays blocked.
pub fn run(config: &DriverConfig) -> Result<Report, DriverError> {
    config.validate()?;

    let queue = Arc::new(BoundedQueue::new(config.queue_capacity)?);
    let start = Instant::now();

    info!(
        consumers = config.consumers,
        producers = config.producers,
        items = config.total_items(),
        capacity = config.queue_capacity,
        "driver starting"
    );

    let result = spawn_and_join(config, &queue);
    // No-op on success; on failure this releases any worker still parked.
    queue.shutdown();
    let (produced, per_consumer, order_violations) = result?;

    let elapsed = start.elapsed();
    let consumed = per_consumer.iter().sum();
    info!(produced, consumed, ?elapsed, "driver finished");

    Ok(Report {
        produced,
        consumed,
        per_consumer,
        order_violations,
        elapsed,
    })
}

fn spawn_and_join(
    config: &DriverConfig,
    queue: &Arc<BoundedQueue<WorkItem>>,
) -> Result<(usize, Vec<usize>, usize), DriverError> {
    let mut consumers = Vec::with_capacity(config.consumers);
    for id in 0..config.consumers {
        let queue = Arc::clone(queue);
        let producers = config.producers;
        let delay = config.delay;
        consumers.push(spawn_worker(format!("consumer-{id}"), move || {
            consume(&queue, producers, delay)
        })?);
    }

    let mut producers = Vec::with_capacity(config.producers);
    for id in 0..config.producers {
        let queue = Arc::clone(queue);
        let items = config.items_per_producer;
        let delay = config.delay;
        producers.push(spawn_worker(format!("producer-{id}"), move || {
            produce(&queue, id, items, delay)
        })?);
    }

    // Join every producer before reporting a failure so the shutdown below
    // never races a producer that is still enqueueing.
    let mut produced = 0;
    let mut first_error = None;
    for handle in producers {
        match join_worker(handle) {
            Ok(n) => produced += n,
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    queue.shutdown();

    let mut per_consumer = Vec::with_capacity(config.consumers);
    let mut order_violations = 0;
    for handle in consumers {
        match join_worker(handle) {
            Ok(stats) => {
                per_consumer.push(stats.consumed);
                order_violations += stats.order_violations;
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok((produced, per_consumer, order_violations)),
    }
}
