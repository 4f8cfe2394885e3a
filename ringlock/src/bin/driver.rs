//! Producer/consumer driver for the bounded queue.
//!
//! Spawns producer and consumer threads around one shared queue, shuts the
//! queue down once the producers finish, and checks that every produced item
//! was consumed.
//!
//! # Usage
//!
//! ```sh
//! ringlock-driver -c 4 -p 4 -i 1000 -s 8 -d
//! ```
//!
//! Exits with status 1 on a usage error and status 2 if the produced and
//! consumed counts disagree.

use ringlock::driver::{self, DriverConfig, DriverError};

fn main() {
    ringlock::init_tracing();

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("ringlock-driver: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool, DriverError> {
    let args: Vec<String> = std::env::args().collect();
    let Some(config) = parse_args(&args)? else {
        print_usage();
        return Ok(true);
    };

    eprintln!(
        "ringlock-driver: {} producer(s) x {} item(s), {} consumer(s), queue size {}{}",
        config.producers,
        config.items_per_producer,
        config.consumers,
        config.queue_capacity,
        if config.delay { ", with delay" } else { "" }
    );

    let report = driver::run(&config)?;

    println!("produced: {}", report.produced);
    println!("consumed: {}", report.consumed);
    for (id, count) in report.per_consumer.iter().enumerate() {
        println!("  consumer-{id}: {count}");
    }
    if report.order_violations > 0 {
        println!("order violations: {}", report.order_violations);
    }
    println!("elapsed: {:.3?}", report.elapsed);

    if !report.is_balanced() {
        eprintln!("ringlock-driver: produced and consumed counts do not match");
    }
    Ok(report.is_balanced())
}

/// Parses command line arguments into a `DriverConfig`.
///
/// Returns `Ok(None)` when help was requested.
fn parse_args(args: &[String]) -> Result<Option<DriverConfig>, DriverError> {
    let mut config = DriverConfig::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--consumers" | "-c" => config.consumers = parse_count(args, &mut i)?,
            "--producers" | "-p" => config.producers = parse_count(args, &mut i)?,
            "--items" | "-i" => config.items_per_producer = parse_count(args, &mut i)?,
            "--size" | "-s" => config.queue_capacity = parse_count(args, &mut i)?,
            "--delay" | "-d" => config.delay = true,
            "--help" | "-h" => return Ok(None),
            arg => return Err(DriverError::Usage(format!("unknown argument: {arg}"))),
        }
        i += 1;
    }

    Ok(Some(config))
}

/// Reads the numeric value following the flag at `args[*i]`.
fn parse_count(args: &[String], i: &mut usize) -> Result<usize, DriverError> {
    let flag = &args[*i];
    *i += 1;
    let value = args
        .get(*i)
        .ok_or_else(|| DriverError::Usage(format!("missing value for {flag}")))?;
    value
        .parse()
        .map_err(|e| DriverError::Usage(format!("invalid value for {flag}: {value} ({e})")))
}

fn print_usage() {
    eprintln!(
        r#"ringlock-driver - bounded queue producer/consumer driver

USAGE:
    ringlock-driver [OPTIONS]

OPTIONS:
    -c, --consumers <N>   Number of consumer threads (default: 1)
    -p, --producers <N>   Number of producer threads (default: 1)
    -i, --items <N>       Items produced by each producer (default: 10)
    -s, --size <N>        Queue capacity (default: 5)
    -d, --delay           Sleep a random interval around every item
    -h, --help            Print this help message

ENVIRONMENT:
    RUST_LOG              Log filter when built with --features tracing

EXAMPLE:
    ringlock-driver -c 4 -p 4 -i 1000 -s 8 -d
"#
    );
}
