//! Integration tests for asynchronous loggers and the thread pool
//!
//! These tests verify:
//! - OverrunOldest evicts the oldest log jobs and never evicts flushes
//! - Block preserves per-producer order and applies backpressure
//! - BlockWithTimeout discards after the bound and reports it
//! - Shutdown drains pending jobs and rejects later ones

mod common;

use common::{CaptureSink, GateSink, GATE};
use parking_lot::Mutex;
use rust_async_logger::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn async_logger(
    name: &str,
    sinks: Vec<SinkPtr>,
    pool: &Arc<ThreadPool>,
    policy: OverflowPolicy,
) -> Logger {
    Logger::builder(name)
        .sinks(sinks)
        .thread_pool(Arc::clone(pool))
        .overflow_policy(policy)
        .build()
}

fn error_collector(logger: &Logger) -> Arc<Mutex<Vec<String>>> {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = Arc::clone(&errors);
    logger.set_error_handler(Arc::new(move |_, err| {
        errors_clone.lock().push(err.to_string());
    }));
    errors
}

#[test]
fn test_overrun_oldest_keeps_newest() {
    let pool = Arc::new(ThreadPool::new(2, 1).unwrap());
    let gate = Arc::new(GateSink::new());
    let lost = Arc::new(Mutex::new(Vec::new()));
    let lost_clone = Arc::clone(&lost);

    let logger = Logger::builder("overrun")
        .shared_sink(gate.clone())
        .thread_pool(Arc::clone(&pool))
        .overflow_policy(OverflowPolicy::OverrunOldest)
        .on_overflow(Arc::new(move |count| lost_clone.lock().push(count)))
        .build();

    logger.info(GATE);
    gate.wait_entered();

    for message in ["A", "B", "C", "D"] {
        logger.info(message);
    }

    assert_eq!(pool.queue_size(), 2);
    assert_eq!(pool.overrun_counter(), 2);
    assert_eq!(*lost.lock(), vec![1, 2]);

    gate.release();
    assert!(pool.shutdown());
    assert_eq!(gate.messages(), vec![GATE, "C", "D"]);

    pool.reset_overrun_counter();
    assert_eq!(pool.overrun_counter(), 0);
}

#[test]
fn test_flush_is_never_evicted() {
    let pool = Arc::new(ThreadPool::new(2, 1).unwrap());
    let gate: Arc<GateSink> = Arc::new(GateSink::new());
    let capture = Arc::new(CaptureSink::new());
    let logger = async_logger(
        "flush-protected",
        vec![gate.clone() as SinkPtr, capture.clone() as SinkPtr],
        &pool,
        OverflowPolicy::OverrunOldest,
    );

    logger.info(GATE);
    gate.wait_entered();

    logger.flush().unwrap();
    for message in ["A", "B", "C"] {
        logger.info(message);
    }
    assert_eq!(pool.overrun_counter(), 2);

    gate.release();
    assert!(pool.shutdown());
    assert_eq!(capture.messages(), vec![GATE, "C"]);
    assert_eq!(capture.flushes(), 1);
}

#[test]
fn test_overrun_drops_incoming_when_only_flushes_queued() {
    let pool = Arc::new(ThreadPool::new(1, 1).unwrap());
    let gate = Arc::new(GateSink::new());
    let lost = Arc::new(AtomicU64::new(0));
    let lost_clone = Arc::clone(&lost);
    let logger = Arc::new(
        Logger::builder("flush-only")
            .shared_sink(gate.clone())
            .thread_pool(Arc::clone(&pool))
            .overflow_policy(OverflowPolicy::OverrunOldest)
            .on_overflow(Arc::new(move |count| lost_clone.store(count, Ordering::SeqCst)))
            .build(),
    );

    logger.info(GATE);
    gate.wait_entered();
    logger.flush().unwrap();

    let producer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || logger.info("after flush"))
    };
    thread::sleep(Duration::from_millis(100));
    assert!(producer.is_finished(), "producer waited for queue space");
    producer.join().unwrap();

    assert_eq!(pool.queue_size(), 1);
    assert_eq!(pool.overrun_counter(), 1);
    assert_eq!(lost.load(Ordering::SeqCst), 1);

    gate.release();
    assert!(pool.shutdown());
    assert_eq!(gate.messages(), vec![GATE]);
}

#[test]
fn test_overrun_merges_flush_into_queued_flush() {
    let pool = Arc::new(ThreadPool::new(1, 1).unwrap());
    let gate: Arc<GateSink> = Arc::new(GateSink::new());
    let capture = Arc::new(CaptureSink::new());
    let logger = Arc::new(async_logger(
        "merged-flush",
        vec![gate.clone() as SinkPtr, capture.clone() as SinkPtr],
        &pool,
        OverflowPolicy::OverrunOldest,
    ));

    logger.info(GATE);
    gate.wait_entered();
    logger.flush().unwrap();

    let waiter = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || logger.flush_and_wait(WAIT))
    };
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pool.queue_size(), 1);
    assert_eq!(pool.overrun_counter(), 0);

    gate.release();
    waiter.join().unwrap().unwrap();
    assert!(pool.shutdown());
    assert_eq!(capture.flushes(), 1);
}

#[test]
fn test_overrun_flush_of_other_logger_takes_extra_slot() {
    let pool = Arc::new(ThreadPool::new(1, 1).unwrap());
    let gate = Arc::new(GateSink::new());
    let first = async_logger(
        "first",
        vec![gate.clone() as SinkPtr],
        &pool,
        OverflowPolicy::OverrunOldest,
    );
    let other_capture = Arc::new(CaptureSink::new());
    let second = Arc::new(async_logger(
        "second",
        vec![other_capture.clone() as SinkPtr],
        &pool,
        OverflowPolicy::OverrunOldest,
    ));

    first.info(GATE);
    gate.wait_entered();
    first.flush().unwrap();

    let producer = {
        let second = Arc::clone(&second);
        thread::spawn(move || second.flush())
    };
    thread::sleep(Duration::from_millis(100));
    assert!(producer.is_finished(), "flush waited for queue space");
    producer.join().unwrap().unwrap();
    assert_eq!(pool.queue_size(), 2);

    // Log jobs never go past capacity
    second.info("dropped");
    assert_eq!(pool.queue_size(), 2);
    assert_eq!(pool.overrun_counter(), 1);

    gate.release();
    assert!(pool.shutdown());
    assert_eq!(other_capture.flushes(), 1);
    assert!(other_capture.messages().is_empty());
}

#[test]
fn test_block_preserves_producer_order() {
    let pool = Arc::new(ThreadPool::new(8, 1).unwrap());
    let capture = Arc::new(CaptureSink::new());
    let logger = async_logger(
        "ordered",
        vec![capture.clone() as SinkPtr],
        &pool,
        OverflowPolicy::Block,
    );

    let expected: Vec<String> = (0..500).map(|i| format!("msg-{}", i)).collect();
    for message in &expected {
        logger.info(message.as_str());
    }
    logger.flush_and_wait(WAIT).unwrap();

    assert_eq!(capture.messages(), expected);
    assert_eq!(pool.overrun_counter(), 0);
    assert_eq!(pool.discard_counter(), 0);
}

#[test]
fn test_block_applies_backpressure() {
    let pool = Arc::new(ThreadPool::new(1, 1).unwrap());
    let gate = Arc::new(GateSink::new());
    let logger = Arc::new(async_logger(
        "backpressure",
        vec![gate.clone() as SinkPtr],
        &pool,
        OverflowPolicy::Block,
    ));

    logger.info(GATE);
    gate.wait_entered();
    logger.info("queued");

    let producer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || logger.info("blocked"))
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished());

    gate.release();
    producer.join().unwrap();
    logger.flush_and_wait(WAIT).unwrap();

    assert_eq!(gate.messages(), vec![GATE, "queued", "blocked"]);
    assert!(pool.metrics().block_events() >= 1);
    assert_eq!(pool.metrics().lost_count(), 0);
}

#[test]
fn test_block_with_timeout_discards() {
    let pool = Arc::new(ThreadPool::new(1, 1).unwrap());
    let gate = Arc::new(GateSink::new());
    let overflow_count = Arc::new(AtomicU64::new(0));
    let overflow_clone = Arc::clone(&overflow_count);

    let logger = Logger::builder("bounded")
        .shared_sink(gate.clone())
        .thread_pool(Arc::clone(&pool))
        .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_millis(20)))
        .on_overflow(Arc::new(move |count| overflow_clone.store(count, Ordering::SeqCst)))
        .build();
    let errors = error_collector(&logger);

    logger.info(GATE);
    gate.wait_entered();
    logger.info("fits");
    logger.info("discarded");

    assert_eq!(pool.discard_counter(), 1);
    assert_eq!(overflow_count.load(Ordering::SeqCst), 1);
    assert_eq!(errors.lock().len(), 1);
    assert!(errors.lock()[0].contains("queue full"));

    gate.release();
    assert!(pool.shutdown());
    assert_eq!(gate.messages(), vec![GATE, "fits"]);

    pool.reset_discard_counter();
    assert_eq!(pool.discard_counter(), 0);
}

#[test]
fn test_shutdown_drains_then_rejects() {
    let pool = Arc::new(ThreadPool::new(16, 1).unwrap());
    let gate = Arc::new(GateSink::new());
    let logger = async_logger("drain", vec![gate.clone() as SinkPtr], &pool, OverflowPolicy::Block);
    let errors = error_collector(&logger);

    logger.info(GATE);
    gate.wait_entered();
    for i in 0..10 {
        logger.info(format!("pending-{}", i));
    }

    let shutdown = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.shutdown())
    };
    thread::sleep(Duration::from_millis(20));
    gate.release();
    assert!(shutdown.join().unwrap());

    let delivered = gate.messages();
    assert_eq!(delivered.len(), 11);
    assert_eq!(delivered.last().map(String::as_str), Some("pending-9"));

    logger.info("too late");
    assert!(matches!(logger.flush(), Err(LoggerError::Shutdown { .. })));
    assert_eq!(gate.messages().len(), 11);
    assert_eq!(errors.lock().len(), 1);
    assert!(errors.lock()[0].contains("shut down"));
}

#[test]
fn test_flush_and_wait_timeout() {
    let pool = Arc::new(ThreadPool::new(4, 1).unwrap());
    let gate = Arc::new(GateSink::new());
    let logger = async_logger("slow", vec![gate.clone() as SinkPtr], &pool, OverflowPolicy::Block);

    logger.info(GATE);
    gate.wait_entered();

    let err = logger
        .flush_and_wait(Duration::from_millis(20))
        .unwrap_err();
    assert!(matches!(err, LoggerError::FlushTimeout { .. }));

    gate.release();
    logger.flush_and_wait(WAIT).unwrap();
}

#[test]
fn test_loggers_share_pool() {
    let pool = Arc::new(ThreadPool::new(64, 2).unwrap());
    let capture = Arc::new(CaptureSink::new());
    let a = async_logger("a", vec![capture.clone() as SinkPtr], &pool, OverflowPolicy::Block);
    let b = a.clone_with_name("b");

    assert!(b.is_async());
    assert_eq!(b.overflow_policy(), Some(OverflowPolicy::Block));

    for i in 0..20 {
        a.info(format!("a-{}", i));
        b.info(format!("b-{}", i));
    }
    assert!(pool.shutdown());

    assert_eq!(capture.len(), 40);
    assert_eq!(pool.metrics().processed(), pool.metrics().enqueued());
}

#[test]
fn test_dropping_last_pool_handle_drains() {
    let capture = Arc::new(CaptureSink::new());
    {
        let pool = Arc::new(ThreadPool::new(8, 1).unwrap());
        let logger = async_logger("dropped", vec![capture.clone() as SinkPtr], &pool, OverflowPolicy::Block);
        drop(pool);
        for i in 0..100 {
            logger.info(format!("msg-{}", i));
        }
    }
    assert_eq!(capture.len(), 100);
}

#[test]
fn test_single_worker_orders_each_producer() {
    let pool = Arc::new(ThreadPool::new(4, 1).unwrap());
    let capture = Arc::new(CaptureSink::new());
    let logger = Arc::new(async_logger(
        "producers",
        vec![capture.clone() as SinkPtr],
        &pool,
        OverflowPolicy::Block,
    ));

    let handles: Vec<_> = (0..4)
        .map(|producer| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..100 {
                    logger.info(format!("{}:{}", producer, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.flush_and_wait(WAIT).unwrap();

    let messages = capture.messages();
    assert_eq!(messages.len(), 400);
    for producer in 0..4 {
        let prefix = format!("{}:", producer);
        let sequence: Vec<usize> = messages
            .iter()
            .filter_map(|m| m.strip_prefix(&prefix))
            .map(|i| i.parse().unwrap())
            .collect();
        assert_eq!(sequence, (0..100).collect::<Vec<_>>());
    }
}

#[test]
fn test_worker_survives_panicking_sink() {
    let pool = Arc::new(ThreadPool::new(8, 1).unwrap());
    let capture = Arc::new(CaptureSink::new());
    let logger = async_logger(
        "panics",
        vec![Arc::new(common::PanickingSink::default()) as SinkPtr, capture.clone() as SinkPtr],
        &pool,
        OverflowPolicy::Block,
    );
    let errors = error_collector(&logger);

    logger.info("one");
    logger.info("two");
    logger.flush_and_wait(WAIT).unwrap();

    assert_eq!(capture.messages(), vec!["one", "two"]);
    assert_eq!(errors.lock().len(), 2);
}
