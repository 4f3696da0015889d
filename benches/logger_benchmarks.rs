//! Criterion benchmarks for rust_async_logger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_async_logger::prelude::*;
use rust_async_logger::DEFAULT_PATTERN;
use std::sync::Arc;
use std::time::Duration;

fn async_null_logger(name: &str, policy: OverflowPolicy) -> (Logger, Arc<ThreadPool>) {
    let pool = Arc::new(ThreadPool::new(8192, 1).expect("valid pool"));
    let logger = Logger::builder(name)
        .sink(NullSink::new())
        .thread_pool(Arc::clone(&pool))
        .overflow_policy(policy)
        .level(LogLevel::Trace)
        .build();
    (logger, pool)
}

// ============================================================================
// Logger Creation Benchmarks
// ============================================================================

fn bench_logger_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("logger_creation");
    group.throughput(Throughput::Elements(1));

    let sink: SinkPtr = Arc::new(NullSink::new());
    let pool = Arc::new(ThreadPool::new(1024, 1).expect("valid pool"));

    group.bench_function("new_sync", |b| {
        b.iter(|| {
            let logger = Logger::new("bench", [Arc::clone(&sink)]);
            black_box(logger)
        });
    });

    group.bench_function("new_async_shared_pool", |b| {
        b.iter(|| {
            let logger = Logger::new_async(
                "bench",
                [Arc::clone(&sink)],
                Arc::clone(&pool),
                OverflowPolicy::Block,
            );
            black_box(logger)
        });
    });

    group.finish();
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_sync_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_logging");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder("sync")
        .sink(NullSink::new())
        .level(LogLevel::Trace)
        .build();

    group.bench_function("info", |b| {
        b.iter(|| {
            logger.info(black_box("Info message"));
        });
    });

    group.bench_function("info_macro_formatted", |b| {
        b.iter(|| {
            rust_async_logger::info!(logger, "request {} took {}ms", black_box(42), black_box(7));
        });
    });

    group.finish();
}

fn bench_async_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_logging");
    group.throughput(Throughput::Elements(1));

    let (block_logger, block_pool) = async_null_logger("async-block", OverflowPolicy::Block);
    group.bench_function("block", |b| {
        b.iter(|| {
            block_logger.info(black_box("Info message"));
        });
    });

    let (overrun_logger, overrun_pool) =
        async_null_logger("async-overrun", OverflowPolicy::OverrunOldest);
    group.bench_function("overrun_oldest", |b| {
        b.iter(|| {
            overrun_logger.info(black_box("Info message"));
        });
    });

    group.finish();

    block_pool.shutdown_timeout(Duration::from_secs(5));
    overrun_pool.shutdown_timeout(Duration::from_secs(5));
}

// ============================================================================
// Concurrent Logging Benchmarks
// ============================================================================

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    let pool = Arc::new(ThreadPool::new(8192, 2).expect("valid pool"));
    let logger = Arc::new(
        Logger::builder("concurrent")
            .sink(NullSink::new())
            .thread_pool(Arc::clone(&pool))
            .build(),
    );

    group.bench_function("multi_thread_4", |b| {
        let logger = Arc::clone(&logger);
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let logger = Arc::clone(&logger);
                    std::thread::spawn(move || {
                        for _ in 0..100 {
                            logger.info(black_box("Concurrent message"));
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
    pool.shutdown_timeout(Duration::from_secs(5));
}

// ============================================================================
// Level Filtering Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder("filtered")
        .sink(NullSink::new())
        .level(LogLevel::Warn)
        .build();

    group.bench_function("below_threshold", |b| {
        b.iter(|| {
            logger.debug(black_box("This should be filtered"));
        });
    });

    group.bench_function("below_threshold_macro", |b| {
        b.iter(|| {
            rust_async_logger::debug!(logger, "filtered {}", black_box(1));
        });
    });

    group.bench_function("above_threshold", |b| {
        b.iter(|| {
            logger.error(black_box("This should be logged"));
        });
    });

    group.finish();
}

// ============================================================================
// Pattern Formatting Benchmarks
// ============================================================================

fn bench_pattern_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_formatting");
    group.throughput(Throughput::Elements(1));

    let record = LogRecord::new("bench".into(), LogLevel::Info, "formatted message".to_string())
        .with_source(SourceLocation::new("src/main.rs", 42, "bench::module"));

    let default = PatternFormatter::with_time_type(DEFAULT_PATTERN, PatternTimeType::Utc);
    group.bench_function("default_pattern", |b| {
        b.iter(|| black_box(default.format(black_box(&record))));
    });

    let message_only = PatternFormatter::new("%v");
    group.bench_function("message_only", |b| {
        let mut buffer = String::with_capacity(128);
        b.iter(|| {
            buffer.clear();
            message_only.format_into(black_box(&record), &mut buffer);
            black_box(buffer.len())
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_logger_creation,
    bench_sync_logging,
    bench_async_logging,
    bench_concurrent_logging,
    bench_level_filtering,
    bench_pattern_formatting
);

criterion_main!(benches);
