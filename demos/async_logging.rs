//! Async logging example
//!
//! Demonstrates a shared thread pool, overflow policies, file sinks and the
//! registry lifecycle.
//!
//! Run with: cargo run --example async_logging

use rust_async_logger::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Async Logger - Async Logging Example ===\n");

    let registry = Registry::new();
    registry.init_thread_pool(1024, 1)?;

    // 1. Async logger writing to the console and a basic file
    println!("1. Async logger with console and file sinks:");
    let file: SinkPtr = Arc::new(BasicFileSink::new("logs/async_demo.log", true)?);
    let console: SinkPtr = Arc::new(ConsoleSink::stdout(ColorMode::Automatic));
    let app = registry.create_async("app", [console, Arc::clone(&file)], OverflowPolicy::Block)?;
    app.set_pattern("[%H:%M:%S.%e] [%n] [%l] [%t] %v", PatternTimeType::Local);

    for i in 0..10 {
        rust_async_logger::info!(app, "Message #{}", i);
    }
    app.flush_and_wait(Duration::from_secs(1))?;
    println!("   Logged 10 messages asynchronously");

    // 2. Multi-threaded producers sharing one logger
    println!("\n2. Multi-threaded logging:");
    let mut handles = vec![];
    for thread_id in 0..5 {
        let logger = Arc::clone(&app);
        handles.push(thread::spawn(move || {
            for i in 0..20 {
                rust_async_logger::debug!(logger, "Thread {} - Message {}", thread_id, i);
                logger.info(format!("Thread {} - Message {}", thread_id, i));
            }
        }));
    }
    for handle in handles {
        let _ = handle.join();
    }
    println!("   5 threads logged 20 messages each");

    // 3. Overrun policy on a tiny private pool
    println!("\n3. OverrunOldest on a tiny queue:");
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);
    let tiny_pool = Arc::new(ThreadPool::builder().queue_capacity(4).worker_count(1).build()?);
    let rotating: SinkPtr = Arc::new(RotatingFileSink::new("logs/rotating_demo.log", 4096, 3)?);
    let lossy = Logger::builder("lossy")
        .shared_sink(rotating)
        .thread_pool(Arc::clone(&tiny_pool))
        .overflow_policy(OverflowPolicy::OverrunOldest)
        .on_overflow(Arc::new(move |total| dropped_clone.store(total, Ordering::Relaxed)))
        .build();
    for i in 0..10_000 {
        lossy.info(format!("burst {}", i));
    }
    lossy.flush_and_wait(Duration::from_secs(1))?;
    println!(
        "   Processed {} jobs for 10000 messages, overrun {}",
        tiny_pool.metrics().processed(),
        dropped.load(Ordering::Relaxed)
    );
    tiny_pool.shutdown();

    // 4. Registry lookups and levels
    println!("\n4. Registry:");
    registry.apply_levels(LevelConfig::parse("info,app=debug")?);
    if let Some(logger) = registry.get("app") {
        println!("   'app' level is {}", logger.level());
        logger.warn("found through the registry");
    }

    // 5. Shutdown drains everything that was accepted
    println!("\n5. Shutdown:");
    registry.shutdown();
    app.info("rejected after shutdown");
    println!("   Registry shut down: {}", registry.is_shut_down());

    println!("\n=== Example completed successfully! ===");
    println!("Check 'logs/' for file output");

    Ok(())
}
