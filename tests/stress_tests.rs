//! Stress tests for concurrent routing
//!
//! These tests verify:
//! - At most one appender is constructed per key under contention
//! - Deletes are idempotent and race safely with purges and forwards
//! - Idle purging shrinks the registry, manual purging does not react to time
//! - A hanging appender is never stopped while an event is inside it

use parking_lot::Mutex;
use rust_log_router::config::{Configuration, Node, PluginRegistry};
use rust_log_router::core::{Appender, LogEntry, LogLevel};
use rust_log_router::routing::{
    AppenderControl, AppenderRegistry, IdlePurgePolicy, ManualPurgePolicy, PurgePolicy, Route,
    RoutingAppender, DEFAULT_KEY,
};
use rust_log_router::ListAppender;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

type Built = Arc<Mutex<Vec<Arc<ListAppender>>>>;

/// Configuration whose `Capture` plugin records every appender it builds
fn capturing_config(build_delay: Duration) -> (Configuration, Built) {
    let built: Built = Arc::new(Mutex::new(Vec::new()));
    let plugins = PluginRegistry::with_builtins();
    let sink = Arc::clone(&built);
    plugins.register("Capture", move |node, _config| {
        thread::sleep(build_delay);
        let list = Arc::new(ListAppender::new(node.name()?));
        sink.lock().push(Arc::clone(&list));
        let appender: Arc<dyn Appender> = list;
        Ok(appender)
    });
    (Configuration::with_plugins(Arc::new(plugins)), built)
}

fn capture_route() -> Route {
    Route::definition(Node::new("Capture").with_attribute("name", "${ctx:type}"))
}

fn typed(kind: &str, message: &str) -> LogEntry {
    LogEntry::new(LogLevel::Info, message).with_context_entry("type", kind)
}

fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_at_most_one_construction_per_key() {
    const THREADS: usize = 16;
    let (config, built) = capturing_config(Duration::from_millis(20));
    let routing = Arc::new(
        RoutingAppender::builder("contended")
            .configuration(config)
            .pattern("${ctx:type}")
            .route(capture_route())
            .build()
            .unwrap(),
    );
    routing.start();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let routing = Arc::clone(&routing);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                routing.append(&typed("Hot", &format!("event {}", i))).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let built = built.lock();
    assert_eq!(built.len(), 1);
    assert_eq!(built[0].len(), THREADS);
    assert_eq!(routing.metrics().created_count(), 1);
    routing.stop();
}

#[test]
fn test_fan_out_across_many_keys() {
    const THREADS: usize = 8;
    const KEYS: usize = 50;
    let (config, built) = capturing_config(Duration::ZERO);
    let routing = Arc::new(
        RoutingAppender::builder("fan-out")
            .configuration(config)
            .pattern("${ctx:type}")
            .route(capture_route())
            .build()
            .unwrap(),
    );
    routing.start();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let routing = Arc::clone(&routing);
            thread::spawn(move || {
                for k in 0..KEYS {
                    routing.append(&typed(&format!("key-{}", k), &format!("t{}", t))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(built.lock().len(), KEYS);
    assert_eq!(routing.appenders().len(), KEYS);
    assert!(built.lock().iter().all(|list| list.len() == THREADS));
    assert_eq!(routing.metrics().forwarded_count(), (THREADS * KEYS) as u64);
    routing.stop();
}

#[test]
fn test_double_delete_is_a_no_op() {
    let (config, built) = capturing_config(Duration::ZERO);
    let routing = RoutingAppender::builder("double-delete")
        .configuration(config)
        .pattern("${ctx:type}")
        .route(capture_route())
        .build()
        .unwrap();
    routing.start();

    for kind in ["A", "B", "C"] {
        routing.append(&typed(kind, "m")).unwrap();
    }
    assert_eq!(routing.appenders().len(), 3);

    assert!(routing.delete_appender("B"));
    assert!(!routing.delete_appender("B"));
    assert_eq!(routing.appenders().len(), 2);
    assert_eq!(built.lock()[1].stop_count(), 1);
    routing.stop();
}

#[test]
fn test_idle_purge_reduces_appender_count() {
    let (config, built) = capturing_config(Duration::ZERO);
    let fallback = Arc::new(ListAppender::new("fallback"));
    let routing = RoutingAppender::builder("idle")
        .configuration(config)
        .pattern("${ctx:type}")
        .route(capture_route().with_key("Service"))
        .route(capture_route().with_key("Alert"))
        .route(capture_route().with_key("Audit"))
        .route(Route::reference(fallback))
        .purge_policy(Arc::new(IdlePurgePolicy::new(
            Duration::from_millis(100),
            Duration::from_millis(20),
        )))
        .build()
        .unwrap();
    routing.start();

    for kind in ["Service", "Alert", "Audit"] {
        routing.append(&typed(kind, "once")).unwrap();
    }
    assert_eq!(routing.appenders().len(), 4);

    assert!(wait_until(Duration::from_secs(5), || routing.appenders().len() == 1));
    assert!(routing.appenders().contains_key(DEFAULT_KEY));
    assert!(built.lock().iter().all(|list| list.stop_count() == 1));
    assert_eq!(routing.metrics().purged_count(), 3);

    // A purged key comes back on its next event
    routing.append(&typed("Service", "again")).unwrap();
    assert_eq!(built.lock().len(), 4);
    routing.stop();
}

#[test]
fn test_manual_purge_ignores_passage_of_time() {
    let (config, _built) = capturing_config(Duration::ZERO);
    let policy = Arc::new(ManualPurgePolicy::new());
    let routing = RoutingAppender::builder("manual")
        .configuration(config)
        .pattern("${ctx:type}")
        .route(capture_route())
        .purge_policy(policy.clone())
        .build()
        .unwrap();
    routing.start();

    for kind in ["Service", "Alert", "Audit"] {
        routing.append(&typed(kind, "once")).unwrap();
    }
    thread::sleep(Duration::from_millis(150));
    assert_eq!(routing.appenders().len(), 3);

    policy.purge();
    assert!(routing.appenders().is_empty());
    routing.stop();
}

#[test]
fn test_delete_and_purge_race_stops_once() {
    for _ in 0..200 {
        let registry = Arc::new(AppenderRegistry::new());
        let list = Arc::new(ListAppender::new("raced"));
        let appender = list.clone();
        let control = registry
            .get_or_create("k", move || Ok(AppenderControl::created("k", appender)))
            .unwrap();

        let policy = Arc::new(ManualPurgePolicy::new());
        policy.initialize(&registry);
        policy.update("k", &LogEntry::new(LogLevel::Info, "m"));

        let barrier = Arc::new(Barrier::new(3));
        let deleter = {
            let (registry, barrier) = (Arc::clone(&registry), Arc::clone(&barrier));
            thread::spawn(move || {
                barrier.wait();
                registry.delete("k")
            })
        };
        let purger = {
            let (policy, barrier) = (Arc::clone(&policy), Arc::clone(&barrier));
            thread::spawn(move || {
                barrier.wait();
                policy.purge();
            })
        };
        let retirer = {
            let (registry, control) = (Arc::clone(&registry), Arc::clone(&control));
            thread::spawn(move || {
                barrier.wait();
                registry.retire("k", &control)
            })
        };

        deleter.join().expect("Thread panicked");
        purger.join().expect("Thread panicked");
        retirer.join().expect("Thread panicked");

        assert_eq!(list.stop_count(), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.metrics().purged_count(), 1);
    }
}

#[test]
fn test_forwarding_races_deletes_without_reaching_stopped_appenders() {
    const WRITERS: usize = 4;
    const EVENTS: usize = 500;
    let (config, built) = capturing_config(Duration::ZERO);
    let routing = Arc::new(
        RoutingAppender::builder("churn")
            .configuration(config)
            .pattern("${ctx:type}")
            .route(capture_route())
            .build()
            .unwrap(),
    );
    routing.start();

    let writing = Arc::new(AtomicUsize::new(WRITERS));
    let writers: Vec<_> = (0..WRITERS)
        .map(|_| {
            let (routing, writing) = (Arc::clone(&routing), Arc::clone(&writing));
            thread::spawn(move || {
                for i in 0..EVENTS {
                    routing.append(&typed("Hot", &i.to_string())).unwrap();
                }
                writing.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();
    let deleter = {
        let (routing, writing) = (Arc::clone(&routing), Arc::clone(&writing));
        thread::spawn(move || {
            while writing.load(Ordering::SeqCst) > 0 {
                routing.delete_appender("Hot");
                thread::yield_now();
            }
        })
    };
    for writer in writers {
        writer.join().expect("Thread panicked");
    }
    deleter.join().expect("Thread panicked");
    routing.stop();

    let built = built.lock();
    let delivered: usize = built.iter().map(|list| list.len()).sum();
    assert!(built.iter().all(|list| list.stop_count() == 1));
    assert!(built.iter().all(|list| list.rejected_count() == 0));
    assert_eq!(delivered as u64, routing.metrics().forwarded_count());
    assert_eq!(
        routing.metrics().forwarded_count() + routing.metrics().dropped_count(),
        (WRITERS * EVENTS) as u64
    );
}

#[test]
fn test_hanging_appender_is_stopped_after_its_event() {
    let (config, built) = capturing_config(Duration::ZERO);
    let routing = Arc::new(
        RoutingAppender::builder("hanging")
            .configuration(config)
            .pattern("${ctx:type}")
            .route(capture_route())
            .purge_policy(Arc::new(IdlePurgePolicy::new(
                Duration::from_millis(100),
                Duration::from_millis(10),
            )))
            .build()
            .unwrap(),
    );
    routing.start();

    routing.append(&typed("Slow", "first")).unwrap();
    let slow = Arc::clone(&built.lock()[0]);
    slow.hang();

    let stuck = {
        let routing = Arc::clone(&routing);
        thread::spawn(move || routing.append(&typed("Slow", "second")))
    };
    assert!(wait_until(Duration::from_secs(5), || slow.blocked_count() == 1));

    // The sweep retires the idle control while the event is still inside it
    assert!(wait_until(Duration::from_secs(5), || !routing.appenders().contains_key("Slow")));
    assert_eq!(slow.stop_count(), 0);

    slow.release();
    stuck.join().expect("Thread panicked").unwrap();
    assert_eq!(slow.stop_count(), 1);
    assert_eq!(slow.len(), 2);
    assert_eq!(slow.rejected_count(), 0);
    routing.stop();
}
