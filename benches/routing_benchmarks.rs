//! Criterion benchmarks for rust_log_router

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_log_router::bridge::LegacyEventView;
use rust_log_router::config::{Configuration, PluginRegistry, StrSubstitutor};
use rust_log_router::prelude::*;
use std::sync::Arc;

/// Discards every event, so only routing overhead is measured.
struct NullAppender {
    name: String,
}

impl Appender for NullAppender {
    fn append(&self, event: &dyn LogEvent) -> Result<()> {
        black_box(event.message());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn null_config() -> Configuration {
    let plugins = PluginRegistry::with_builtins();
    plugins.register("Null", |node, _config| {
        Ok(Arc::new(NullAppender {
            name: node.name()?.to_string(),
        }))
    });
    Configuration::with_plugins(Arc::new(plugins))
}

fn null_route() -> Route {
    Route::definition(Node::new("Null").with_attribute("name", "${ctx:type}"))
}

fn typed(kind: &str) -> LogEntry {
    LogEntry::new(LogLevel::Info, "benchmark message").with_context_entry("type", kind)
}

// ============================================================================
// Key Resolution Benchmarks
// ============================================================================

fn bench_substitution(c: &mut Criterion) {
    let mut group = c.benchmark_group("substitution");
    group.throughput(Throughput::Elements(1));

    let substitutor = StrSubstitutor::new();
    substitutor.set_property("env", "prod");
    let event = typed("Service");

    group.bench_function("plain", |b| {
        b.iter(|| substitutor.replace_event(black_box("Service"), Some(&event)));
    });

    group.bench_function("context_lookup", |b| {
        b.iter(|| substitutor.replace_event(black_box("${ctx:type}"), Some(&event)));
    });

    group.bench_function("mixed_with_default", |b| {
        b.iter(|| {
            substitutor.replace_event(black_box("${env}-${ctx:type}-${ctx:missing:-none}"), Some(&event))
        });
    });

    group.finish();
}

// ============================================================================
// Routing Benchmarks
// ============================================================================

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");
    group.throughput(Throughput::Elements(1));

    for keys in [1usize, 16, 256] {
        let routing = RoutingAppender::builder("bench")
            .configuration(null_config())
            .pattern("${ctx:type}")
            .route(null_route())
            .build()
            .unwrap();
        routing.start();
        let events: Vec<LogEntry> = (0..keys).map(|k| typed(&format!("key-{}", k))).collect();

        group.bench_with_input(BenchmarkId::new("warm_keys", keys), &events, |b, events| {
            let mut i = 0;
            b.iter(|| {
                routing.append(black_box(&events[i % events.len()])).unwrap();
                i += 1;
            });
        });
        routing.stop();
    }

    group.bench_function("reference_default", |b| {
        let fallback: Arc<dyn Appender> = Arc::new(NullAppender {
            name: "fallback".to_string(),
        });
        let routing = RoutingAppender::builder("bench-default")
            .pattern("${ctx:type}")
            .route(Route::reference(fallback))
            .build()
            .unwrap();
        routing.start();
        let event = typed("Unmatched");
        b.iter(|| routing.append(black_box(&event)).unwrap());
        routing.stop();
    });

    group.bench_function("create_and_delete", |b| {
        let routing = RoutingAppender::builder("bench-churn")
            .configuration(null_config())
            .pattern("${ctx:type}")
            .route(null_route())
            .build()
            .unwrap();
        routing.start();
        let event = typed("Churn");
        b.iter(|| {
            routing.append(black_box(&event)).unwrap();
            routing.delete_appender("Churn");
        });
        routing.stop();
    });

    group.finish();
}

// ============================================================================
// Concurrent Routing Benchmarks
// ============================================================================

fn bench_concurrent_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_routing");

    for threads in [2usize, 4, 8] {
        const EVENTS_PER_THREAD: usize = 1_000;
        group.throughput(Throughput::Elements((threads * EVENTS_PER_THREAD) as u64));

        let routing = Arc::new(
            RoutingAppender::builder("bench-concurrent")
                .configuration(null_config())
                .pattern("${ctx:type}")
                .route(null_route())
                .build()
                .unwrap(),
        );
        routing.start();

        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let routing = Arc::clone(&routing);
                        std::thread::spawn(move || {
                            let event = typed(&format!("key-{}", t % 4));
                            for _ in 0..EVENTS_PER_THREAD {
                                routing.append(&event).unwrap();
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
        routing.stop();
    }

    group.finish();
}

// ============================================================================
// Bridge Benchmarks
// ============================================================================

fn bench_event_bridge(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_bridge");
    group.throughput(Throughput::Elements(1));

    let event = typed("Service");

    group.bench_function("legacy_view", |b| {
        b.iter(|| {
            let view = LegacyEventView::of(black_box(&event));
            black_box(view.mdc("type").map(str::len))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_substitution,
    bench_routing,
    bench_concurrent_routing,
    bench_event_bridge,
);
criterion_main!(benches);
