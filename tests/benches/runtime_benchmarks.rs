//! # Microfrontend Runtime Benchmarks
//!
//! Hot paths that run on every navigation or state write:
//!
//! | Component | Path | Target |
//! |-----------|------|--------|
//! | Navigation Shell | route pattern match | < 1µs |
//! | Navigation Shell | full navigate + commit | < 50µs |
//! | Shared Bus | `set_state` with listeners | < 10µs |
//! | Registry | `search` over 1k records | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use mf_01_registry::{MicrofrontendRegistry, MockHealthProbe, RegistryConfig, SearchCriteria};
use mf_03_navigation_shell::{NavigateOptions, NavigationShell, PathPattern, RouteNode, ShellConfig};
use mf_shared_bus::{BusConfig, EventFilter, SharedStateBus};
use mf_shared_types::{LoadConfig, MicrofrontendMetadata, MicrofrontendRecord};
use mf_tests::fixtures::page;

// ============================================================================
// NAVIGATION SHELL
// ============================================================================

fn bench_pattern_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation-shell-patterns");

    for pattern in ["/about", "/users/:id", "/shop/:category/:item", "/docs/*"] {
        let compiled = PathPattern::compile(pattern).expect("valid pattern");
        group.bench_with_input(BenchmarkId::new("match_path", pattern), &compiled, |b, p| {
            b.iter(|| black_box(p.match_path(black_box("/shop/shoes/42?ref=home"))))
        });
    }
    group.finish();
}

fn bench_navigate(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let mut group = c.benchmark_group("navigation-shell-navigate");

    for route_count in [10usize, 100, 500] {
        let shell = {
            let _guard = runtime.enter();
            let mut builder = NavigationShell::builder(ShellConfig::standalone());
            for i in 0..route_count {
                builder = builder.route(RouteNode::component(format!("/section-{i}/:id"), page("Page")));
            }
            builder.build().expect("shell")
        };
        let target = format!("/section-{}/7", route_count - 1);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("last_route", route_count), &target, |b, path| {
            b.iter(|| {
                runtime.block_on(shell.navigate(black_box(path), NavigateOptions::default()))
            })
        });
    }
    group.finish();
}

// ============================================================================
// SHARED BUS
// ============================================================================

fn bench_set_state(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let mut group = c.benchmark_group("shared-bus");

    for subscribers in [0usize, 10, 100] {
        let _guard = runtime.enter();
        let bus = SharedStateBus::new(BusConfig::default());
        let _subscriptions: Vec<_> = (0..subscribers)
            .map(|_| bus.events(EventFilter::all()))
            .collect();
        let mut counter = 0u64;

        group.bench_function(BenchmarkId::new("set_state", subscribers), |b| {
            b.iter(|| {
                counter += 1;
                bus.set_state("cart.items", serde_json::json!(counter))
                    .expect("set_state")
            })
        });
    }
    group.finish();
}

// ============================================================================
// REGISTRY
// ============================================================================

fn bench_registry_search(c: &mut Criterion) {
    let registry = MicrofrontendRegistry::builder(RegistryConfig::default())
        .health_probe(Arc::new(MockHealthProbe::new()))
        .build()
        .expect("registry");
    for i in 0..1_000 {
        let metadata = MicrofrontendMetadata {
            tags: vec![if i % 2 == 0 { "checkout" } else { "content" }.to_string()],
            ..MicrofrontendMetadata::default()
        };
        let record = MicrofrontendRecord::new(
            format!("mf-{i}"),
            format!("Module {i}"),
            "1.0.0",
            LoadConfig::host_linked(format!("mf-{i}"), "./App"),
        )
        .with_metadata(metadata);
        registry.register(record).expect("register");
    }

    let criteria = SearchCriteria::new().name("module 9").tag("content");
    c.bench_function("registry-search-1k", |b| {
        b.iter(|| black_box(registry.search(black_box(&criteria))))
    });
}

criterion_group!(
    benches,
    bench_pattern_matching,
    bench_navigate,
    bench_set_state,
    bench_registry_search
);
criterion_main!(benches);
