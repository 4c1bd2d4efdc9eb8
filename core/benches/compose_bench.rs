use catalog_core::composer::RuleSetComposer;
use catalog_core::config::SearchConfig;
use catalog_core::normalize::normalize_search_string;
use catalog_core::sink::RingSink;
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn bench_compose(c: &mut Criterion) {
    let config = SearchConfig::default();
    let registry = config.registry();
    let rules = registry.resolve(&registry.names()).expect("standard rules");
    let composer = RuleSetComposer::new(Arc::new(RingSink::new(64)));
    c.bench_function("normalize_code", |b| b.iter(|| normalize_search_string("  Bosch 0 986 494-010 Café ")));
    c.bench_function("compose_all_rules", |b| {
        b.iter(|| composer.compose("  Bosch 0 986 494-010 ", &rules, &config.boosts))
    });
}

criterion_group!(benches, bench_compose);
criterion_main!(benches);
