//! Benchmarks for registry lookups
//!
//! Run with: cargo bench -p search-config --bench entity_lookup

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use search_config::{MatchMode, Member, SearchConfigurationOptions, Searchable};

struct Customer;

impl Searchable for Customer {
    fn members() -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::text("Name"),
            Member::text("Email"),
            Member::text("Description"),
        ];
        MEMBERS
    }
}

struct Article;

impl Searchable for Article {
    fn members() -> &'static [Member] {
        const MEMBERS: &[Member] = &[Member::text("Title"), Member::text("Body")];
        MEMBERS
    }
}

fn configured_registry() -> SearchConfigurationOptions {
    let options = SearchConfigurationOptions::new();
    options
        .entity::<Customer>()
        .declare("Name")
        .and_then(|c| c.declare_with("Email", MatchMode::Exact))
        .expect("valid declarations");
    options.entity::<Article>();
    options.seal();
    options
}

fn bench_entity_lookup(c: &mut Criterion) {
    let options = configured_registry();

    c.bench_function("entity_existing", |b| {
        b.iter(|| black_box(options.entity::<Customer>()))
    });
}

fn bench_searchable_fields(c: &mut Criterion) {
    let options = configured_registry();
    let mut group = c.benchmark_group("searchable_fields");

    group.bench_function("explicit", |b| {
        b.iter(|| black_box(options.entity::<Customer>().searchable_fields()))
    });
    group.bench_function("default_fallback", |b| {
        b.iter(|| black_box(options.entity::<Article>().searchable_fields()))
    });

    group.finish();
}

criterion_group!(benches, bench_entity_lookup, bench_searchable_fields);
criterion_main!(benches);
