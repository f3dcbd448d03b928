use criterion::{criterion_group, criterion_main};

mod entity;

criterion_group!(
    benches,
    entity::bench_route_inbound,
    entity::bench_persistence_key,
    entity::bench_normalize
);
criterion_main!(benches);
