use criterion::{BatchSize, Criterion, Throughput};
use iotlink::entity::value::normalize;
use iotlink::entity::{EntityDescriptor, Kind, Registry, persistence_key};
use iotlink::mediator::Outbound;
use iotlink::storage::MemoryStore;
use std::hint::black_box;

struct Discard;

impl Outbound for Discard {
    fn publish(&mut self, topic: &str, payload: &str, _log: bool) {
        black_box((topic, payload));
    }
}

static TABLE: [EntityDescriptor<'static>; 8] = [
    EntityDescriptor::new("Relay", Kind::Control).topics("bench/relay/state", "bench/relay/set"),
    EntityDescriptor::new("Setpoint", Kind::Control)
        .topics("bench/setpoint/state", "bench/setpoint/set")
        .resolution("0.1")
        .default_value("19.0"),
    EntityDescriptor::new("Fan", Kind::Control).topics("bench/fan/state", "bench/fan/set"),
    EntityDescriptor::new("Temperature", Kind::Indicator)
        .topics("bench/temperature/state", "")
        .resolution("0.01"),
    EntityDescriptor::new("Humidity", Kind::Indicator).topics("bench/humidity/state", ""),
    EntityDescriptor::new("Restart", Kind::Button).topics("", "bench/restart"),
    EntityDescriptor::new("Identify", Kind::Button).topics("", "bench/identify"),
    EntityDescriptor::new("HA_online", Kind::Internal).topics("", "bench/ha/online"),
];

pub fn bench_route_inbound(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_inbound");
    group.throughput(Throughput::Elements(1));

    for (label, topic) in [
        ("first", "bench/relay/set"),
        ("last", "bench/ha/online"),
        ("unmatched", "bench/nobody"),
    ] {
        group.bench_function(label, |b| {
            b.iter_batched_ref(
                || {
                    let mut store: MemoryStore<16> = MemoryStore::new();
                    let mut registry = Registry::from_table(&TABLE).expect("valid table");
                    registry.init_all(&mut store);
                    (registry, store)
                },
                |(registry, store)| {
                    black_box(registry.route_inbound(topic, "21.37", false, store, &mut Discard));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

pub fn bench_persistence_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence_key");
    group.bench_function("short", |b| b.iter(|| persistence_key(black_box("Relay"))));
    group.bench_function("long", |b| {
        b.iter(|| persistence_key(black_box("IotBridge_living_room_setpoint")))
    });
    group.finish();
}

pub fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    group.bench_function("numeric", |b| b.iter(|| normalize(black_box("3.14159"), black_box(2))));
    group.bench_function("text", |b| b.iter(|| normalize(black_box("ON"), black_box(2))));
    group.finish();
}
