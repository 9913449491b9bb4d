use std::sync::Arc;

use chrono::{DateTime, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use event_bus::{
    DomainEvent, EventDispatcher, EventDispatcherExt, EventRegistry, InMemoryEventDispatcher,
    ValidatingEventDispatcher,
};

#[derive(Debug)]
struct Ticked {
    n: u64,
}

impl DomainEvent for Ticked {
    fn event_type(&self) -> &'static str {
        "Ticked"
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        DateTime::<Utc>::MIN_UTC
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "n": self.n })
    }
}

fn registry() -> Arc<EventRegistry> {
    let registry = EventRegistry::new();
    registry.must_register(Ticked { n: 0 }.shared(), "clock ticked");
    Arc::new(registry)
}

fn bench_dispatch_no_subscribers(c: &mut Criterion) {
    let dispatcher = InMemoryEventDispatcher::new(registry());
    let event = Ticked { n: 1 }.shared();

    c.bench_function("dispatcher/no_subscribers", |b| {
        b.iter(|| dispatcher.dispatch(&event).unwrap());
    });
}

fn bench_dispatch_ten_subscribers(c: &mut Criterion) {
    let dispatcher = InMemoryEventDispatcher::new(registry());
    for _ in 0..10 {
        dispatcher.on("Ticked", |event| {
            std::hint::black_box(event.event_type());
            Ok(())
        });
    }
    let event = Ticked { n: 1 }.shared();

    c.bench_function("dispatcher/ten_subscribers", |b| {
        b.iter(|| dispatcher.dispatch(&event).unwrap());
    });
}

fn bench_validating_dispatch(c: &mut Criterion) {
    let registry = registry();
    let dispatcher =
        ValidatingEventDispatcher::new(InMemoryEventDispatcher::new(registry.clone()), registry);
    dispatcher.on("Ticked", |_| Ok(()));
    let event = Ticked { n: 1 }.shared();

    c.bench_function("dispatcher/validating", |b| {
        b.iter(|| dispatcher.dispatch(&event).unwrap());
    });
}

fn bench_registry_validate(c: &mut Criterion) {
    let registry = registry();
    let event = Ticked { n: 1 };

    c.bench_function("registry/validate", |b| {
        b.iter(|| registry.validate(&event).unwrap());
    });
}

criterion_group!(
    benches,
    bench_dispatch_no_subscribers,
    bench_dispatch_ten_subscribers,
    bench_validating_dispatch,
    bench_registry_validate,
);
criterion_main!(benches);
