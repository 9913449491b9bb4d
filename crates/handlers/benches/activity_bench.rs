use std::sync::Arc;

use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{PostEvent, RatingEvent, RatingType, register_blog_events};
use event_bus::{DomainEvent, EventDispatcher, EventRegistry, InMemoryEventDispatcher};
use handlers::{ActivityView, subscribe, subscribe_loggers};

fn bench_apply(c: &mut Criterion) {
    let view = ActivityView::new();
    let post_id = AggregateId::new("p-bench");
    let events = [
        PostEvent::post_created(post_id.clone(), AggregateId::new("u-1"), "T", "C").shared(),
        RatingEvent::rating_created(
            AggregateId::new("r-1"),
            post_id.clone(),
            AggregateId::new("u-2"),
            RatingType::Like,
        )
        .shared(),
        PostEvent::post_title_edited(post_id, "T2").shared(),
    ];

    c.bench_function("handlers/activity_apply", |b| {
        b.iter(|| {
            for event in &events {
                view.apply(event);
            }
        });
    });
}

fn bench_dispatch_to_subscribers(c: &mut Criterion) {
    let registry = EventRegistry::new();
    register_blog_events(&registry).unwrap();
    let dispatcher = InMemoryEventDispatcher::new(Arc::new(registry));
    subscribe(Arc::new(ActivityView::new()), &dispatcher);
    subscribe_loggers(&dispatcher);

    let event = PostEvent::post_archived(AggregateId::new("p-1")).shared();

    c.bench_function("handlers/dispatch_with_subscribers", |b| {
        b.iter(|| dispatcher.dispatch(&event).unwrap());
    });
}

criterion_group!(benches, bench_apply, bench_dispatch_to_subscribers);
criterion_main!(benches);
