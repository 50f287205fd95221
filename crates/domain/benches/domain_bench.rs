use common::{OrderId, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{OrderAggregate, Product, ProductStatus, User, UserRole};

fn buyer() -> User {
    User {
        id: UserId::new(1),
        email: "buyer@example.com".to_string(),
        name: "Buyer".to_string(),
        role: UserRole::Buyer,
    }
}

fn seller() -> User {
    User {
        id: UserId::new(2),
        email: "seller@example.com".to_string(),
        name: "Seller".to_string(),
        role: UserRole::Seller,
    }
}

fn listing() -> Product {
    Product {
        id: Some(ProductId::new(10)),
        name: "Benchmark Widget".to_string(),
        description: "A widget".to_string(),
        price: 2500,
        seller_id: UserId::new(2),
        is_active: true,
        status: ProductStatus::Available,
    }
}

fn bench_create_order(c: &mut Criterion) {
    let buyer = buyer();
    let seller = seller();

    c.bench_function("aggregate/create_order", |b| {
        b.iter(|| {
            let mut aggregate =
                OrderAggregate::create_order(&buyer, listing(), &seller).unwrap();
            aggregate.set_order_id(OrderId::new(1));
            aggregate.emit_creation_events().unwrap();
            aggregate.collect_events()
        });
    });
}

fn bench_full_lifecycle_paid(c: &mut Criterion) {
    let buyer = buyer();
    let seller = seller();

    c.bench_function("aggregate/create_then_pay", |b| {
        b.iter(|| {
            let mut aggregate =
                OrderAggregate::create_order(&buyer, listing(), &seller).unwrap();
            aggregate.set_order_id(OrderId::new(1));
            aggregate.emit_creation_events().unwrap();
            aggregate.process_payment().unwrap();
            aggregate.collect_events()
        });
    });
}

fn bench_full_lifecycle_cancelled(c: &mut Criterion) {
    let buyer = buyer();
    let seller = seller();

    c.bench_function("aggregate/create_then_cancel", |b| {
        b.iter(|| {
            let mut aggregate =
                OrderAggregate::create_order(&buyer, listing(), &seller).unwrap();
            aggregate.set_order_id(OrderId::new(1));
            aggregate.emit_creation_events().unwrap();
            aggregate.cancel().unwrap();
            aggregate.collect_events()
        });
    });
}

fn bench_event_serialization(c: &mut Criterion) {
    let buyer = buyer();
    let seller = seller();
    let mut aggregate = OrderAggregate::create_order(&buyer, listing(), &seller).unwrap();
    aggregate.set_order_id(OrderId::new(1));
    aggregate.emit_creation_events().unwrap();
    let events = aggregate.collect_events();

    c.bench_function("aggregate/serialize_creation_events", |b| {
        b.iter(|| {
            events
                .iter()
                .map(|e| serde_json::to_string(e).unwrap())
                .collect::<Vec<_>>()
        });
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_full_lifecycle_paid,
    bench_full_lifecycle_cancelled,
    bench_event_serialization,
);
criterion_main!(benches);
