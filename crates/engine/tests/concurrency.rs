//! Races many registrations against one slot and checks that the
//! capacity gate admits exactly `capacity` of them.

mod common;

use sqlx::PgPool;

use common::*;
use rota_core::{Actor, CoreError};

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_registrations_never_exceed_capacity(pool: PgPool) {
    let engine = engine(pool);
    let capacity = 3;
    let (_period, _category, slot) = seed_open_slot(&engine, capacity).await;

    let attempts: Vec<_> = (1..=10)
        .map(|user_id| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine.register(slot.id, &Actor::user(user_id, vec![])).await
            })
        })
        .collect();

    // Losers surface either the capacity gate or, under lock
    // contention, a retryable conflict.
    let mut admitted = 0;
    let mut rejected = 0;
    for handle in attempts {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(CoreError::CapacityExceeded { .. }) => rejected += 1,
            Err(e) if e.is_retryable() => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(admitted, capacity);
    assert_eq!(rejected, 10 - capacity);

    let availability = engine.slot_availability(slot.id).await.unwrap();
    assert_eq!(availability.claimed, i64::from(capacity));
    assert_eq!(availability.available, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_pickups_fill_a_single_vacancy_once(pool: PgPool) {
    let engine = engine(pool);
    let (_period, _category, slot) = seed_open_slot(&engine, 1).await;
    let alice = Actor::user(1, vec![]);
    engine.register(slot.id, &alice).await.unwrap();

    let target = engine.slot_occurrences(slot.id).await.unwrap()[0].id;
    engine.drop_occurrence(target, &alice).await.unwrap();

    let attempts = (2..=6).map(|user_id| {
        let engine = engine.clone();
        async move { engine.pickup_occurrence(target, &Actor::user(user_id, vec![])).await }
    });

    let mut admitted = 0;
    for result in futures::future::join_all(attempts).await {
        match result {
            Ok(_) => admitted += 1,
            Err(CoreError::CapacityExceeded { .. }) => {}
            Err(e) if e.is_retryable() => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(admitted, 1);
}
