//! Integration tests for occurrence generation and regeneration on
//! structural edits.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use common::*;
use rota_core::eligibility::RoleMode;
use rota_core::{Actor, CoreError};
use rota_db::models::period::UpdatePeriod;
use rota_db::models::slot::UpdateSlot;
use rota_db::repositories::{OccurrenceRepo, SlotRepo};

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn two_week_period_monday_slot_yields_two_occurrences(pool: PgPool) {
    let engine = engine(pool);
    let period = engine.create_period(&two_week_january()).await.unwrap();
    let category = engine
        .create_category(&new_category(period.id, RoleMode::Disabled, &[]))
        .await
        .unwrap();

    // Monday = 1 (days from Sunday).
    let (slot, count) = engine.create_slot(&new_slot(category.id, 1, 2)).await.unwrap();
    assert_eq!(count, 2);

    let occurrences = engine.slot_occurrences(slot.id).await.unwrap();
    assert_eq!(occurrences.len(), 2);
    assert_eq!(occurrences[0].starts_at, ts(2025, 1, 6) + Duration::hours(9));
    assert_eq!(occurrences[1].starts_at, ts(2025, 1, 13) + Duration::hours(9));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn slot_that_never_occurs_is_rejected(pool: PgPool) {
    let engine = engine(pool);
    // Monday..Wednesday: a Saturday slot has no occurrence.
    let mut input = two_week_january();
    input.ends_at = ts(2025, 1, 8);
    let period = engine.create_period(&input).await.unwrap();
    let category = engine
        .create_category(&new_category(period.id, RoleMode::Disabled, &[]))
        .await
        .unwrap();

    let err = engine
        .create_slot(&new_slot(category.id, 6, 2))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_for_period_is_idempotent(pool: PgPool) {
    let engine = engine(pool);
    let (period, _category, slot) = seed_open_slot(&engine, 2).await;

    let before = engine.slot_occurrences(slot.id).await.unwrap();
    let (summary, _event) = engine.generate_for_period(period.id).await.unwrap();
    let after = engine.slot_occurrences(slot.id).await.unwrap();

    assert_eq!(summary.slots_processed, 1);
    assert_eq!(summary.slots_deleted, 0);
    assert_eq!(before.len(), after.len());
    let before_times: Vec<_> = before.iter().map(|o| o.starts_at).collect();
    let after_times: Vec<_> = after.iter().map(|o| o.starts_at).collect();
    assert_eq!(before_times, after_times);
}

// ---------------------------------------------------------------------------
// Regeneration on period edits
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn shrinking_period_removes_out_of_range_occurrences(pool: PgPool) {
    let engine = engine(pool);
    let (period, _category, slot) = seed_open_slot(&engine, 2).await;
    let before = engine.slot_occurrences(slot.id).await.unwrap();
    assert!(before.len() >= 3);

    // Keep just under two weeks of range.
    let update = UpdatePeriod {
        ends_at: Some(Utc::now() + Duration::days(13)),
        ..Default::default()
    };
    let (_, event) = engine.update_period(period.id, &update).await.unwrap();
    assert!(event.is_some());

    let after = engine.slot_occurrences(slot.id).await.unwrap();
    assert!(after.len() < before.len());
    let cutoff = Utc::now() + Duration::days(13);
    assert!(after.iter().all(|o| o.starts_at < cutoff));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn slot_with_zero_occurrences_after_shrink_is_deleted(pool: PgPool) {
    let engine = engine(pool);
    let (period, _category, slot) = seed_open_slot(&engine, 2).await;

    // Shrink to a one-day range that cannot contain the slot's weekday
    // (the slot sits on tomorrow's weekday; keep only yesterday).
    let update = UpdatePeriod {
        ends_at: Some(Utc::now() - Duration::hours(12)),
        ..Default::default()
    };
    engine.update_period(period.id, &update).await.unwrap();

    assert!(SlotRepo::find_by_id(engine.pool(), slot.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unchanged_bounds_do_not_regenerate(pool: PgPool) {
    let engine = engine(pool);
    let (period, _category, slot) = seed_open_slot(&engine, 2).await;
    let before = engine.slot_occurrences(slot.id).await.unwrap();

    let update = UpdatePeriod {
        name: Some("Renamed term".to_string()),
        ..Default::default()
    };
    let (updated, event) = engine.update_period(period.id, &update).await.unwrap();
    assert_eq!(updated.name, "Renamed term");
    assert!(event.is_none());

    let after = engine.slot_occurrences(slot.id).await.unwrap();
    let before_ids: Vec<_> = before.iter().map(|o| o.id).collect();
    let after_ids: Vec<_> = after.iter().map(|o| o.id).collect();
    assert_eq!(before_ids, after_ids, "occurrence rows should be untouched");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn regeneration_refans_standing_claims(pool: PgPool) {
    let engine = engine(pool);
    let (period, _category, slot) = seed_open_slot(&engine, 2).await;
    let alice = Actor::user(1, vec![]);
    engine.register(slot.id, &alice).await.unwrap();

    let update = UpdatePeriod {
        ends_at: Some(Utc::now() + Duration::days(13)),
        ..Default::default()
    };
    engine.update_period(period.id, &update).await.unwrap();

    // Every remaining occurrence carries Alice's assigned claim.
    let occurrences = engine.slot_occurrences(slot.id).await.unwrap();
    assert!(!occurrences.is_empty());
    for occ in &occurrences {
        let roster = engine.occurrence_roster(occ.id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].user_id, alice.user_id);
    }
}

// ---------------------------------------------------------------------------
// Slot edits
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn weekday_change_regenerates_occurrences(pool: PgPool) {
    let engine = engine(pool);
    let (_period, _category, slot) = seed_open_slot(&engine, 2).await;
    let new_day = weekday_in(3);

    let update = UpdateSlot {
        day_of_week: Some(new_day),
        ..Default::default()
    };
    let (updated, regen) = engine.update_slot(slot.id, &update).await.unwrap();
    assert_eq!(updated.day_of_week, new_day);
    let regen = regen.expect("recurrence change should regenerate");
    assert!(!regen.slot_deleted);
    assert!(regen.occurrences_created > 0);

    let occurrences = engine.slot_occurrences(slot.id).await.unwrap();
    for occ in &occurrences {
        assert_eq!(
            chrono::Datelike::weekday(&occ.starts_at.date_naive()).num_days_from_sunday() as i16,
            new_day
        );
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn capacity_change_does_not_regenerate(pool: PgPool) {
    let engine = engine(pool);
    let (_period, _category, slot) = seed_open_slot(&engine, 2).await;
    let before = engine.slot_occurrences(slot.id).await.unwrap();

    let update = UpdateSlot {
        capacity: Some(5),
        ..Default::default()
    };
    let (updated, regen) = engine.update_slot(slot.id, &update).await.unwrap();
    assert_eq!(updated.capacity, 5);
    assert!(regen.is_none());

    let after = engine.slot_occurrences(slot.id).await.unwrap();
    let before_ids: Vec<_> = before.iter().map(|o| o.id).collect();
    let after_ids: Vec<_> = after.iter().map(|o| o.id).collect();
    assert_eq!(before_ids, after_ids);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn regenerate_for_slot_replaces_rows(pool: PgPool) {
    let engine = engine(pool);
    let (_period, _category, slot) = seed_open_slot(&engine, 2).await;
    let before = engine.slot_occurrences(slot.id).await.unwrap();

    let (regen, event) = engine.regenerate_for_slot(slot.id).await.unwrap();
    assert!(!regen.slot_deleted);
    assert_eq!(regen.occurrences_created, before.len());
    assert_eq!(event.slot_id, Some(slot.id));

    let after = engine.slot_occurrences(slot.id).await.unwrap();
    assert_eq!(
        before.iter().map(|o| o.starts_at).collect::<Vec<_>>(),
        after.iter().map(|o| o.starts_at).collect::<Vec<_>>()
    );
}

// ---------------------------------------------------------------------------
// Category moves
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn category_move_regenerates_in_new_range(pool: PgPool) {
    let engine = engine(pool);
    let (_period, category, slot) = seed_open_slot(&engine, 2).await;

    // New period: two weeks, further out.
    let mut input = open_period("Next term");
    input.starts_at = Utc::now() + Duration::weeks(6);
    input.ends_at = Utc::now() + Duration::weeks(8);
    let next = engine.create_period(&input).await.unwrap();

    let (moved, event) = engine.move_category(category.id, next.id).await.unwrap();
    assert_eq!(moved.period_id, next.id);
    assert_eq!(event.period_id, next.id);

    let occurrences = engine.slot_occurrences(slot.id).await.unwrap();
    assert_eq!(occurrences.len(), 2);
    for occ in &occurrences {
        assert!(occ.starts_at >= next.starts_at && occ.starts_at < next.ends_at);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn category_move_deletes_slot_with_no_occurrence_in_new_range(pool: PgPool) {
    let engine = engine(pool);
    let (_period, category, slot) = seed_open_slot(&engine, 2).await;

    // Two-day target range that misses the slot's weekday: the slot
    // sits on tomorrow's weekday, so start three days out.
    let mut input = open_period("Short window");
    input.starts_at = Utc::now() + Duration::days(3);
    input.ends_at = Utc::now() + Duration::days(5);
    let next = engine.create_period(&input).await.unwrap();

    engine.move_category(category.id, next.id).await.unwrap();

    assert!(SlotRepo::find_by_id(engine.pool(), slot.id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn inverted_period_bounds_are_rejected(pool: PgPool) {
    let engine = engine(pool);
    let mut input = two_week_january();
    input.starts_at = ts(2025, 2, 1);
    let err = engine.create_period(&input).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inverted_signup_window_is_rejected(pool: PgPool) {
    let engine = engine(pool);
    let mut input = two_week_january();
    input.signup_opens = Some(ts(2025, 1, 10));
    input.signup_closes = Some(ts(2025, 1, 8));
    let err = engine.create_period(&input).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_cannot_invert_window_pair(pool: PgPool) {
    let engine = engine(pool);
    let mut input = two_week_january();
    input.signup_opens = Some(ts(2025, 1, 2));
    let period = engine.create_period(&input).await.unwrap();

    // Closing before the existing open instant inverts the pair.
    let update = UpdatePeriod {
        signup_closes: Some(Some(ts(2025, 1, 1))),
        ..Default::default()
    };
    let err = engine.update_period(period.id, &update).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn occurrences_match_slot_recurrence(pool: PgPool) {
    let engine = engine(pool);
    let period = engine.create_period(&two_week_january()).await.unwrap();
    let category = engine
        .create_category(&new_category(period.id, RoleMode::Disabled, &[]))
        .await
        .unwrap();
    let (slot, _) = engine.create_slot(&new_slot(category.id, 3, 1)).await.unwrap();

    let mut conn = engine.pool().acquire().await.unwrap();
    let count = OccurrenceRepo::count_for_slot(&mut conn, slot.id).await.unwrap();
    assert_eq!(count, 2, "two Wednesdays in a two-week span");
}
