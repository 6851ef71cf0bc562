//! Shared fixtures for engine integration tests.
//!
//! Relative-date helpers build a period that surrounds "now" so that
//! registration windows are open and generated occurrences lie in the
//! future; fixed-date helpers pin down exact expansion math.

#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveTime, Utc};
use sqlx::PgPool;

use rota_core::eligibility::RoleMode;
use rota_core::types::{DbId, Timestamp};
use rota_db::models::category::{Category, CreateCategory};
use rota_db::models::period::{CreatePeriod, Period};
use rota_db::models::slot::{CreateSlot, RecurringSlot};
use rota_engine::{Engine, EngineConfig};

pub fn engine(pool: PgPool) -> Engine {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Engine::new(pool, EngineConfig::default())
}

pub fn nine_am() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

pub fn eleven_am() -> NaiveTime {
    NaiveTime::from_hms_opt(11, 0, 0).unwrap()
}

/// Weekday (0 = Sunday) of the day `days_from_now` days away.
pub fn weekday_in(days_from_now: i64) -> i16 {
    (Utc::now() + Duration::days(days_from_now))
        .date_naive()
        .weekday()
        .num_days_from_sunday() as i16
}

/// A period from yesterday to four weeks out with every window
/// unconfigured (all operation classes unrestricted).
pub fn open_period(name: &str) -> CreatePeriod {
    CreatePeriod {
        name: name.to_string(),
        starts_at: Utc::now() - Duration::days(1),
        ends_at: Utc::now() + Duration::weeks(4),
        visible_from: None,
        visible_until: None,
        signup_opens: None,
        signup_closes: None,
        modify_opens: None,
        modify_closes: None,
        allowed_role_ids: Vec::new(),
    }
}

/// A fixed two-week period: `[2025-01-06, 2025-01-20)` (Monday to
/// Monday).
pub fn two_week_january() -> CreatePeriod {
    CreatePeriod {
        name: "January 2025".to_string(),
        starts_at: ts(2025, 1, 6),
        ends_at: ts(2025, 1, 20),
        visible_from: None,
        visible_until: None,
        signup_opens: None,
        signup_closes: None,
        modify_opens: None,
        modify_closes: None,
        allowed_role_ids: Vec::new(),
    }
}

pub fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    chrono::TimeZone::with_ymd_and_hms(&Utc, y, m, d, 0, 0, 0).unwrap()
}

pub fn new_category(period_id: DbId, mode: RoleMode, required: &[DbId]) -> CreateCategory {
    CreateCategory {
        period_id,
        name: "Front desk".to_string(),
        role_mode: mode,
        required_role_ids: required.to_vec(),
        allow_self_unregister: true,
    }
}

pub fn new_slot(category_id: DbId, day_of_week: i16, capacity: i32) -> CreateSlot {
    CreateSlot {
        category_id,
        day_of_week,
        starts_at: nine_am(),
        ends_at: eleven_am(),
        capacity,
    }
}

/// Period + open category + slot on tomorrow's weekday, so the slot has
/// future occurrences and every window is open.
pub async fn seed_open_slot(
    engine: &Engine,
    capacity: i32,
) -> (Period, Category, RecurringSlot) {
    let period = engine.create_period(&open_period("Test term")).await.unwrap();
    let category = engine
        .create_category(&new_category(period.id, RoleMode::Disabled, &[]))
        .await
        .unwrap();
    let (slot, _) = engine
        .create_slot(&new_slot(category.id, weekday_in(1), capacity))
        .await
        .unwrap();
    (period, category, slot)
}
