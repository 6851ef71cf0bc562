//! Scheduling event bus.
//!
//! Engine operations return a pending [`ScheduleEvent`] from each
//! mutating call; callers hand it to an [`EventBus`] only after the
//! call returns, i.e. after the transaction committed. Nothing in the
//! engine depends on a process-wide emitter singleton.

pub mod bus;

pub use bus::{AvailabilityDelta, EventBus, EventKind, ScheduleEvent};
