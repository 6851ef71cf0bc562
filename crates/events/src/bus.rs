//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ScheduleEvent`]s,
//! shared via `Arc<EventBus>` by whatever transport broadcasts them
//! (the transport itself is out of scope here).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use rota_core::types::DbId;

// ---------------------------------------------------------------------------
// ScheduleEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A user registered for a recurring slot.
    SlotRegistered,
    /// A user unregistered from a recurring slot.
    SlotUnregistered,
    /// A user dropped one occurrence.
    OccurrenceDropped,
    /// A user picked up a dropped occurrence.
    OccurrencePickedUp,
    /// Occurrences of a slot were regenerated after a structural edit.
    OccurrencesRegenerated,
}

impl EventKind {
    /// Dot-separated wire name, e.g. `"slot.registered"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SlotRegistered => "slot.registered",
            EventKind::SlotUnregistered => "slot.unregistered",
            EventKind::OccurrenceDropped => "occurrence.dropped",
            EventKind::OccurrencePickedUp => "occurrence.picked_up",
            EventKind::OccurrencesRegenerated => "occurrences.regenerated",
        }
    }
}

/// Availability change carried with every event, so the broadcaster
/// can update clients without re-querying.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityDelta {
    pub available_slots: i64,
    pub total_slots: i64,
    /// Users whose schedule this event touches.
    pub affected_users: Vec<DbId>,
}

/// A scheduling domain event, emitted post-commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub kind: EventKind,
    pub slot_id: Option<DbId>,
    pub occurrence_id: Option<DbId>,
    /// The acting user (absent for administrative regeneration).
    pub user_id: Option<DbId>,
    pub period_id: DbId,
    pub timestamp: DateTime<Utc>,
    pub delta: AvailabilityDelta,
}

impl ScheduleEvent {
    /// Create a new event for a period with the current timestamp.
    ///
    /// Enrich with the builder methods before publishing.
    pub fn new(kind: EventKind, period_id: DbId) -> Self {
        Self {
            kind,
            slot_id: None,
            occurrence_id: None,
            user_id: None,
            period_id,
            timestamp: Utc::now(),
            delta: AvailabilityDelta::default(),
        }
    }

    pub fn with_slot(mut self, slot_id: DbId) -> Self {
        self.slot_id = Some(slot_id);
        self
    }

    pub fn with_occurrence(mut self, occurrence_id: DbId) -> Self {
        self.occurrence_id = Some(occurrence_id);
        self
    }

    pub fn with_user(mut self, user_id: DbId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_delta(mut self, delta: AvailabilityDelta) -> Self {
        self.delta = delta;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ScheduleEvent`].
pub struct EventBus {
    sender: broadcast::Sender<ScheduleEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped.
    pub fn publish(&self, event: ScheduleEvent) {
        // Ignore the SendError — it only means there are no receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = ScheduleEvent::new(EventKind::SlotRegistered, 3)
            .with_slot(42)
            .with_user(7)
            .with_delta(AvailabilityDelta {
                available_slots: 1,
                total_slots: 2,
                affected_users: vec![7],
            });

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.kind, EventKind::SlotRegistered);
        assert_eq!(received.slot_id, Some(42));
        assert_eq!(received.user_id, Some(7));
        assert_eq!(received.period_id, 3);
        assert_eq!(received.delta.available_slots, 1);
        assert_eq!(received.delta.affected_users, vec![7]);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ScheduleEvent::new(EventKind::OccurrenceDropped, 1).with_occurrence(9));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.occurrence_id, Some(9));
        assert_eq!(e2.occurrence_id, Some(9));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(ScheduleEvent::new(EventKind::OccurrencesRegenerated, 1));
    }

    #[test]
    fn wire_names_are_dot_separated() {
        assert_eq!(EventKind::SlotRegistered.as_str(), "slot.registered");
        assert_eq!(EventKind::OccurrencePickedUp.as_str(), "occurrence.picked_up");
    }

    #[test]
    fn serializes_with_snake_case_kind() {
        let event = ScheduleEvent::new(EventKind::SlotUnregistered, 5);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "slot_unregistered");
        assert_eq!(json["period_id"], 5);
    }
}
