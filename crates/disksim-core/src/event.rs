//! Simulation events.

use std::cmp::Ordering;

use downcast_rs::{impl_downcast, Downcast};
use serde::ser::Serialize;

use crate::component::Id;

/// Identifier of an event, assigned in order of event creation.
pub type EventId = u64;

/// Trait implemented by event payloads.
///
/// Payloads are serializable (used when reporting unhandled or undelivered
/// events) and downcastable to their concrete type inside event handlers via
/// the [`cast!`](crate::cast!) macro.
pub trait EventData: Downcast + erased_serde::Serialize {}

impl_downcast!(EventData);

erased_serde::serialize_trait_object!(EventData);

impl<T: Serialize + 'static> EventData for T {}

/// An occurrence scheduled on the simulated timeline.
pub struct Event {
    /// Identifier doubling as the tie-breaking sequence number:
    /// events with equal time are processed in order of creation.
    pub id: EventId,
    /// Simulation time of event occurrence.
    pub time: f64,
    /// Identifier of event source.
    pub src: Id,
    /// Identifier of event destination.
    pub dst: Id,
    /// Event payload.
    pub data: Box<dyn EventData>,
}

impl Eq for Event {}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// Ordering is inverted to produce a min-heap out of std's BinaryHeap.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.total_cmp(&self.time).then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
