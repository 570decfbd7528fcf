//! The event log processor: every delivered event, bucketed by the tick it
//! is attributed to. Basis for saves, replay and history queries.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::types::Tick;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub received: BTreeMap<Tick, Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: Event) {
        match event.attributed_tick() {
            Some(tick) => self.received.entry(tick).or_default().push(event),
            None => log::warn!("event log: dropping unattributed {}", event.tag()),
        }
    }

    pub fn events_at(&self, tick: Tick) -> &[Event] {
        self.received.get(&tick).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Events with `start <= tick < end`; open-ended when `end` is `None`.
    pub fn events_between(
        &self,
        start: Tick,
        end: Option<Tick>,
    ) -> impl Iterator<Item = (Tick, &Event)> + '_ {
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        let range = if end.is_some_and(|e| e <= start) {
            None
        } else {
            Some(self.received.range((Bound::Included(start), upper)))
        };
        range
            .into_iter()
            .flatten()
            .flat_map(|(tick, events)| events.iter().map(move |e| (*tick, e)))
    }

    pub fn len(&self) -> usize {
        self.received.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.received.keys().next_back().copied()
    }
}

impl Process for EventLog {
    fn process(&mut self, _ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        for event in inbox {
            self.record(event);
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_by_attributed_tick() {
        let mut log = EventLog::new();
        log.record(Event::CommandTripCircuitBreaker { after_tick: 77 });
        log.record(Event::CircuitBreakerTripped { on_tick: 78 });
        log.record(Event::SimulationClockTick { tick: 78 });
        log.record(Event::OutsideClockTick { time_stamp: 1.0 });

        assert_eq!(log.events_at(77).len(), 1);
        assert_eq!(log.events_at(78).len(), 2);
        assert_eq!(log.len(), 3);
        assert_eq!(log.events_between(78, None).count(), 2);
        assert_eq!(log.events_between(0, Some(78)).count(), 1);
        assert_eq!(log.events_between(80, Some(70)).count(), 0);
    }
}
