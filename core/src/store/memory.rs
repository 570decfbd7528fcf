//! In-memory backend. Used by tests and by runs that do not need a file.

use super::EventStore;
use crate::{
    error::SimResult,
    event::Event,
    types::{ProcessorId, Tick},
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Default)]
pub struct MemoryStore {
    events:    BTreeMap<Tick, Vec<Event>>,
    inboxes:   BTreeMap<ProcessorId, VecDeque<Event>>,
    snapshots: BTreeMap<ProcessorId, BTreeMap<Tick, String>>,
    sources:   BTreeSet<ProcessorId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryStore {
    fn persist_event(&mut self, event: &Event, recipients: &[ProcessorId]) -> SimResult<()> {
        let Some(tick) = event.attributed_tick() else {
            return Ok(());
        };
        self.events.entry(tick).or_default().push(event.clone());
        for id in recipients {
            self.inboxes.entry(id.clone()).or_default().push_back(event.clone());
        }
        Ok(())
    }

    fn events_for_tick(&self, tick: Tick) -> SimResult<Vec<Event>> {
        Ok(self.events.get(&tick).cloned().unwrap_or_default())
    }

    fn events_in_range(&self, start: Tick, end: Option<Tick>) -> SimResult<Vec<Event>> {
        Ok(self
            .events
            .range(start..)
            .take_while(|(tick, _)| end.map_or(true, |e| **tick < e))
            .flat_map(|(_, events)| events.iter().cloned())
            .collect())
    }

    fn consume_inbox(&mut self, id: &ProcessorId) -> SimResult<Vec<Event>> {
        Ok(self
            .inboxes
            .remove(id)
            .map(Vec::from)
            .unwrap_or_default())
    }

    fn acknowledge_inbox(&mut self, id: &ProcessorId) -> SimResult<usize> {
        Ok(self.inboxes.remove(id).map_or(0, |inbox| inbox.len()))
    }

    fn inbox_size(&self, id: &ProcessorId) -> SimResult<usize> {
        Ok(self.inboxes.get(id).map_or(0, VecDeque::len))
    }

    fn total_inbox_size(&self) -> SimResult<usize> {
        Ok(self.inboxes.values().map(VecDeque::len).sum())
    }

    fn persist_snapshot(&mut self, tick: Tick, id: &ProcessorId, state_json: &str) -> SimResult<()> {
        self.snapshots
            .entry(id.clone())
            .or_default()
            .insert(tick, state_json.to_string());
        Ok(())
    }

    fn latest_snapshot(&self, id: &ProcessorId, tick: Tick) -> SimResult<Option<(Tick, String)>> {
        Ok(self
            .snapshots
            .get(id)
            .and_then(|by_tick| by_tick.range(..=tick).next_back())
            .map(|(t, json)| (*t, json.clone())))
    }

    fn insert_source(&mut self, id: &ProcessorId) -> SimResult<()> {
        self.sources.insert(id.clone());
        Ok(())
    }

    fn remove_source(&mut self, id: &ProcessorId) -> SimResult<()> {
        self.inboxes.remove(id);
        self.sources.remove(id);
        Ok(())
    }

    fn sources(&self) -> SimResult<Vec<ProcessorId>> {
        Ok(self.sources.iter().cloned().collect())
    }
}
