//! Durable-store adapter.
//!
//! RULE: The engine talks to persistence ONLY through EventStore.
//! Processors never see the store. A store instance is built by the caller
//! and handed to the Simulation; there is no process-wide connection.
//!
//! Four paths:
//!   write     persist_event: committed events keyed by tick / timestamp,
//!             plus one inbox row per recipient
//!   read      events_for_tick, events_in_range, consume_inbox, inbox sizes,
//!             acknowledge_inbox once a step has run
//!   snapshot  opaque processor state keyed by processor id and tick
//!   sources   processor identities known to the inbox path

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{
    error::SimResult,
    event::Event,
    types::{ProcessorId, Tick},
};

pub trait EventStore {
    // ── Write ──────────────────────────────────────────────────

    fn persist_event(&mut self, event: &Event, recipients: &[ProcessorId]) -> SimResult<()>;

    // ── Read ───────────────────────────────────────────────────

    fn events_for_tick(&self, tick: Tick) -> SimResult<Vec<Event>>;

    /// Events attributed to `start <= tick < end`, open-ended when `end`
    /// is `None`, in commit order within each tick.
    fn events_in_range(&self, start: Tick, end: Option<Tick>) -> SimResult<Vec<Event>>;

    /// Remove and return every event still addressed to `id`.
    fn consume_inbox(&mut self, id: &ProcessorId) -> SimResult<Vec<Event>>;

    /// Drop every inbox row addressed to `id` without decoding it.
    /// Returns how many rows were removed.
    fn acknowledge_inbox(&mut self, id: &ProcessorId) -> SimResult<usize>;

    fn inbox_size(&self, id: &ProcessorId) -> SimResult<usize>;

    fn total_inbox_size(&self) -> SimResult<usize>;

    // ── Snapshot ───────────────────────────────────────────────

    fn persist_snapshot(&mut self, tick: Tick, id: &ProcessorId, state_json: &str) -> SimResult<()>;

    /// Newest snapshot of `id` taken at or before `tick`.
    fn latest_snapshot(&self, id: &ProcessorId, tick: Tick) -> SimResult<Option<(Tick, String)>>;

    // ── Sources ────────────────────────────────────────────────

    fn insert_source(&mut self, id: &ProcessorId) -> SimResult<()>;

    /// Forget `id` along with any inbox rows still addressed to it.
    fn remove_source(&mut self, id: &ProcessorId) -> SimResult<()>;

    fn sources(&self) -> SimResult<Vec<ProcessorId>>;
}
