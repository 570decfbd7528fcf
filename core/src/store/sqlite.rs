//! SQLite backend.
//!
//! RULE: Only this file talks to the database.

use super::EventStore;
use crate::{
    error::SimResult,
    event::Event,
    types::{ProcessorId, Tick},
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the event database at `path` and apply migrations.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.migrate()?;
        log::info!("Opened event store at {path}");
        Ok(store)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_events.sql"))?;
        Ok(())
    }

    fn decode(payloads: Vec<String>) -> SimResult<Vec<Event>> {
        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(Into::into))
            .collect()
    }
}

impl EventStore for SqliteStore {
    // ── Write ──────────────────────────────────────────────────

    fn persist_event(&mut self, event: &Event, recipients: &[ProcessorId]) -> SimResult<()> {
        let Some(tick) = event.attributed_tick() else {
            return Ok(());
        };
        let payload = serde_json::to_string(event)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO events (tick, time_stamp, tag, payload) VALUES (?1, ?2, ?3, ?4)",
            params![tick as i64, event.time_stamp(), event.tag().as_str(), payload],
        )?;
        let event_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO inboxes (processor_id, event_id) VALUES (?1, ?2)",
            )?;
            for id in recipients {
                stmt.execute(params![id.as_str(), event_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Read ───────────────────────────────────────────────────

    fn events_for_tick(&self, tick: Tick) -> SimResult<Vec<Event>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT payload FROM events WHERE tick = ?1 ORDER BY event_id ASC",
        )?;
        let payloads = stmt
            .query_map(params![tick as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Self::decode(payloads)
    }

    fn events_in_range(&self, start: Tick, end: Option<Tick>) -> SimResult<Vec<Event>> {
        let end = end.map(|e| e as i64).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(
            "SELECT payload FROM events WHERE tick >= ?1 AND tick < ?2
             ORDER BY tick ASC, event_id ASC",
        )?;
        let payloads = stmt
            .query_map(params![start as i64, end], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Self::decode(payloads)
    }

    fn consume_inbox(&mut self, id: &ProcessorId) -> SimResult<Vec<Event>> {
        let tx = self.conn.transaction()?;
        let payloads = {
            let mut stmt = tx.prepare_cached(
                "SELECT e.payload FROM inboxes i JOIN events e ON e.event_id = i.event_id
                 WHERE i.processor_id = ?1 ORDER BY i.inbox_id ASC",
            )?;
            let rows = stmt
                .query_map(params![id.as_str()], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        tx.execute("DELETE FROM inboxes WHERE processor_id = ?1", params![id.as_str()])?;
        tx.commit()?;
        Self::decode(payloads)
    }

    fn acknowledge_inbox(&mut self, id: &ProcessorId) -> SimResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM inboxes WHERE processor_id = ?1", params![id.as_str()])?;
        Ok(removed)
    }

    fn inbox_size(&self, id: &ProcessorId) -> SimResult<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM inboxes WHERE processor_id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    fn total_inbox_size(&self) -> SimResult<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM inboxes", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    // ── Snapshot ───────────────────────────────────────────────

    fn persist_snapshot(&mut self, tick: Tick, id: &ProcessorId, state_json: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (processor_id, tick, state_json) VALUES (?1, ?2, ?3)",
            params![id.as_str(), tick as i64, state_json],
        )?;
        Ok(())
    }

    fn latest_snapshot(&self, id: &ProcessorId, tick: Tick) -> SimResult<Option<(Tick, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT tick, state_json FROM snapshots
                 WHERE processor_id = ?1 AND tick <= ?2
                 ORDER BY tick DESC LIMIT 1",
                params![id.as_str(), tick as i64],
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(result)
    }

    // ── Sources ────────────────────────────────────────────────

    fn insert_source(&mut self, id: &ProcessorId) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO event_sources (processor_id) VALUES (?1)",
            params![id.as_str()],
        )?;
        Ok(())
    }

    fn remove_source(&mut self, id: &ProcessorId) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM inboxes WHERE processor_id = ?1", params![id.as_str()])?;
        tx.execute("DELETE FROM event_sources WHERE processor_id = ?1", params![id.as_str()])?;
        tx.commit()?;
        Ok(())
    }

    fn sources(&self) -> SimResult<Vec<ProcessorId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT processor_id FROM event_sources ORDER BY processor_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().map(ProcessorId::from).collect())
    }
}
