//! The simulation engine: subscription table + processors + settle loop.
//!
//! RULES:
//!   - The only mutation path is broadcast() followed by process_until_settled().
//!   - Within a pass, processors step in id order. Every cross-processor
//!     effect is stamped for the next tick, so the order never changes
//!     the outcome.
//!   - Simulation ticks emitted in a burst are released one at a time; each
//!     tick settles fully before the next is broadcast.
//!   - Every broadcast event except raw outside-clock samples is persisted
//!     through the store before it is enqueued.
//!   - A settle round is capped at `max_settle_passes` passes.

use crate::{
    clock::{Clock, ClockState},
    collector_processor::CollectorManager,
    command::PlayerCommand,
    config::SimConfig,
    error::{SimError, SimResult},
    event::Event,
    event_log::EventLog,
    fabricator_processor::Fabricator,
    manager_processor::Manager,
    planet_processor::Planet,
    power_grid_processor::PowerGrid,
    probe_processor::ObjectiveTrigger,
    processor::{Processor, ProcessorData},
    snapshot::SaveState,
    star_processor::Star,
    storage_processor::Storage,
    store::EventStore,
    subscription::{ProcessorTag, SubscriptionTable},
    summary::SimulationSummary,
    swarm_processor::SatelliteSwarm,
    types::{ProcessorId, Quantity, Resource, Tick, TimeStamp},
};
use std::collections::{BTreeMap, VecDeque};

/// What one call to `process_until_settled` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub passes:           usize,
    pub events_delivered: usize,
    pub ticks_released:   usize,
}

pub type SettleListener = Box<dyn FnMut(&SettleReport)>;

pub struct Simulation {
    config:        SimConfig,
    subscriptions: SubscriptionTable,
    processors:    BTreeMap<ProcessorId, Processor>,
    store:         Box<dyn EventStore>,
    pending_ticks: VecDeque<Event>,
    /// Tick currently being settled, if any was released.
    settling_tick: Option<Tick>,
    last_snapshot: Option<Tick>,
    listeners:     Vec<SettleListener>,
}

impl Simulation {
    /// An empty simulation with no processors at all.
    pub fn new(config: SimConfig, store: Box<dyn EventStore>) -> Self {
        Self {
            config,
            subscriptions: SubscriptionTable::new(),
            processors:    BTreeMap::new(),
            store,
            pending_ticks: VecDeque::new(),
            settling_tick: None,
            last_snapshot: None,
            listeners:     Vec::new(),
        }
    }

    /// A simulation holding `log` under its own id plus `processors`.
    pub fn with_processors(
        config: SimConfig,
        store: Box<dyn EventStore>,
        log: EventLog,
        processors: impl IntoIterator<Item = Processor>,
    ) -> SimResult<Self> {
        let mut sim = Self::new(config, store);
        sim.insert_processor(Processor::instance(ProcessorData::EventLog(log), 0))?;
        for p in processors {
            sim.insert_processor(p)?;
        }
        Ok(sim)
    }

    /// The fixed opening position: a paused clock, one star and planet,
    /// a pre-charged grid, pre-stocked metal, the starting collectors,
    /// one of every manager and one fabricator.
    pub fn fresh_game(config: SimConfig, store: Box<dyn EventStore>) -> SimResult<Self> {
        let fresh = config.fresh_game.clone();
        let processors = vec![
            ProcessorData::Clock(Clock::new(ClockState::paused(1.0, 0))),
            ProcessorData::Star(Star::new(fresh.star_mass)),
            ProcessorData::Planet(Planet::new(fresh.planet_mass)),
            ProcessorData::Collector(CollectorManager::new(fresh.collector_count)),
            ProcessorData::PowerGrid(PowerGrid::new(fresh.grid_charge)),
            ProcessorData::Storage(Storage::new(Resource::Ore, Quantity::zero())),
            ProcessorData::Storage(Storage::new(Resource::Metal, fresh.metal_stock)),
            ProcessorData::Storage(Storage::new(Resource::PackagedSatellite, Quantity::zero())),
            ProcessorData::Miner(Manager::new(0)),
            ProcessorData::Refiner(Manager::new(0)),
            ProcessorData::Factory(Manager::new(0)),
            ProcessorData::Launcher(Manager::new(0)),
            ProcessorData::Swarm(SatelliteSwarm::new(0)),
            ProcessorData::Fabricator(Fabricator::default()),
        ]
        .into_iter()
        .map(|data| Processor::instance(data, 0))
        .collect::<Vec<_>>();

        log::info!("Starting fresh game with {} processors", processors.len() + 1);
        Self::with_processors(config, store, EventLog::new(), processors)
    }

    /// Rebuild a simulation from a save. The subscription table is derived
    /// again from each processor's static subscription set.
    pub fn load(save: SaveState, config: SimConfig, store: Box<dyn EventStore>) -> SimResult<Self> {
        log::info!(
            "Loading save: {} processors, {} logged events",
            save.processors.len(),
            save.event_log.len()
        );
        Self::with_processors(config, store, save.event_log, save.processors)
    }

    pub fn save(&self) -> SaveState {
        let event_log = self.event_log().cloned().unwrap_or_default();
        let processors = self
            .processors
            .values()
            .filter(|p| p.tag() != ProcessorTag::EventLog)
            .cloned()
            .collect();
        SaveState { event_log, processors }
    }

    // ── Bus ────────────────────────────────────────────────────

    /// Register `processor` and subscribe it to its variant's event tags.
    pub fn insert_processor(&mut self, processor: Processor) -> SimResult<()> {
        if self.processors.contains_key(&processor.id) {
            return Err(SimError::DuplicateProcessor { id: processor.id });
        }
        self.subscriptions.subscribe(&processor.id, processor.tag());
        self.store.insert_source(&processor.id)?;
        self.processors.insert(processor.id.clone(), processor);
        Ok(())
    }

    pub fn remove_processor(&mut self, id: &ProcessorId) -> SimResult<Processor> {
        let processor = self
            .processors
            .remove(id)
            .ok_or_else(|| SimError::UnknownProcessor { id: id.clone() })?;
        self.subscriptions.unsubscribe(id);
        self.store.remove_source(id)?;
        if processor.has_pending() {
            log::warn!("{id}: removed with {} undelivered events", processor.inbox.len());
        }
        Ok(processor)
    }

    /// Persist `event` (unless it is a raw clock sample) and enqueue it for
    /// every subscribed processor. Does not run any step.
    pub fn broadcast(&mut self, event: Event) -> SimResult<()> {
        let recipients: Vec<ProcessorId> =
            self.subscriptions.recipients(event.tag()).cloned().collect();

        if !event.is_outside_clock_sample() {
            self.store.persist_event(&event, &recipients)?;
        }
        if let Event::SimulationClockTick { tick } = event {
            self.settling_tick = Some(tick);
        }

        for id in &recipients {
            match self.processors.get_mut(id) {
                Some(p) => p.inbox.push_back(event.clone()),
                None => log::error!("Subscription table names missing processor {id}"),
            }
        }
        Ok(())
    }

    /// Step every processor with pending input until none has any.
    pub fn process_until_settled(&mut self) -> SimResult<SettleReport> {
        let max_passes = self.config.engine.max_settle_passes;
        let mut report = SettleReport::default();
        let mut round_passes = 0usize;

        loop {
            let ready: Vec<ProcessorId> = self
                .processors
                .values()
                .filter(|p| p.has_pending())
                .map(|p| p.id.clone())
                .collect();

            if ready.is_empty() {
                self.snapshot_if_due()?;
                match self.pending_ticks.pop_front() {
                    Some(tick) => {
                        self.broadcast(tick)?;
                        report.ticks_released += 1;
                        round_passes = 0;
                        continue;
                    }
                    None => break,
                }
            }

            round_passes += 1;
            report.passes += 1;
            if round_passes > max_passes {
                log::error!("Settle loop exceeded {max_passes} passes");
                return Err(SimError::SettleLimitExceeded { passes: max_passes });
            }

            for id in ready {
                let Some(processor) = self.processors.get_mut(&id) else {
                    continue;
                };
                report.events_delivered += processor.inbox.len();
                // Outside samples never get inbox rows.
                let persisted = processor
                    .inbox
                    .iter()
                    .filter(|e| !e.is_outside_clock_sample())
                    .count();
                let emitted = processor.step(&self.config.rules);
                let acknowledged = self.store.acknowledge_inbox(&id)?;
                if acknowledged != persisted {
                    log::warn!("{id}: store held {acknowledged} inbox rows, expected {persisted}");
                }
                for event in emitted {
                    self.route(event)?;
                }
            }
        }

        log::debug!(
            "tick={} settled: passes={} delivered={} ticks={}",
            self.current_tick(),
            report.passes,
            report.events_delivered,
            report.ticks_released
        );
        for listener in &mut self.listeners {
            listener(&report);
        }
        Ok(report)
    }

    fn route(&mut self, event: Event) -> SimResult<()> {
        if matches!(event, Event::SimulationClockTick { .. }) {
            self.pending_ticks.push_back(event);
            Ok(())
        } else {
            self.broadcast(event)
        }
    }

    /// Broadcast one stimulus and settle.
    pub fn apply(&mut self, event: Event) -> SimResult<SettleReport> {
        self.broadcast(event)?;
        self.process_until_settled()
    }

    /// Feed one wall-clock sample from the outside frame loop.
    pub fn outside_tick(&mut self, time_stamp: TimeStamp) -> SimResult<SettleReport> {
        self.apply(Event::OutsideClockTick { time_stamp })
    }

    /// Issue a player command after the current tick.
    pub fn issue(
        &mut self,
        command: PlayerCommand,
        time_stamp: Option<TimeStamp>,
    ) -> SimResult<SettleReport> {
        let event = command.into_event(self.current_tick(), time_stamp);
        self.apply(event)
    }

    pub fn on_settled(&mut self, listener: impl FnMut(&SettleReport) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ── Snapshots ──────────────────────────────────────────────

    fn snapshot_if_due(&mut self) -> SimResult<()> {
        let interval = self.config.engine.snapshot_interval;
        let Some(tick) = self.settling_tick else {
            return Ok(());
        };
        if interval == 0 || tick % interval != 0 || self.last_snapshot == Some(tick) {
            return Ok(());
        }
        for p in self.processors.values() {
            if p.tag() == ProcessorTag::EventLog {
                continue;
            }
            let json = serde_json::to_string(&p.data)?;
            self.store.persist_snapshot(tick, &p.id, &json)?;
        }
        self.last_snapshot = Some(tick);
        log::debug!("Snapshot saved at tick {tick}");
        Ok(())
    }

    /// Newest stored snapshot of processor `id` at or before `tick`.
    pub fn snapshot_of(&self, id: &ProcessorId, tick: Tick) -> SimResult<Option<(Tick, ProcessorData)>> {
        match self.store.latest_snapshot(id, tick)? {
            Some((at, json)) => Ok(Some((at, serde_json::from_str(&json)?))),
            None => Ok(None),
        }
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn processors(&self) -> &BTreeMap<ProcessorId, Processor> {
        &self.processors
    }

    pub fn processor(&self, id: &ProcessorId) -> Option<&Processor> {
        self.processors.get(id)
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn store(&self) -> &dyn EventStore {
        self.store.as_ref()
    }

    pub fn clock(&self) -> Option<&ClockState> {
        self.processors.values().find_map(|p| match &p.data {
            ProcessorData::Clock(c) => Some(&c.state),
            _ => None,
        })
    }

    /// Wall time of the clock's last anchor, if it has one.
    pub fn clock_anchor(&self) -> Option<TimeStamp> {
        self.processors.values().find_map(|p| match &p.data {
            ProcessorData::Clock(c) => c.last_tick_time_stamp,
            _ => None,
        })
    }

    pub fn current_tick(&self) -> Tick {
        self.clock().map_or(0, |c| c.tick)
    }

    pub fn event_log(&self) -> Option<&EventLog> {
        self.processors.values().find_map(|p| match &p.data {
            ProcessorData::EventLog(log) => Some(log),
            _ => None,
        })
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary::collect(self.processors.values())
    }

    /// Take every objective trigger recorded since the last call.
    pub fn drain_objective_triggers(&mut self) -> Vec<ObjectiveTrigger> {
        self.processors
            .values_mut()
            .filter_map(|p| match &mut p.data {
                ProcessorData::Probe(probe) => Some(probe.drain()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}
