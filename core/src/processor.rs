//! Processor envelope and the step dispatcher.
//!
//! RULE: Every processor variant implements Process.
//! The engine drains a processor's inbox and hands it to process() in one
//! go; the step runs to completion and returns the events it emits.
//! Steps are total: bad input is logged and dropped, never an error.

use crate::clock::Clock;
use crate::collector_processor::CollectorManager;
use crate::config::GameRules;
use crate::event::Event;
use crate::event_log::EventLog;
use crate::fabricator_processor::Fabricator;
use crate::manager_processor::Manager;
use crate::planet_processor::Planet;
use crate::power_grid_processor::PowerGrid;
use crate::probe_processor::ObjectiveProbe;
use crate::star_processor::Star;
use crate::storage_processor::Storage;
use crate::subscription::ProcessorTag;
use crate::swarm_processor::SatelliteSwarm;
use crate::types::ProcessorId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What a step may look at besides its own state and inbox.
pub struct StepContext<'a> {
    pub id:    &'a ProcessorId,
    pub tag:   ProcessorTag,
    pub rules: &'a GameRules,
}

/// The contract every processor variant fulfils.
pub trait Process {
    /// Consume `inbox` (already filtered to this variant's subscriptions)
    /// and return the events to broadcast.
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event>;
}

/// Variant-specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "state", rename_all = "kebab-case")]
pub enum ProcessorData {
    EventLog(EventLog),
    Clock(Clock),
    Star(Star),
    Planet(Planet),
    Collector(CollectorManager),
    PowerGrid(PowerGrid),
    Storage(Storage),
    Miner(Manager),
    Refiner(Manager),
    Factory(Manager),
    Launcher(Manager),
    Swarm(SatelliteSwarm),
    Fabricator(Fabricator),
    Probe(ObjectiveProbe),
}

impl ProcessorData {
    pub fn tag(&self) -> ProcessorTag {
        match self {
            ProcessorData::EventLog(_)   => ProcessorTag::EventLog,
            ProcessorData::Clock(_)      => ProcessorTag::Clock,
            ProcessorData::Star(_)       => ProcessorTag::Star,
            ProcessorData::Planet(_)     => ProcessorTag::Planet,
            ProcessorData::Collector(_)  => ProcessorTag::Collector,
            ProcessorData::PowerGrid(_)  => ProcessorTag::PowerGrid,
            ProcessorData::Storage(s)    => ProcessorTag::Storage(s.resource),
            ProcessorData::Miner(_)      => ProcessorTag::Miner,
            ProcessorData::Refiner(_)    => ProcessorTag::Refiner,
            ProcessorData::Factory(_)    => ProcessorTag::Factory,
            ProcessorData::Launcher(_)   => ProcessorTag::Launcher,
            ProcessorData::Swarm(_)      => ProcessorTag::Swarm,
            ProcessorData::Fabricator(_) => ProcessorTag::Fabricator,
            ProcessorData::Probe(_)      => ProcessorTag::Probe,
        }
    }

    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        match self {
            ProcessorData::EventLog(p)   => p.process(ctx, inbox),
            ProcessorData::Clock(p)      => p.process(ctx, inbox),
            ProcessorData::Star(p)       => p.process(ctx, inbox),
            ProcessorData::Planet(p)     => p.process(ctx, inbox),
            ProcessorData::Collector(p)  => p.process(ctx, inbox),
            ProcessorData::PowerGrid(p)  => p.process(ctx, inbox),
            ProcessorData::Storage(p)    => p.process(ctx, inbox),
            ProcessorData::Miner(p)
            | ProcessorData::Refiner(p)
            | ProcessorData::Factory(p)
            | ProcessorData::Launcher(p) => p.process(ctx, inbox),
            ProcessorData::Swarm(p)      => p.process(ctx, inbox),
            ProcessorData::Fabricator(p) => p.process(ctx, inbox),
            ProcessorData::Probe(p)      => p.process(ctx, inbox),
        }
    }
}

// ── Envelope ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processor {
    pub id: ProcessorId,
    #[serde(default, skip_serializing_if = "VecDeque::is_empty")]
    pub inbox: VecDeque<Event>,
    pub data: ProcessorData,
}

impl Processor {
    pub fn new(id: ProcessorId, data: ProcessorData) -> Self {
        Self { id, inbox: VecDeque::new(), data }
    }

    /// Build a processor whose id is `"{tag}-{instance}"`.
    pub fn instance(data: ProcessorData, instance: u32) -> Self {
        Self::new(ProcessorId::new(data.tag(), instance), data)
    }

    pub fn tag(&self) -> ProcessorTag {
        self.data.tag()
    }

    pub fn has_pending(&self) -> bool {
        !self.inbox.is_empty()
    }

    /// Drain the inbox through this processor's step function.
    pub fn step(&mut self, rules: &GameRules) -> Vec<Event> {
        let inbox: Vec<Event> = self.inbox.drain(..).collect();
        let ctx = StepContext { id: &self.id, tag: self.data.tag(), rules };
        self.data.process(&ctx, inbox)
    }
}
