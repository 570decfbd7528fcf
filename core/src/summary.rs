//! Read-only view of a simulation for the presentation layer and tooling.

use crate::processor::{Processor, ProcessorData};
use crate::types::{Construct, Count, Quantity, Resource, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructCounts {
    pub count:   Count,
    pub working: Count,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub tick:  Tick,
    pub speed: f64,
    pub mode:  String,
    /// Electricity is the grid charge; everything else is storage.
    pub stocks:          BTreeMap<Resource, Quantity>,
    pub breaker_tripped: bool,
    pub constructs:      BTreeMap<Construct, ConstructCounts>,
    pub swarm_size:      Count,
    pub star_mass:       Quantity,
    pub planet_mass:     Quantity,
    pub fabricator_on:        bool,
    pub fabricator_job:       Option<Construct>,
    pub fabricator_queue_len: usize,
    pub logged_events: usize,
}

impl SimulationSummary {
    pub fn collect<'a>(processors: impl IntoIterator<Item = &'a Processor>) -> Self {
        let mut s = SimulationSummary::default();
        for resource in Resource::ALL {
            s.stocks.insert(resource, Quantity::zero());
        }

        for p in processors {
            match &p.data {
                ProcessorData::EventLog(log) => s.logged_events += log.len(),
                ProcessorData::Clock(clock) => {
                    s.tick = clock.state.tick;
                    s.speed = clock.state.speed;
                    s.mode = clock.state.mode().to_string();
                }
                ProcessorData::Star(star) => s.star_mass += &star.mass,
                ProcessorData::Planet(planet) => s.planet_mass += &planet.mass,
                ProcessorData::Collector(c) => {
                    let entry = s.constructs.entry(Construct::Collector).or_default();
                    entry.count += c.count;
                    entry.working += c.count;
                }
                ProcessorData::PowerGrid(grid) => {
                    *s.stocks.entry(Resource::Electricity).or_default() += &grid.stored;
                    s.breaker_tripped |= grid.breaker_tripped;
                }
                ProcessorData::Storage(storage) => {
                    *s.stocks.entry(storage.resource).or_default() += &storage.stored;
                }
                ProcessorData::Miner(m)
                | ProcessorData::Refiner(m)
                | ProcessorData::Factory(m)
                | ProcessorData::Launcher(m) => {
                    let construct = match &p.data {
                        ProcessorData::Miner(_)   => Construct::Miner,
                        ProcessorData::Refiner(_) => Construct::Refiner,
                        ProcessorData::Factory(_) => Construct::Factory,
                        _                         => Construct::Launcher,
                    };
                    let entry = s.constructs.entry(construct).or_default();
                    entry.count += m.count;
                    entry.working += m.working;
                }
                ProcessorData::Swarm(swarm) => s.swarm_size += swarm.size,
                ProcessorData::Fabricator(f) => {
                    s.fabricator_on = f.working;
                    s.fabricator_job = f.job;
                    s.fabricator_queue_len = f.queue.len();
                }
                ProcessorData::Probe(_) => {}
            }
        }
        s
    }
}
