//! Processor variants and the static subscription table.
//!
//! RULE: A processor is only ever enqueued events whose tag appears in its
//! variant's subscription set. The table is rebuilt from these static sets
//! on load and never edited by hand.

use crate::event::EventTag;
use crate::types::{ProcessorId, Resource};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Identifies a processor variant. Forms the prefix of every processor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessorTag {
    EventLog,
    Clock,
    Star,
    Planet,
    Collector,
    PowerGrid,
    Storage(Resource),
    Miner,
    Refiner,
    Factory,
    Launcher,
    Swarm,
    Fabricator,
    Probe,
}

use EventTag as E;

const CLOCK_SUBSCRIPTIONS: &[EventTag] = &[
    E::OutsideClockTick,
    E::CommandSimulationClockPlay,
    E::CommandSimulationClockPause,
    E::CommandSimulationClockIndirectPause,
    E::CommandSimulationClockIndirectResume,
    E::CommandSimulationClockStartEditingSpeed,
    E::CommandSimulationClockSetSpeed,
];
const STAR_SUBSCRIPTIONS: &[EventTag] = &[E::SimulationClockTick];
const PLANET_SUBSCRIPTIONS: &[EventTag] = &[E::MinePlanetSurface, E::SimulationClockTick];
const COLLECTOR_SUBSCRIPTIONS: &[EventTag] = &[
    E::StarFluxEmission,
    E::SatelliteFluxReflection,
    E::SimulationClockTick,
    E::ConstructFabricated,
];
const POWER_GRID_SUBSCRIPTIONS: &[EventTag] = &[
    E::SimulationClockTick,
    E::CommandResetCircuitBreaker,
    E::CommandTripCircuitBreaker,
    E::Produce,
    E::Draw,
];
const STORAGE_SUBSCRIPTIONS: &[EventTag] = &[E::SimulationClockTick, E::Produce, E::Draw];
const MANAGER_SUBSCRIPTIONS: &[EventTag] = &[
    E::SimulationClockTick,
    E::Supply,
    E::ConstructFabricated,
    E::CommandSetWorkingCount,
];
const SWARM_SUBSCRIPTIONS: &[EventTag] = &[
    E::SimulationClockTick,
    E::LaunchSatellite,
    E::StarFluxEmission,
];
const FABRICATOR_SUBSCRIPTIONS: &[EventTag] = &[
    E::SimulationClockTick,
    E::Supply,
    E::CommandSetFabricatorQueue,
    E::CommandClearFabricatorJob,
    E::CommandTurnOnFabricator,
    E::CommandTurnOffFabricator,
];
const PROBE_SUBSCRIPTIONS: &[EventTag] = &[E::CommandSetFabricatorQueue, E::ConstructFabricated];

// The log hears everything except raw outside samples.
const EVENT_LOG_SUBSCRIPTIONS: &[EventTag] = &[
    E::SimulationClockTick,
    E::CommandSimulationClockPlay,
    E::CommandSimulationClockPause,
    E::CommandSimulationClockIndirectPause,
    E::CommandSimulationClockIndirectResume,
    E::CommandSimulationClockStartEditingSpeed,
    E::CommandSimulationClockSetSpeed,
    E::SimulationClockPlay,
    E::SimulationClockPause,
    E::SimulationClockIndirectPause,
    E::SimulationClockIndirectResume,
    E::SimulationClockEditingSpeed,
    E::SimulationClockNewSpeed,
    E::StarFluxEmission,
    E::SatelliteFluxReflection,
    E::Produce,
    E::MinePlanetSurface,
    E::Draw,
    E::Supply,
    E::ConstructFabricated,
    E::CommandSetWorkingCount,
    E::WorkingCountSet,
    E::CommandTripCircuitBreaker,
    E::CommandResetCircuitBreaker,
    E::CircuitBreakerTripped,
    E::CircuitBreakerReset,
    E::CommandSetFabricatorQueue,
    E::FabricatorQueueSet,
    E::CommandTurnOnFabricator,
    E::CommandTurnOffFabricator,
    E::CommandClearFabricatorJob,
    E::LaunchSatellite,
];

impl ProcessorTag {
    /// Static subscription set of this variant.
    pub fn subscriptions(self) -> &'static [EventTag] {
        match self {
            ProcessorTag::EventLog   => EVENT_LOG_SUBSCRIPTIONS,
            ProcessorTag::Clock      => CLOCK_SUBSCRIPTIONS,
            ProcessorTag::Star       => STAR_SUBSCRIPTIONS,
            ProcessorTag::Planet     => PLANET_SUBSCRIPTIONS,
            ProcessorTag::Collector  => COLLECTOR_SUBSCRIPTIONS,
            ProcessorTag::PowerGrid  => POWER_GRID_SUBSCRIPTIONS,
            ProcessorTag::Storage(_) => STORAGE_SUBSCRIPTIONS,
            ProcessorTag::Miner
            | ProcessorTag::Refiner
            | ProcessorTag::Factory
            | ProcessorTag::Launcher => MANAGER_SUBSCRIPTIONS,
            ProcessorTag::Swarm      => SWARM_SUBSCRIPTIONS,
            ProcessorTag::Fabricator => FABRICATOR_SUBSCRIPTIONS,
            ProcessorTag::Probe      => PROBE_SUBSCRIPTIONS,
        }
    }

    /// Every tag this variant's step function may emit.
    pub fn emits(self) -> &'static [EventTag] {
        match self {
            ProcessorTag::EventLog | ProcessorTag::Probe => &[],
            ProcessorTag::Clock => &[
                E::SimulationClockTick,
                E::SimulationClockPlay,
                E::SimulationClockPause,
                E::SimulationClockIndirectPause,
                E::SimulationClockIndirectResume,
                E::SimulationClockEditingSpeed,
                E::SimulationClockNewSpeed,
            ],
            ProcessorTag::Star => &[E::StarFluxEmission],
            ProcessorTag::Planet | ProcessorTag::Collector => &[E::Produce],
            ProcessorTag::PowerGrid => &[
                E::Supply,
                E::CircuitBreakerTripped,
                E::CircuitBreakerReset,
            ],
            ProcessorTag::Storage(_) => &[E::Supply],
            ProcessorTag::Miner => &[E::Draw, E::MinePlanetSurface, E::WorkingCountSet],
            ProcessorTag::Refiner | ProcessorTag::Factory => {
                &[E::Draw, E::Produce, E::WorkingCountSet]
            }
            ProcessorTag::Launcher => &[E::Draw, E::LaunchSatellite, E::WorkingCountSet],
            ProcessorTag::Swarm => &[E::SatelliteFluxReflection],
            ProcessorTag::Fabricator => &[
                E::Draw,
                E::ConstructFabricated,
                E::FabricatorQueueSet,
            ],
        }
    }

    pub fn all() -> Vec<ProcessorTag> {
        let mut tags = vec![
            ProcessorTag::EventLog,
            ProcessorTag::Clock,
            ProcessorTag::Star,
            ProcessorTag::Planet,
            ProcessorTag::Collector,
            ProcessorTag::PowerGrid,
        ];
        tags.extend(STORED_RESOURCES.iter().map(|r| ProcessorTag::Storage(*r)));
        tags.extend([
            ProcessorTag::Miner,
            ProcessorTag::Refiner,
            ProcessorTag::Factory,
            ProcessorTag::Launcher,
            ProcessorTag::Swarm,
            ProcessorTag::Fabricator,
            ProcessorTag::Probe,
        ]);
        tags
    }
}

/// Resources held in a storage processor. Electricity lives in the grid.
pub const STORED_RESOURCES: [Resource; 3] =
    [Resource::Ore, Resource::Metal, Resource::PackagedSatellite];

impl fmt::Display for ProcessorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorTag::EventLog   => f.write_str("event-log"),
            ProcessorTag::Clock      => f.write_str("clock"),
            ProcessorTag::Star       => f.write_str("star"),
            ProcessorTag::Planet     => f.write_str("planet"),
            ProcessorTag::Collector  => f.write_str("collector"),
            ProcessorTag::PowerGrid  => f.write_str("power-grid"),
            ProcessorTag::Storage(r) => write!(f, "storage-{r}"),
            ProcessorTag::Miner      => f.write_str("miner"),
            ProcessorTag::Refiner    => f.write_str("refiner"),
            ProcessorTag::Factory    => f.write_str("factory"),
            ProcessorTag::Launcher   => f.write_str("launcher"),
            ProcessorTag::Swarm      => f.write_str("swarm"),
            ProcessorTag::Fabricator => f.write_str("fabricator"),
            ProcessorTag::Probe      => f.write_str("probe"),
        }
    }
}

impl FromStr for ProcessorTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessorTag::all()
            .into_iter()
            .find(|tag| tag.to_string() == s)
            .ok_or_else(|| format!("unknown processor tag {s:?}"))
    }
}

impl Serialize for ProcessorTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProcessorTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ── Table ──────────────────────────────────────────────────────

/// Event tag to the ids of every processor that must receive it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionTable {
    by_tag: BTreeMap<EventTag, BTreeSet<ProcessorId>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` under every tag in `tag`'s static subscription set.
    pub fn subscribe(&mut self, id: &ProcessorId, tag: ProcessorTag) {
        for event_tag in tag.subscriptions() {
            self.by_tag.entry(*event_tag).or_default().insert(id.clone());
        }
    }

    pub fn unsubscribe(&mut self, id: &ProcessorId) {
        self.by_tag.retain(|_, ids| {
            ids.remove(id);
            !ids.is_empty()
        });
    }

    pub fn recipients(&self, tag: EventTag) -> impl Iterator<Item = &ProcessorId> {
        self.by_tag.get(&tag).into_iter().flatten()
    }

    pub fn is_subscribed(&self, id: &ProcessorId, tag: EventTag) -> bool {
        self.by_tag.get(&tag).is_some_and(|ids| ids.contains(id))
    }
}
