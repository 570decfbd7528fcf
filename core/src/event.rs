//! The event bus vocabulary: every record processors exchange.
//!
//! RULE: Processors communicate ONLY through events.
//! A processor never reads another processor's state.
//!
//! RULE: Every cross-processor effect is stamped with the tick at which it
//! becomes attributable (`received_tick`, `before_tick`, `on_tick`).
//! Emitters always stamp the NEXT tick, never the current one.

use crate::types::{Construct, Count, ProcessorId, Quantity, Resource, Tick, TimeStamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every event that may cross the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "kebab-case")]
pub enum Event {
    // ── Timing ─────────────────────────────────────
    /// Raw wall-clock sample from the outside frame loop. Never persisted.
    OutsideClockTick {
        time_stamp: TimeStamp,
    },
    SimulationClockTick {
        tick: Tick,
    },

    // ── Clock commands ─────────────────────────────
    CommandSimulationClockPlay {
        after_tick: Tick,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_stamp: Option<TimeStamp>,
    },
    CommandSimulationClockPause {
        after_tick: Tick,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_stamp: Option<TimeStamp>,
    },
    CommandSimulationClockIndirectPause {
        after_tick: Tick,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_stamp: Option<TimeStamp>,
    },
    CommandSimulationClockIndirectResume {
        after_tick: Tick,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_stamp: Option<TimeStamp>,
    },
    CommandSimulationClockStartEditingSpeed {
        after_tick: Tick,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_stamp: Option<TimeStamp>,
    },
    CommandSimulationClockSetSpeed {
        speed: f64,
        after_tick: Tick,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_stamp: Option<TimeStamp>,
    },

    // ── Clock notices ──────────────────────────────
    SimulationClockPlay {
        before_tick: Tick,
    },
    SimulationClockPause {
        before_tick: Tick,
    },
    SimulationClockIndirectPause {
        before_tick: Tick,
    },
    SimulationClockIndirectResume {
        before_tick: Tick,
    },
    SimulationClockEditingSpeed {
        before_tick: Tick,
    },
    SimulationClockNewSpeed {
        speed: f64,
        before_tick: Tick,
    },

    // ── Flux and production ────────────────────────
    StarFluxEmission {
        flux: Quantity,
        received_tick: Tick,
    },
    SatelliteFluxReflection {
        flux: Quantity,
        received_tick: Tick,
    },
    Produce {
        resource: Resource,
        amount: Quantity,
        received_tick: Tick,
    },
    MinePlanetSurface {
        miner_count: Count,
        received_tick: Tick,
    },

    // ── Power and material exchange ────────────────
    Draw {
        resource: Resource,
        amount: Quantity,
        for_id: ProcessorId,
        received_tick: Tick,
    },
    Supply {
        resource: Resource,
        amount: Quantity,
        to_id: ProcessorId,
        received_tick: Tick,
    },

    // ── Construct lifecycle ────────────────────────
    ConstructFabricated {
        construct: Construct,
        received_tick: Tick,
    },
    CommandSetWorkingCount {
        construct: Construct,
        count: Count,
        after_tick: Tick,
    },
    WorkingCountSet {
        construct: Construct,
        count: Count,
        before_tick: Tick,
    },
    CommandTripCircuitBreaker {
        after_tick: Tick,
    },
    CommandResetCircuitBreaker {
        after_tick: Tick,
    },
    CircuitBreakerTripped {
        on_tick: Tick,
    },
    CircuitBreakerReset {
        on_tick: Tick,
    },

    // ── Fabrication ────────────────────────────────
    CommandSetFabricatorQueue {
        queue: Vec<BuildOrder>,
        after_tick: Tick,
    },
    FabricatorQueueSet {
        queue: Vec<BuildOrder>,
        before_tick: Tick,
    },
    CommandTurnOnFabricator {
        after_tick: Tick,
    },
    CommandTurnOffFabricator {
        after_tick: Tick,
    },
    CommandClearFabricatorJob {
        after_tick: Tick,
    },
    LaunchSatellite {
        count: Count,
        received_tick: Tick,
    },
}

impl Event {
    pub fn tag(&self) -> EventTag {
        use Event as E;
        use EventTag as T;
        match self {
            E::OutsideClockTick { .. }                        => T::OutsideClockTick,
            E::SimulationClockTick { .. }                     => T::SimulationClockTick,
            E::CommandSimulationClockPlay { .. }              => T::CommandSimulationClockPlay,
            E::CommandSimulationClockPause { .. }             => T::CommandSimulationClockPause,
            E::CommandSimulationClockIndirectPause { .. }     => T::CommandSimulationClockIndirectPause,
            E::CommandSimulationClockIndirectResume { .. }    => T::CommandSimulationClockIndirectResume,
            E::CommandSimulationClockStartEditingSpeed { .. } => T::CommandSimulationClockStartEditingSpeed,
            E::CommandSimulationClockSetSpeed { .. }          => T::CommandSimulationClockSetSpeed,
            E::SimulationClockPlay { .. }                     => T::SimulationClockPlay,
            E::SimulationClockPause { .. }                    => T::SimulationClockPause,
            E::SimulationClockIndirectPause { .. }            => T::SimulationClockIndirectPause,
            E::SimulationClockIndirectResume { .. }           => T::SimulationClockIndirectResume,
            E::SimulationClockEditingSpeed { .. }             => T::SimulationClockEditingSpeed,
            E::SimulationClockNewSpeed { .. }                 => T::SimulationClockNewSpeed,
            E::StarFluxEmission { .. }                        => T::StarFluxEmission,
            E::SatelliteFluxReflection { .. }                 => T::SatelliteFluxReflection,
            E::Produce { .. }                                 => T::Produce,
            E::MinePlanetSurface { .. }                       => T::MinePlanetSurface,
            E::Draw { .. }                                    => T::Draw,
            E::Supply { .. }                                  => T::Supply,
            E::ConstructFabricated { .. }                     => T::ConstructFabricated,
            E::CommandSetWorkingCount { .. }                  => T::CommandSetWorkingCount,
            E::WorkingCountSet { .. }                         => T::WorkingCountSet,
            E::CommandTripCircuitBreaker { .. }               => T::CommandTripCircuitBreaker,
            E::CommandResetCircuitBreaker { .. }              => T::CommandResetCircuitBreaker,
            E::CircuitBreakerTripped { .. }                   => T::CircuitBreakerTripped,
            E::CircuitBreakerReset { .. }                     => T::CircuitBreakerReset,
            E::CommandSetFabricatorQueue { .. }               => T::CommandSetFabricatorQueue,
            E::FabricatorQueueSet { .. }                      => T::FabricatorQueueSet,
            E::CommandTurnOnFabricator { .. }                 => T::CommandTurnOnFabricator,
            E::CommandTurnOffFabricator { .. }                => T::CommandTurnOffFabricator,
            E::CommandClearFabricatorJob { .. }               => T::CommandClearFabricatorJob,
            E::LaunchSatellite { .. }                         => T::LaunchSatellite,
        }
    }

    /// The tick this event is logged under: the tick field it carries, or
    /// for a clock tick the tick it advances the simulation to.
    /// `None` only for raw outside-clock samples.
    pub fn attributed_tick(&self) -> Option<Tick> {
        use Event as E;
        match self {
            E::OutsideClockTick { .. } => None,

            E::SimulationClockTick { tick } => Some(*tick),

            E::CommandSimulationClockPlay { after_tick, .. }
            | E::CommandSimulationClockPause { after_tick, .. }
            | E::CommandSimulationClockIndirectPause { after_tick, .. }
            | E::CommandSimulationClockIndirectResume { after_tick, .. }
            | E::CommandSimulationClockStartEditingSpeed { after_tick, .. }
            | E::CommandSimulationClockSetSpeed { after_tick, .. }
            | E::CommandSetWorkingCount { after_tick, .. }
            | E::CommandTripCircuitBreaker { after_tick }
            | E::CommandResetCircuitBreaker { after_tick }
            | E::CommandSetFabricatorQueue { after_tick, .. }
            | E::CommandTurnOnFabricator { after_tick }
            | E::CommandTurnOffFabricator { after_tick }
            | E::CommandClearFabricatorJob { after_tick } => Some(*after_tick),

            E::SimulationClockPlay { before_tick }
            | E::SimulationClockPause { before_tick }
            | E::SimulationClockIndirectPause { before_tick }
            | E::SimulationClockIndirectResume { before_tick }
            | E::SimulationClockEditingSpeed { before_tick }
            | E::SimulationClockNewSpeed { before_tick, .. }
            | E::WorkingCountSet { before_tick, .. }
            | E::FabricatorQueueSet { before_tick, .. } => Some(*before_tick),

            E::CircuitBreakerTripped { on_tick } | E::CircuitBreakerReset { on_tick } => {
                Some(*on_tick)
            }

            E::StarFluxEmission { received_tick, .. }
            | E::SatelliteFluxReflection { received_tick, .. }
            | E::Produce { received_tick, .. }
            | E::MinePlanetSurface { received_tick, .. }
            | E::Draw { received_tick, .. }
            | E::Supply { received_tick, .. }
            | E::ConstructFabricated { received_tick, .. }
            | E::LaunchSatellite { received_tick, .. } => Some(*received_tick),
        }
    }

    /// The first tick whose step may act on this event. A command issued
    /// after tick `t` takes effect at `t + 1`; everything else at its
    /// attributed tick.
    pub fn effective_tick(&self) -> Option<Tick> {
        let tick = self.attributed_tick()?;
        if self.tag().is_command() {
            Some(tick + 1)
        } else {
            Some(tick)
        }
    }

    /// Wall-clock stamp carried by outside samples and clock commands.
    pub fn time_stamp(&self) -> Option<TimeStamp> {
        use Event as E;
        match self {
            E::OutsideClockTick { time_stamp } => Some(*time_stamp),
            E::CommandSimulationClockPlay { time_stamp, .. }
            | E::CommandSimulationClockPause { time_stamp, .. }
            | E::CommandSimulationClockIndirectPause { time_stamp, .. }
            | E::CommandSimulationClockIndirectResume { time_stamp, .. }
            | E::CommandSimulationClockStartEditingSpeed { time_stamp, .. }
            | E::CommandSimulationClockSetSpeed { time_stamp, .. } => *time_stamp,
            _ => None,
        }
    }

    pub fn is_outside_clock_sample(&self) -> bool {
        matches!(self, Event::OutsideClockTick { .. })
    }
}

// ── Tags ───────────────────────────────────────────────────────

/// Data-free discriminant of [`Event`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventTag {
    OutsideClockTick,
    SimulationClockTick,
    CommandSimulationClockPlay,
    CommandSimulationClockPause,
    CommandSimulationClockIndirectPause,
    CommandSimulationClockIndirectResume,
    CommandSimulationClockStartEditingSpeed,
    CommandSimulationClockSetSpeed,
    SimulationClockPlay,
    SimulationClockPause,
    SimulationClockIndirectPause,
    SimulationClockIndirectResume,
    SimulationClockEditingSpeed,
    SimulationClockNewSpeed,
    StarFluxEmission,
    SatelliteFluxReflection,
    Produce,
    MinePlanetSurface,
    Draw,
    Supply,
    ConstructFabricated,
    CommandSetWorkingCount,
    WorkingCountSet,
    CommandTripCircuitBreaker,
    CommandResetCircuitBreaker,
    CircuitBreakerTripped,
    CircuitBreakerReset,
    CommandSetFabricatorQueue,
    FabricatorQueueSet,
    CommandTurnOnFabricator,
    CommandTurnOffFabricator,
    CommandClearFabricatorJob,
    LaunchSatellite,
}

impl EventTag {
    pub const ALL: [EventTag; 33] = [
        EventTag::OutsideClockTick,
        EventTag::SimulationClockTick,
        EventTag::CommandSimulationClockPlay,
        EventTag::CommandSimulationClockPause,
        EventTag::CommandSimulationClockIndirectPause,
        EventTag::CommandSimulationClockIndirectResume,
        EventTag::CommandSimulationClockStartEditingSpeed,
        EventTag::CommandSimulationClockSetSpeed,
        EventTag::SimulationClockPlay,
        EventTag::SimulationClockPause,
        EventTag::SimulationClockIndirectPause,
        EventTag::SimulationClockIndirectResume,
        EventTag::SimulationClockEditingSpeed,
        EventTag::SimulationClockNewSpeed,
        EventTag::StarFluxEmission,
        EventTag::SatelliteFluxReflection,
        EventTag::Produce,
        EventTag::MinePlanetSurface,
        EventTag::Draw,
        EventTag::Supply,
        EventTag::ConstructFabricated,
        EventTag::CommandSetWorkingCount,
        EventTag::WorkingCountSet,
        EventTag::CommandTripCircuitBreaker,
        EventTag::CommandResetCircuitBreaker,
        EventTag::CircuitBreakerTripped,
        EventTag::CircuitBreakerReset,
        EventTag::CommandSetFabricatorQueue,
        EventTag::FabricatorQueueSet,
        EventTag::CommandTurnOnFabricator,
        EventTag::CommandTurnOffFabricator,
        EventTag::CommandClearFabricatorJob,
        EventTag::LaunchSatellite,
    ];

    /// Stable wire name, identical to the serialized `tag` field.
    pub fn as_str(self) -> &'static str {
        use EventTag as T;
        match self {
            T::OutsideClockTick                        => "outside-clock-tick",
            T::SimulationClockTick                     => "simulation-clock-tick",
            T::CommandSimulationClockPlay              => "command-simulation-clock-play",
            T::CommandSimulationClockPause             => "command-simulation-clock-pause",
            T::CommandSimulationClockIndirectPause     => "command-simulation-clock-indirect-pause",
            T::CommandSimulationClockIndirectResume    => "command-simulation-clock-indirect-resume",
            T::CommandSimulationClockStartEditingSpeed => "command-simulation-clock-start-editing-speed",
            T::CommandSimulationClockSetSpeed          => "command-simulation-clock-set-speed",
            T::SimulationClockPlay                     => "simulation-clock-play",
            T::SimulationClockPause                    => "simulation-clock-pause",
            T::SimulationClockIndirectPause            => "simulation-clock-indirect-pause",
            T::SimulationClockIndirectResume           => "simulation-clock-indirect-resume",
            T::SimulationClockEditingSpeed             => "simulation-clock-editing-speed",
            T::SimulationClockNewSpeed                 => "simulation-clock-new-speed",
            T::StarFluxEmission                        => "star-flux-emission",
            T::SatelliteFluxReflection                 => "satellite-flux-reflection",
            T::Produce                                 => "produce",
            T::MinePlanetSurface                       => "mine-planet-surface",
            T::Draw                                    => "draw",
            T::Supply                                  => "supply",
            T::ConstructFabricated                     => "construct-fabricated",
            T::CommandSetWorkingCount                  => "command-set-working-count",
            T::WorkingCountSet                         => "working-count-set",
            T::CommandTripCircuitBreaker               => "command-trip-circuit-breaker",
            T::CommandResetCircuitBreaker              => "command-reset-circuit-breaker",
            T::CircuitBreakerTripped                   => "circuit-breaker-tripped",
            T::CircuitBreakerReset                     => "circuit-breaker-reset",
            T::CommandSetFabricatorQueue               => "command-set-fabricator-queue",
            T::FabricatorQueueSet                      => "fabricator-queue-set",
            T::CommandTurnOnFabricator                 => "command-turn-on-fabricator",
            T::CommandTurnOffFabricator                => "command-turn-off-fabricator",
            T::CommandClearFabricatorJob               => "command-clear-fabricator-job",
            T::LaunchSatellite                         => "launch-satellite",
        }
    }

    pub fn is_command(self) -> bool {
        self.as_str().starts_with("command-")
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Build orders ───────────────────────────────────────────────

/// One entry in the fabricator queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BuildOrder {
    Single {
        construct: Construct,
    },
    /// Repeat `orders` `count` times; `None` repeats forever.
    Repeat {
        orders: Vec<BuildOrder>,
        #[serde(default)]
        count: Option<u32>,
    },
}

impl BuildOrder {
    pub fn single(construct: Construct) -> Self {
        BuildOrder::Single { construct }
    }

    /// True when popping this order can ever yield a construct.
    pub fn yields_construct(&self) -> bool {
        match self {
            BuildOrder::Single { .. } => true,
            BuildOrder::Repeat { orders, count } => {
                *count != Some(0) && orders.iter().any(BuildOrder::yields_construct)
            }
        }
    }
}
