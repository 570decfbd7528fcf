//! Construct managers: miners, refiners, satellite factories and launchers.
//!
//! All four run the same step each tick:
//!   1. fold due inputs: supplies, newly fabricated units, working-count overrides
//!   2. need = per-unit consumption x working count
//!   3. covered  -> consume, emit output, rebuffer surplus
//!   4. short    -> draw the shortfall, rebuffer everything received
//!   5. idle     -> rebuffer everything received
//!
//! Only the output differs: miners ask the planet for ore, refiners and
//! factories produce into storage, launchers put satellites into orbit.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::production::{draws, is_empty_amount, rebuffer, settle, supplied_to, take_due, Settlement};
use crate::subscription::ProcessorTag;
use crate::types::{Construct, Count, Resource, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manager {
    pub count:   Count,
    pub working: Count,
    #[serde(default)]
    pub received: Vec<Event>,
}

impl Manager {
    /// `count` units, all of them working.
    pub fn new(count: Count) -> Self {
        Self { count, working: count, received: Vec::new() }
    }
}

fn managed_construct(tag: ProcessorTag) -> Option<Construct> {
    match tag {
        ProcessorTag::Miner    => Some(Construct::Miner),
        ProcessorTag::Refiner  => Some(Construct::Refiner),
        ProcessorTag::Factory  => Some(Construct::Factory),
        ProcessorTag::Launcher => Some(Construct::Launcher),
        _ => None,
    }
}

fn output(ctx: &StepContext<'_>, construct: Construct, working: Count, tick: Tick) -> Option<Event> {
    let received_tick = tick + 1;
    match construct {
        Construct::Miner => Some(Event::MinePlanetSurface { miner_count: working, received_tick }),
        Construct::Refiner => Some(Event::Produce {
            resource: Resource::Metal,
            amount: ctx.rules.production(construct, Resource::Metal, working),
            received_tick,
        }),
        Construct::Factory => Some(Event::Produce {
            resource: Resource::PackagedSatellite,
            amount: ctx.rules.production(construct, Resource::PackagedSatellite, working),
            received_tick,
        }),
        Construct::Launcher => Some(Event::LaunchSatellite { count: working, received_tick }),
        Construct::Collector => None,
    }
}

impl Manager {
    fn on_tick(&mut self, ctx: &StepContext<'_>, construct: Construct, tick: Tick) -> Vec<Event> {
        let due = take_due(&mut self.received, tick);

        let mut fabricated: Count = 0;
        let mut working_override = None;
        for event in &due {
            match event {
                Event::ConstructFabricated { .. } => fabricated += 1,
                Event::CommandSetWorkingCount { count, .. } => working_override = Some(*count),
                _ => {}
            }
        }
        let supplied = supplied_to(&due, ctx.id);

        self.count += fabricated;
        self.working += fabricated;
        if let Some(requested) = working_override {
            if requested > self.count {
                log::debug!(
                    "tick={tick} {}: working count {requested} clamped to {}",
                    ctx.id,
                    self.count
                );
            }
            self.working = requested.min(self.count);
        }

        if self.working == 0 {
            self.received.extend(rebuffer(ctx.id, &supplied, tick));
            return Vec::new();
        }

        let need = ctx.rules.consumption(construct, self.working);
        match settle(&need, &supplied) {
            Settlement::Satisfied { surplus } => {
                self.received.extend(rebuffer(ctx.id, &surplus, tick));
                output(ctx, construct, self.working, tick).into_iter().collect()
            }
            Settlement::Short { shortfall } => {
                self.received.extend(rebuffer(ctx.id, &supplied, tick));
                draws(ctx.id, &shortfall, tick)
            }
        }
    }
}

impl Process for Manager {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        let Some(construct) = managed_construct(ctx.tag) else {
            log::error!("{}: not a construct manager", ctx.id);
            return Vec::new();
        };

        let mut emitted = Vec::new();
        for event in inbox {
            match &event {
                Event::ConstructFabricated { construct: c, .. } if *c == construct => {
                    self.received.push(event);
                }
                Event::CommandSetWorkingCount { construct: c, count, after_tick } if *c == construct => {
                    emitted.push(Event::WorkingCountSet {
                        construct,
                        count: *count,
                        before_tick: after_tick + 1,
                    });
                    self.received.push(event);
                }
                Event::Supply { to_id, .. } if to_id == ctx.id => {
                    if !is_empty_amount(ctx.id, &event) {
                        self.received.push(event);
                    }
                }
                Event::SimulationClockTick { tick } => {
                    let tick = *tick;
                    emitted.extend(self.on_tick(ctx, construct, tick));
                }
                _ => {}
            }
        }
        emitted
    }
}
