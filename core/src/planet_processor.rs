//! Planet: turns miner activity into ore, never more than its remaining mass.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::production::take_due;
use crate::types::{Construct, Quantity, Resource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub mass: Quantity,
    #[serde(default)]
    pub received: Vec<Event>,
}

impl Planet {
    pub fn new(mass: Quantity) -> Self {
        Self { mass, received: Vec::new() }
    }
}

impl Process for Planet {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        let mut emitted = Vec::new();
        for event in inbox {
            match event {
                Event::MinePlanetSurface { .. } => self.received.push(event),
                Event::SimulationClockTick { tick } => {
                    let requested: Quantity = take_due(&mut self.received, tick)
                        .iter()
                        .filter_map(|e| match e {
                            Event::MinePlanetSurface { miner_count, .. } => Some(
                                ctx.rules.production(Construct::Miner, Resource::Ore, *miner_count),
                            ),
                            _ => None,
                        })
                        .sum();
                    let mined = requested.min(self.mass.clone());
                    if mined.is_zero() {
                        continue;
                    }
                    self.mass = self.mass.saturating_sub(&mined);
                    log::debug!("tick={tick} {}: mined {mined} ore, {} left", ctx.id, self.mass);
                    emitted.push(Event::Produce {
                        resource: Resource::Ore,
                        amount: mined,
                        received_tick: tick + 1,
                    });
                }
                _ => {}
            }
        }
        emitted
    }
}
