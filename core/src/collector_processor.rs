//! Collector manager: converts stellar and reflected flux into electricity.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::production::take_due;
use crate::types::{Construct, Count, Quantity, Resource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorManager {
    pub count: Count,
    #[serde(default)]
    pub received: Vec<Event>,
}

impl CollectorManager {
    pub fn new(count: Count) -> Self {
        Self { count, received: Vec::new() }
    }
}

impl Process for CollectorManager {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        let mut emitted = Vec::new();
        for event in inbox {
            match event {
                Event::ConstructFabricated { construct: Construct::Collector, .. }
                | Event::StarFluxEmission { .. }
                | Event::SatelliteFluxReflection { .. } => self.received.push(event),

                Event::SimulationClockTick { tick } => {
                    let mut flux = Quantity::zero();
                    for due in take_due(&mut self.received, tick) {
                        match due {
                            Event::ConstructFabricated { .. } => self.count += 1,
                            Event::StarFluxEmission { flux: f, .. }
                            | Event::SatelliteFluxReflection { flux: f, .. } => flux += f,
                            _ => {}
                        }
                    }
                    let per_flux =
                        ctx.rules.production(Construct::Collector, Resource::Electricity, self.count);
                    let produced = &per_flux * &flux;
                    if !produced.is_zero() {
                        emitted.push(Event::Produce {
                            resource: Resource::Electricity,
                            amount: produced,
                            received_tick: tick + 1,
                        });
                    }
                }
                _ => {}
            }
        }
        emitted
    }
}
