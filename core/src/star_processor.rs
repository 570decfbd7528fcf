//! Star: emits a fixed stellar flux every tick.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::types::Quantity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub mass: Quantity,
}

impl Star {
    pub fn new(mass: Quantity) -> Self {
        Self { mass }
    }
}

impl Process for Star {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        inbox
            .into_iter()
            .filter_map(|event| match event {
                Event::SimulationClockTick { tick } => Some(Event::StarFluxEmission {
                    flux: ctx.rules.star_flux_per_tick.clone(),
                    received_tick: tick + 1,
                }),
                _ => None,
            })
            .collect()
    }
}
