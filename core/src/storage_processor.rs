//! Per-resource storage for ore, metal and packaged satellites.
//!
//! Supply is all-or-nothing per tick: either every due draw is served or
//! none is. Unserved draws are dropped; consumers re-draw their shortfall.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::production::{is_empty_amount, take_due};
use crate::types::{Quantity, Resource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub resource: Resource,
    pub stored:   Quantity,
    #[serde(default)]
    pub received: Vec<Event>,
}

impl Storage {
    pub fn new(resource: Resource, stored: Quantity) -> Self {
        Self { resource, stored, received: Vec::new() }
    }

    fn accepts(&self, event: &Event) -> bool {
        match event {
            Event::Produce { resource, .. } | Event::Draw { resource, .. } => *resource == self.resource,
            _ => false,
        }
    }
}

impl Process for Storage {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        let mut emitted = Vec::new();
        for event in inbox {
            match event {
                Event::SimulationClockTick { tick } => {
                    let mut produced = Quantity::zero();
                    let mut requested = Quantity::zero();
                    let mut draws = Vec::new();
                    for due in take_due(&mut self.received, tick) {
                        match due {
                            Event::Produce { amount, .. } => produced += amount,
                            Event::Draw { amount, for_id, .. } => {
                                requested += &amount;
                                draws.push((for_id, amount));
                            }
                            _ => {}
                        }
                    }
                    self.stored += produced;
                    if draws.is_empty() {
                        continue;
                    }

                    match self.stored.checked_sub(&requested) {
                        Some(left) => {
                            self.stored = left;
                            let resource = self.resource;
                            emitted.extend(draws.into_iter().map(|(to_id, amount)| Event::Supply {
                                resource,
                                amount,
                                to_id,
                                received_tick: tick + 1,
                            }));
                        }
                        None => log::debug!(
                            "tick={tick} {}: {} draws for {requested} {} unserved, {} stored",
                            ctx.id,
                            draws.len(),
                            self.resource,
                            self.stored
                        ),
                    }
                }
                other if self.accepts(&other) => {
                    if !is_empty_amount(ctx.id, &other) {
                        self.received.push(other);
                    }
                }
                _ => {}
            }
        }
        emitted
    }
}
