//! Power grid: stores electricity and serves draws behind a circuit breaker.
//!
//! RULE: The grid never supplies on credit. When a tick's draws exceed the
//! charge, the breaker trips, nothing is supplied and the charge is left
//! untouched. A tripped grid keeps charging but supplies nothing until reset.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::production::{is_empty_amount, take_due};
use crate::types::{Quantity, Resource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerGrid {
    pub stored: Quantity,
    pub breaker_tripped: bool,
    #[serde(default)]
    pub received: Vec<Event>,
}

impl PowerGrid {
    pub fn new(stored: Quantity) -> Self {
        Self { stored, breaker_tripped: false, received: Vec::new() }
    }
}

impl Process for PowerGrid {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        let mut emitted = Vec::new();
        for event in inbox {
            match event {
                Event::Produce { resource: Resource::Electricity, .. }
                | Event::Draw { resource: Resource::Electricity, .. } => {
                    if !is_empty_amount(ctx.id, &event) {
                        self.received.push(event);
                    }
                }

                Event::CommandTripCircuitBreaker { after_tick } => {
                    self.breaker_tripped = true;
                    log::debug!("tick={after_tick} {}: breaker tripped by command", ctx.id);
                    emitted.push(Event::CircuitBreakerTripped { on_tick: after_tick + 1 });
                }

                Event::CommandResetCircuitBreaker { after_tick } => {
                    self.breaker_tripped = false;
                    log::debug!("tick={after_tick} {}: breaker reset by command", ctx.id);
                    emitted.push(Event::CircuitBreakerReset { on_tick: after_tick + 1 });
                }

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

                    if self.breaker_tripped || draws.is_empty() {
                        continue;
                    }
                    match self.stored.checked_sub(&requested) {
                        Some(left) => {
                            self.stored = left;
                            emitted.extend(draws.into_iter().map(|(to_id, amount)| Event::Supply {
                                resource: Resource::Electricity,
                                amount,
                                to_id,
                                received_tick: tick + 1,
                            }));
                        }
                        None => {
                            self.breaker_tripped = true;
                            log::debug!(
                                "tick={tick} {}: breaker tripped, requested {requested} with {} stored",
                                ctx.id,
                                self.stored
                            );
                            emitted.push(Event::CircuitBreakerTripped { on_tick: tick });
                        }
                    }
                }
                _ => {}
            }
        }
        emitted
    }
}
