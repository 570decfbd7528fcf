//! Satellite swarm: grows with each launch and reflects stellar flux back
//! onto the collectors.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::production::take_due;
use crate::types::Count;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteSwarm {
    pub size: Count,
    #[serde(default)]
    pub received: Vec<Event>,
}

impl SatelliteSwarm {
    pub fn new(size: Count) -> Self {
        Self { size, received: Vec::new() }
    }
}

impl Process for SatelliteSwarm {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        let mut emitted = Vec::new();
        for event in inbox {
            match event {
                Event::LaunchSatellite { .. } | Event::StarFluxEmission { .. } => {
                    self.received.push(event)
                }
                Event::SimulationClockTick { tick } => {
                    let mut lit = false;
                    for due in take_due(&mut self.received, tick) {
                        match due {
                            Event::LaunchSatellite { count, .. } => self.size += count,
                            Event::StarFluxEmission { .. } => lit = true,
                            _ => {}
                        }
                    }
                    if lit && self.size > 0 {
                        emitted.push(Event::SatelliteFluxReflection {
                            flux: &ctx.rules.reflection_per_satellite * self.size,
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
