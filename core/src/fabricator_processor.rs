//! Fabricator: works through a queue of build orders, drawing each
//! construct's cost until it is fully supplied.
//!
//! Queue pop semantics:
//!   - a single order is taken as is;
//!   - a repeat group yields its first order, and the rest of that pass
//!     followed by the group itself (count decremented, dropped at zero)
//!     go back to the FRONT of the queue;
//!   - groups that can never yield a construct are discarded.

use crate::event::{BuildOrder, Event};
use crate::processor::{Process, StepContext};
use crate::production::{draws, is_empty_amount, rebuffer, settle, supplied_to, take_due, Settlement};
use crate::types::{Construct, Tick};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fabricator {
    /// Switched on. When off the fabricator neither starts jobs nor draws.
    pub working: bool,
    pub job: Option<Construct>,
    #[serde(default)]
    pub queue: VecDeque<BuildOrder>,
    #[serde(default)]
    pub received: Vec<Event>,
}

impl Default for Fabricator {
    fn default() -> Self {
        Self { working: true, job: None, queue: VecDeque::new(), received: Vec::new() }
    }
}

/// Take the next construct to build off the front of `queue`.
pub fn pop_job(queue: &mut VecDeque<BuildOrder>) -> Option<Construct> {
    while let Some(order) = queue.pop_front() {
        match order {
            BuildOrder::Single { construct } => return Some(construct),
            group @ BuildOrder::Repeat { .. } if !group.yields_construct() => continue,
            BuildOrder::Repeat { orders, count } => {
                let remaining = count.map(|c| c.saturating_sub(1));
                if remaining != Some(0) {
                    queue.push_front(BuildOrder::Repeat { orders: orders.clone(), count: remaining });
                }
                // This pass, in order, ahead of the recycled group.
                for order in orders.into_iter().rev() {
                    queue.push_front(order);
                }
            }
        }
    }
    None
}

impl Fabricator {
    fn on_tick(&mut self, ctx: &StepContext<'_>, tick: Tick) -> Vec<Event> {
        if !self.working {
            return Vec::new();
        }
        if self.job.is_none() {
            self.job = pop_job(&mut self.queue);
            if let Some(job) = self.job {
                log::debug!("tick={tick} {}: started {job}", ctx.id);
            }
        }
        let Some(job) = self.job else {
            return Vec::new();
        };

        let due = take_due(&mut self.received, tick);
        let supplied = supplied_to(&due, ctx.id);
        let cost = ctx.rules.construction_cost(job);

        match settle(&cost, &supplied) {
            Settlement::Satisfied { surplus } => {
                log::debug!("tick={tick} {}: fabricated {job}", ctx.id);
                self.job = None;
                self.received.extend(rebuffer(ctx.id, &surplus, tick));
                vec![Event::ConstructFabricated { construct: job, received_tick: tick + 1 }]
            }
            Settlement::Short { shortfall } => {
                self.received.extend(rebuffer(ctx.id, &supplied, tick));
                draws(ctx.id, &shortfall, tick)
            }
        }
    }
}

impl Process for Fabricator {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        let mut emitted = Vec::new();
        for event in inbox {
            match event {
                Event::CommandSetFabricatorQueue { queue, after_tick } => {
                    self.queue = queue.iter().cloned().collect();
                    emitted.push(Event::FabricatorQueueSet { queue, before_tick: after_tick + 1 });
                }
                Event::CommandTurnOnFabricator { .. } => self.working = true,
                Event::CommandTurnOffFabricator { .. } => self.working = false,
                Event::CommandClearFabricatorJob { after_tick } => {
                    if let Some(job) = self.job.take() {
                        log::debug!("tick={after_tick} {}: cleared job {job}", ctx.id);
                    }
                }
                Event::Supply { ref to_id, .. } if to_id == ctx.id => {
                    if !is_empty_amount(ctx.id, &event) {
                        self.received.push(event);
                    }
                }
                Event::SimulationClockTick { tick } => emitted.extend(self.on_tick(ctx, tick)),
                _ => {}
            }
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(c: Construct) -> BuildOrder {
        BuildOrder::single(c)
    }

    #[test]
    fn finite_repeat_unrolls_in_order() {
        let mut queue = VecDeque::from([
            BuildOrder::Repeat {
                orders: vec![single(Construct::Miner), single(Construct::Collector)],
                count: Some(2),
            },
            single(Construct::Refiner),
        ]);
        let popped: Vec<_> = std::iter::from_fn(|| pop_job(&mut queue)).collect();
        assert_eq!(
            popped,
            vec![
                Construct::Miner,
                Construct::Collector,
                Construct::Miner,
                Construct::Collector,
                Construct::Refiner,
            ]
        );
    }

    #[test]
    fn infinite_repeat_never_runs_dry() {
        let mut queue = VecDeque::from([BuildOrder::Repeat {
            orders: vec![single(Construct::Collector)],
            count: None,
        }]);
        for _ in 0..5 {
            assert_eq!(pop_job(&mut queue), Some(Construct::Collector));
        }
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn nested_groups_unwrap() {
        let mut queue = VecDeque::from([BuildOrder::Repeat {
            orders: vec![
                BuildOrder::Repeat { orders: vec![single(Construct::Miner)], count: Some(2) },
                single(Construct::Launcher),
            ],
            count: Some(1),
        }]);
        let popped: Vec<_> = std::iter::from_fn(|| pop_job(&mut queue)).collect();
        assert_eq!(popped, vec![Construct::Miner, Construct::Miner, Construct::Launcher]);
    }

    #[test]
    fn empty_groups_are_discarded() {
        let mut queue = VecDeque::from([
            BuildOrder::Repeat { orders: vec![], count: None },
            single(Construct::Factory),
        ]);
        assert_eq!(pop_job(&mut queue), Some(Construct::Factory));
        assert!(queue.is_empty());
    }
}
