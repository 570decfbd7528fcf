//! The fold / need / consume-or-draw / rebuffer step shared by every
//! resource-flow processor.
//!
//! RULE: Partial supply is never discarded and never double-spent. Whatever
//! a processor could not use this tick goes back into its buffer as a
//! synthetic `supply` addressed to itself and stamped with the current tick,
//! so the next tick's fold picks it up.

use crate::config::ResourceBundle;
use crate::event::Event;
use crate::types::{ProcessorId, Quantity, Resource, Tick};

/// Remove and return every buffered event due at or before `tick`,
/// keeping the rest (in arrival order) for later ticks.
pub fn take_due(buffer: &mut Vec<Event>, tick: Tick) -> Vec<Event> {
    let (due, pending): (Vec<Event>, Vec<Event>) = std::mem::take(buffer)
        .into_iter()
        .partition(|e| e.effective_tick().is_some_and(|t| t <= tick));
    *buffer = pending;
    due
}

/// Add `amount` of `resource` into `bundle`.
pub fn credit(bundle: &mut ResourceBundle, resource: Resource, amount: &Quantity) {
    *bundle.entry(resource).or_default() += amount;
}

/// Sum of every supply in `events` addressed to `id`.
pub fn supplied_to(events: &[Event], id: &ProcessorId) -> ResourceBundle {
    let mut supplied = ResourceBundle::new();
    for event in events {
        if let Event::Supply { resource, amount, to_id, .. } = event {
            if to_id == id {
                credit(&mut supplied, *resource, amount);
            }
        }
    }
    supplied
}

/// Outcome of comparing what a processor received against what it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Every need covered. `surplus` is what remains after consuming.
    Satisfied { surplus: ResourceBundle },
    /// At least one resource short. `shortfall` lists only the short ones.
    Short { shortfall: ResourceBundle },
}

pub fn settle(need: &ResourceBundle, supplied: &ResourceBundle) -> Settlement {
    let mut shortfall = ResourceBundle::new();
    for (resource, needed) in need {
        let have = supplied.get(resource).cloned().unwrap_or_default();
        if let Some(missing) = needed.checked_sub(&have) {
            if !missing.is_zero() {
                shortfall.insert(*resource, missing);
            }
        }
    }
    if !shortfall.is_empty() {
        return Settlement::Short { shortfall };
    }

    let surplus = supplied
        .iter()
        .filter_map(|(resource, have)| {
            let needed = need.get(resource).cloned().unwrap_or_default();
            let left = have.saturating_sub(&needed);
            (!left.is_zero()).then_some((*resource, left))
        })
        .collect();
    Settlement::Satisfied { surplus }
}

/// Synthetic supplies that carry `bundle` over to the next tick's fold.
pub fn rebuffer(id: &ProcessorId, bundle: &ResourceBundle, tick: Tick) -> Vec<Event> {
    bundle
        .iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(resource, amount)| Event::Supply {
            resource: *resource,
            amount: amount.clone(),
            to_id: id.clone(),
            received_tick: tick,
        })
        .collect()
}

/// One `draw` per short resource, attributed to the next tick.
pub fn draws(id: &ProcessorId, shortfall: &ResourceBundle, tick: Tick) -> Vec<Event> {
    shortfall
        .iter()
        .map(|(resource, amount)| Event::Draw {
            resource: *resource,
            amount: amount.clone(),
            for_id: id.clone(),
            received_tick: tick + 1,
        })
        .collect()
}

/// Log and reject a draw/produce/supply carrying nothing.
pub fn is_empty_amount(who: &ProcessorId, event: &Event) -> bool {
    let amount = match event {
        Event::Draw { amount, .. } | Event::Supply { amount, .. } | Event::Produce { amount, .. } => {
            amount
        }
        _ => return false,
    };
    if amount.is_zero() {
        log::warn!(
            "tick={} {who}: dropping {} with zero amount",
            event.attributed_tick().unwrap_or_default(),
            event.tag()
        );
        return true;
    }
    false
}
