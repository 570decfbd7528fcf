//! Replay: an initial save plus every stimulus applied since.
//!
//! Because every step is deterministic, feeding the same stimuli to the
//! same starting state must reproduce the same processors. `verify` checks
//! that and names the first stimulus after which the runs disagree.

use crate::{
    config::SimConfig,
    engine::{SettleReport, Simulation},
    error::{SimError, SimResult},
    event::Event,
    snapshot::SaveState,
    store::{EventStore, MemoryStore},
    summary::SimulationSummary,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub initial: SaveState,
    pub stimuli: Vec<Event>,
    /// Summary of the live run after each stimulus.
    pub checkpoints: Vec<SimulationSummary>,
}

impl ReplayLog {
    /// Start recording from `sim`'s current state.
    pub fn start(sim: &Simulation) -> Self {
        Self { initial: sim.save(), stimuli: Vec::new(), checkpoints: Vec::new() }
    }

    /// Apply `event` to `sim` and record it.
    pub fn record(&mut self, sim: &mut Simulation, event: Event) -> SimResult<SettleReport> {
        let report = sim.apply(event.clone())?;
        self.stimuli.push(event);
        self.checkpoints.push(sim.summary());
        Ok(report)
    }

    /// Rebuild a simulation by loading the initial save and re-applying
    /// every stimulus.
    pub fn play_back(&self, config: SimConfig, store: Box<dyn EventStore>) -> SimResult<Simulation> {
        let mut sim = Simulation::load(self.initial.clone(), config, store)?;
        for event in &self.stimuli {
            sim.apply(event.clone())?;
        }
        Ok(sim)
    }

    /// Replay against a scratch store and compare with `live`.
    pub fn verify(&self, live: &Simulation) -> SimResult<()> {
        let mut sim = Simulation::load(
            self.initial.clone(),
            live.config().clone(),
            Box::new(MemoryStore::new()),
        )?;
        for (index, event) in self.stimuli.iter().enumerate() {
            sim.apply(event.clone())?;
            if self.checkpoints.get(index) != Some(&sim.summary()) {
                log::warn!("Replay diverged after stimulus {index} ({})", event.tag());
                return Err(SimError::ReplayDiverged { index });
            }
        }
        if sim.processors() != live.processors() {
            return Err(SimError::ReplayDiverged { index: self.stimuli.len() });
        }
        log::debug!("Replay of {} stimuli matches live run", self.stimuli.len());
        Ok(())
    }
}
