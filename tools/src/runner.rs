//! Virtual frame loop shared by batch and IPC modes.
//!
//! RULE: Wall time only moves forward in whole 16 ms frames. Requested time
//! short of a frame carries into the next call.
//! RULE: A runner built on a loaded save continues from the clock's saved
//! anchor, so a playing save keeps ticking without a fresh play command.

use anyhow::Result;
use dyson_core::{command::PlayerCommand, types::TimeStamp, Simulation};

pub const FRAME_MILLIS: TimeStamp = 16.0;

pub struct Runner {
    pub sim: Simulation,
    now:     TimeStamp,
    carry:   TimeStamp,
}

impl Runner {
    pub fn new(sim: Simulation) -> Self {
        let now = sim.clock_anchor().unwrap_or(0.0);
        Self { sim, now, carry: 0.0 }
    }

    pub fn now(&self) -> TimeStamp {
        self.now
    }

    /// Feed as many frames as fit in `millis` plus the carried remainder.
    pub fn advance(&mut self, millis: f64) -> Result<()> {
        self.carry += millis.max(0.0);
        while self.carry >= FRAME_MILLIS {
            self.carry -= FRAME_MILLIS;
            self.frame()?;
        }
        Ok(())
    }

    fn frame(&mut self) -> Result<()> {
        self.now += FRAME_MILLIS;
        self.sim.outside_tick(self.now)?;
        Ok(())
    }

    pub fn issue(&mut self, command: PlayerCommand) -> Result<()> {
        self.sim.issue(command, Some(self.now))?;
        Ok(())
    }

    /// Play at `speed` and feed frames until `ticks` more ticks have run.
    /// Fails once a full step's worth of wall time passes with no tick.
    pub fn run_batch(&mut self, ticks: u64, speed: f64) -> Result<()> {
        if (speed - 1.0).abs() > f64::EPSILON {
            self.issue(PlayerCommand::SetSpeed { speed })?;
        }
        self.issue(PlayerCommand::Play)?;

        let effective = self.sim.clock().map_or(speed, |c| c.speed);
        let stall_limit = 1000.0 / effective + 2.0 * FRAME_MILLIS;
        let target = self.sim.current_tick() + ticks;
        let mut idle = 0.0;

        while self.sim.current_tick() < target {
            let before = self.sim.current_tick();
            self.frame()?;
            if self.sim.current_tick() > before {
                idle = 0.0;
                continue;
            }
            idle += FRAME_MILLIS;
            if idle > stall_limit {
                anyhow::bail!("clock is not advancing (mode {})", self.sim.summary().mode);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyson_core::{config::SimConfig, snapshot::SaveState, store::MemoryStore};

    fn fresh() -> Simulation {
        Simulation::fresh_game(SimConfig::default(), Box::new(MemoryStore::new()))
            .expect("fresh game")
    }

    #[test]
    fn default_speed_batch_reaches_the_target() {
        let mut runner = Runner::new(fresh());
        runner.run_batch(20, 1.0).expect("batch");
        assert_eq!(runner.sim.current_tick(), 20);
    }

    #[test]
    fn fast_batch_may_overshoot_but_never_falls_short() {
        let mut runner = Runner::new(fresh());
        runner.run_batch(20, 100.0).expect("batch");
        assert!(runner.sim.current_tick() >= 20);
    }

    #[test]
    fn partial_frames_carry_over() {
        let mut runner = Runner::new(fresh());
        runner.advance(10.0).expect("advance");
        assert_eq!(runner.now(), 0.0);
        runner.advance(10.0).expect("advance");
        assert_eq!(runner.now(), FRAME_MILLIS);
    }

    #[test]
    fn playing_save_keeps_ticking_after_load() {
        let mut runner = Runner::new(fresh());
        runner.run_batch(10, 2.0).expect("batch");
        let saved_tick = runner.sim.current_tick();
        let json = runner.sim.save().to_json().expect("to json");

        let loaded = Simulation::load(
            SaveState::from_json(&json).expect("from json"),
            SimConfig::default(),
            Box::new(MemoryStore::new()),
        )
        .expect("load");
        let mut resumed = Runner::new(loaded);
        assert_eq!(resumed.now(), runner.sim.clock_anchor().expect("anchored"));

        resumed.advance(5_000.0).expect("advance");
        assert!(resumed.sim.current_tick() >= saved_tick + 8);

        resumed.run_batch(5, 2.0).expect("batch after load");
    }

    #[test]
    fn stalled_clock_is_reported() {
        let mut runner = Runner::new(fresh());
        runner.issue(PlayerCommand::IndirectPause).expect("indirect pause");
        let err = runner.run_batch(5, 1.0).expect_err("no ticks under indirect pause");
        assert!(err.to_string().contains("indirect-pause"));
    }
}
