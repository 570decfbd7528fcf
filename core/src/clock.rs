//! Simulation clock: turns irregular wall-clock samples into a steady
//! stream of simulation ticks.
//!
//! State is a stack: a primitive `{speed, tick}` plus overlays.
//!   []                         play
//!   [Pause]                    pause
//!   [.., IndirectPause]        indirectly paused (over play or pause)
//!   [.., EditingSpeed]         speed being edited (over any of the above)
//!
//! RULE: Ticks are emitted only in plain play (no overlays).
//! RULE: Popping an overlay restores exactly the state beneath it.
//! RULE: Commands that do not match the current state are silent no-ops.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::types::{ProcessorId, Tick, TimeStamp};
use serde::{Deserialize, Serialize};

/// Most ticks a single wall-clock sample may release.
pub const MAX_TICKS_PER_SAMPLE: Tick = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overlay {
    Pause,
    IndirectPause,
    EditingSpeed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    /// Ticks per second.
    pub speed:    f64,
    pub tick:     Tick,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
}

impl ClockState {
    pub fn paused(speed: f64, tick: Tick) -> Self {
        Self { speed, tick, overlays: vec![Overlay::Pause] }
    }

    pub fn playing(speed: f64, tick: Tick) -> Self {
        Self { speed, tick, overlays: Vec::new() }
    }

    pub fn is_play(&self) -> bool {
        self.overlays.is_empty()
    }

    fn top(&self) -> Option<Overlay> {
        self.overlays.last().copied()
    }

    /// Name of the outermost mode, for summaries.
    pub fn mode(&self) -> &'static str {
        match self.top() {
            None                        => "play",
            Some(Overlay::Pause)        => "pause",
            Some(Overlay::IndirectPause) => "indirect-pause",
            Some(Overlay::EditingSpeed) => "editing-speed",
        }
    }
}

// ── Processor ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub state: ClockState,
    /// Wall time of the last sample that produced ticks. `None` until the
    /// clock sees a sample (or a stamped play command) while in play.
    #[serde(default)]
    pub last_tick_time_stamp: Option<TimeStamp>,
}

impl Clock {
    pub fn new(state: ClockState) -> Self {
        Self { state, last_tick_time_stamp: None }
    }

    pub fn anchored_at(state: ClockState, time_stamp: TimeStamp) -> Self {
        Self { state, last_tick_time_stamp: Some(time_stamp) }
    }

    /// Anchor wall time when a command moves the clock into play.
    fn anchor(&mut self, time_stamp: Option<TimeStamp>) {
        if self.state.is_play() {
            if let Some(ts) = time_stamp {
                self.last_tick_time_stamp = Some(ts);
            }
        }
    }

    fn on_outside_tick(&mut self, id: &ProcessorId, time_stamp: TimeStamp, emitted: &mut Vec<Event>) {
        if !self.state.is_play() {
            // Wall time spent outside play never turns into ticks.
            self.last_tick_time_stamp = None;
            return;
        }
        let Some(last) = self.last_tick_time_stamp else {
            self.last_tick_time_stamp = Some(time_stamp);
            return;
        };

        let elapsed = time_stamp - last;
        if elapsed < 0.0 {
            // The sampling origin moved (e.g. a save resumed under a new
            // frame loop). Start counting again from this sample.
            log::debug!("tick={} {id}: re-anchoring at {time_stamp} (was {last})", self.state.tick);
            self.last_tick_time_stamp = Some(time_stamp);
            return;
        }
        let advance = (elapsed * self.state.speed / 1000.0).floor();
        if !advance.is_finite() || advance < 1.0 {
            return;
        }

        let from = self.state.tick;
        let mut count = if advance > MAX_TICKS_PER_SAMPLE as f64 {
            log::warn!(
                "tick={from} {id}: sample would release {advance} ticks, capping at {MAX_TICKS_PER_SAMPLE}"
            );
            MAX_TICKS_PER_SAMPLE
        } else {
            advance as Tick
        };
        if from.checked_add(count).is_none() {
            log::warn!("tick={from} {id}: tick counter exhausted");
            count = Tick::MAX - from;
        }

        emitted.extend((1..=count).map(|n| Event::SimulationClockTick { tick: from + n }));
        self.state.tick = from + count;
        self.last_tick_time_stamp = Some(time_stamp);
    }
}

impl Process for Clock {
    fn process(&mut self, ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        let mut emitted = Vec::new();

        for event in inbox {
            match event {
                Event::OutsideClockTick { time_stamp } => {
                    self.on_outside_tick(ctx.id, time_stamp, &mut emitted);
                }

                Event::CommandSimulationClockPlay { after_tick, time_stamp } => {
                    if self.state.overlays == [Overlay::Pause] {
                        self.state.overlays.pop();
                        self.anchor(time_stamp);
                        emitted.push(Event::SimulationClockPlay { before_tick: after_tick + 1 });
                    }
                }

                Event::CommandSimulationClockPause { after_tick, .. } => {
                    if self.state.is_play() {
                        self.state.overlays.push(Overlay::Pause);
                        emitted.push(Event::SimulationClockPause { before_tick: after_tick + 1 });
                    }
                }

                Event::CommandSimulationClockIndirectPause { after_tick, .. } => {
                    if self.state.overlays.is_empty() || self.state.overlays == [Overlay::Pause] {
                        self.state.overlays.push(Overlay::IndirectPause);
                        emitted.push(Event::SimulationClockIndirectPause {
                            before_tick: after_tick + 1,
                        });
                    }
                }

                Event::CommandSimulationClockIndirectResume { after_tick, time_stamp } => {
                    if self.state.top() == Some(Overlay::IndirectPause) {
                        self.state.overlays.pop();
                        self.anchor(time_stamp);
                        emitted.push(Event::SimulationClockIndirectResume {
                            before_tick: after_tick + 1,
                        });
                    }
                }

                Event::CommandSimulationClockStartEditingSpeed { after_tick, .. } => {
                    if self.state.top() != Some(Overlay::EditingSpeed) {
                        self.state.overlays.push(Overlay::EditingSpeed);
                        emitted.push(Event::SimulationClockEditingSpeed {
                            before_tick: after_tick + 1,
                        });
                    }
                }

                Event::CommandSimulationClockSetSpeed { speed, after_tick, .. } => {
                    if !(speed.is_finite() && speed > 0.0) {
                        log::warn!("tick={after_tick} {}: ignoring speed {speed}", ctx.id);
                        continue;
                    }
                    self.state.speed = speed;
                    if self.state.top() == Some(Overlay::EditingSpeed) {
                        self.state.overlays.pop();
                    }
                    emitted.push(Event::SimulationClockNewSpeed {
                        speed,
                        before_tick: after_tick + 1,
                    });
                }

                other => log::warn!("{}: unexpected {}", ctx.id, other.tag()),
            }
        }

        if !emitted.is_empty() {
            log::debug!(
                "tick={} {}: mode={} speed={} emitted={}",
                self.state.tick,
                ctx.id,
                self.state.mode(),
                self.state.speed,
                emitted.len()
            );
        }
        emitted
    }
}
